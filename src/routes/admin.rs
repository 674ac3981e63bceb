use axum::{
    Json, Router,
    extract::{Path, State},
    routing::patch,
};
use uuid::Uuid;

use crate::{
    dto::orders::{OrderWithItems, UpdateOrderStatusRequest},
    error::AppResult,
    middleware::{auth::AuthUser, json::JsonBody},
    response::ApiResponse,
    services::admin_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/orders/{id}/status", patch(update_order_status))
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order status updated (admin only)", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = admin_service::update_order_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
