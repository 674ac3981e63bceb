use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::orders::{OrderList, OrderWithItems},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::Pagination,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(order_history))
        .route("/{id}/success", get(order_success))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(Pagination),
    responses(
        (status = 200, description = "Orders of the current user, newest first", body = ApiResponse<OrderList>),
        (status = 401, description = "Login required"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn order_history(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    Ok(Json(order_service::list_orders(&state, &user, pagination).await?))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}/success",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Placed order with its lines", body = ApiResponse<OrderWithItems>),
        (status = 401, description = "Login required"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn order_success(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    Ok(Json(order_service::get_order(&state, &user, id).await?))
}
