use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

use crate::{
    dto::orders::{CheckoutPage, CheckoutRequest, OrderWithItems},
    error::AppResult,
    middleware::{auth::AuthUser, json::JsonBody},
    response::ApiResponse,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(checkout_page).post(checkout))
}

#[utoipa::path(
    get,
    path = "/api/checkout",
    responses(
        (status = 200, description = "Cart summary with prefilled contact details", body = ApiResponse<CheckoutPage>),
        (status = 401, description = "Login required"),
        (status = 422, description = "Cart is empty"),
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn checkout_page(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CheckoutPage>>> {
    Ok(Json(order_service::checkout_page(&state, &user).await?))
}

#[utoipa::path(
    post,
    path = "/api/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order placed, cart emptied", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Invalid checkout details"),
        (status = 401, description = "Login required"),
        (status = 422, description = "Cart is empty"),
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(payload): JsonBody<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderWithItems>>)> {
    let resp = order_service::checkout(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
