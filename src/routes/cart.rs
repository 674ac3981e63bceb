use axum::{
    Router,
    body::Bytes,
    extract::{Path, State},
    response::Redirect,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartView, UpdateCartRequest},
    error::{AppError, AppResult},
    middleware::{json::JsonBody, session::Visitor},
    models::CartItem,
    response::{ApiResponse, SessionResponse},
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(view_cart))
        .route("/add/{slug}", post(add_to_cart).get(add_to_cart_redirect))
        .route("/items/{item_id}", post(update_cart))
        .route("/items/{item_id}/remove", post(remove_from_cart))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    params(
        ("x-session-token" = Option<String>, Header, description = "Anonymous session token")
    ),
    responses(
        (status = 200, description = "Active cart of the current visitor", body = ApiResponse<CartView>)
    ),
    tag = "Cart"
)]
pub async fn view_cart(
    State(state): State<AppState>,
    visitor: Visitor,
) -> AppResult<SessionResponse<CartView>> {
    let resp = cart_service::view_cart(&state, &visitor).await?;
    Ok(SessionResponse::new(visitor.session_token(), resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/add/{slug}",
    params(
        ("slug" = String, Path, description = "Product slug"),
        ("x-session-token" = Option<String>, Header, description = "Anonymous session token")
    ),
    request_body(content = AddToCartRequest, description = "Quantity, default 1"),
    responses(
        (status = 200, description = "Item added or quantity increased", body = ApiResponse<CartItem>),
        (status = 400, description = "Invalid quantity or quantity cap reached"),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Product not available"),
    ),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    visitor: Visitor,
    Path(slug): Path<String>,
    body: Bytes,
) -> AppResult<SessionResponse<CartItem>> {
    // the body is optional; an empty one means "add one"
    let payload = if body.iter().all(u8::is_ascii_whitespace) {
        AddToCartRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("invalid body: {e}")))?
    };
    let resp = cart_service::add_to_cart(&state, &visitor, &slug, payload).await?;
    Ok(SessionResponse::new(visitor.session_token(), resp))
}

/// Adding only happens on POST; a plain GET is sent back to the product page.
pub async fn add_to_cart_redirect(Path(slug): Path<String>) -> Redirect {
    Redirect::to(&format!("/api/products/{slug}"))
}

#[utoipa::path(
    post,
    path = "/api/cart/items/{item_id}",
    params(
        ("item_id" = Uuid, Path, description = "Cart item ID"),
        ("x-session-token" = Option<String>, Header, description = "Anonymous session token")
    ),
    request_body = UpdateCartRequest,
    responses(
        (status = 200, description = "Updated cart", body = ApiResponse<CartView>),
        (status = 400, description = "Unknown action or quantity cap reached"),
        (status = 403, description = "Item belongs to another cart"),
        (status = 404, description = "Cart item not found"),
    ),
    tag = "Cart"
)]
pub async fn update_cart(
    State(state): State<AppState>,
    visitor: Visitor,
    Path(item_id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateCartRequest>,
) -> AppResult<SessionResponse<CartView>> {
    let resp = cart_service::update_item(&state, &visitor, item_id, payload.action).await?;
    Ok(SessionResponse::new(visitor.session_token(), resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/items/{item_id}/remove",
    params(
        ("item_id" = Uuid, Path, description = "Cart item ID"),
        ("x-session-token" = Option<String>, Header, description = "Anonymous session token")
    ),
    responses(
        (status = 200, description = "Updated cart", body = ApiResponse<CartView>),
        (status = 403, description = "Item belongs to another cart"),
        (status = 404, description = "Cart item not found"),
    ),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    visitor: Visitor,
    Path(item_id): Path<Uuid>,
) -> AppResult<SessionResponse<CartView>> {
    let resp = cart_service::remove_item(&state, &visitor, item_id).await?;
    Ok(SessionResponse::new(visitor.session_token(), resp))
}
