use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, EntityTrait};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{OrderWithItems, UpdateOrderStatusRequest},
    entity::orders::{ActiveModel as OrderActive, Entity as Orders},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    services::order_service::{find_order_items, order_from_entity},
    state::AppState,
};

pub const ORDER_STATUSES: [&str; 5] = ["placed", "processing", "shipped", "delivered", "cancelled"];

pub fn validate_order_status(status: &str) -> AppResult<()> {
    if ORDER_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "status must be one of: {}",
            ORDER_STATUSES.join(", ")
        )))
    }
}

/// Operator-driven status transition. Totals and lines are never touched.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;
    let status = payload.status.trim().to_lowercase();
    validate_order_status(&status)?;

    let existing = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let previous = existing.status.clone();

    let mut active: OrderActive = existing.into();
    active.status = Set(status.clone());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    tracing::info!(order_id = %order.id, from = %previous, to = %status, "order status changed");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_status",
        "orders",
        serde_json::json!({ "order_id": order.id, "from": previous, "to": status }),
    )
    .await;

    let items = find_order_items(state, order.id).await?;
    Ok(ApiResponse::success(
        "Order status updated",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}
