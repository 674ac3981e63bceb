use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Product;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub quantity: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CartAction {
    Increase,
    Decrease,
    Remove,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartRequest {
    pub action: CartAction,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub product: Product,
    pub quantity: i32,
    pub line_total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub id: Uuid,
    pub items: Vec<CartLine>,
    pub item_count: i64,
    pub total: i64,
}
