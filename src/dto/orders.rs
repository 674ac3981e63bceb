use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::cart::CartView,
    models::{Order, OrderItem},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

/// Contact fields offered to the customer before they confirm the checkout.
#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutPrefill {
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutPage {
    pub cart: CartView,
    pub prefill: CheckoutPrefill,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
