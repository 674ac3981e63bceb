use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Category, Product};

#[derive(Debug, Serialize, ToSchema)]
pub struct HomePage {
    pub featured_products: Vec<Product>,
    pub categories: Vec<Category>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryList {
    pub items: Vec<Category>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetail {
    pub product: Product,
    pub category: Category,
    pub related_products: Vec<Product>,
}
