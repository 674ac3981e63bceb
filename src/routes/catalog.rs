use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use crate::{
    dto::catalog::{CategoryList, HomePage, ProductDetail, ProductList},
    error::AppResult,
    response::ApiResponse,
    routes::params::ProductQuery,
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/home", get(home))
        .route("/categories", get(list_categories))
        .route("/products", get(list_products))
        .route("/products/{slug}", get(get_product))
}

#[utoipa::path(
    get,
    path = "/api/home",
    responses(
        (status = 200, description = "Featured products and categories", body = ApiResponse<HomePage>)
    ),
    tag = "Catalog"
)]
pub async fn home(State(state): State<AppState>) -> AppResult<Json<ApiResponse<HomePage>>> {
    Ok(Json(catalog_service::home(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "All categories", body = ApiResponse<CategoryList>)
    ),
    tag = "Catalog"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    Ok(Json(catalog_service::list_categories(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductQuery),
    responses(
        (status = 200, description = "List available products", body = ApiResponse<ProductList>),
        (status = 404, description = "Unknown category"),
    ),
    tag = "Catalog"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    Ok(Json(catalog_service::list_products(&state, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/products/{slug}",
    params(
        ("slug" = String, Path, description = "Product slug")
    ),
    responses(
        (status = 200, description = "Product with related products", body = ApiResponse<ProductDetail>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Catalog"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    Ok(Json(catalog_service::get_product_detail(&state, &slug).await?))
}
