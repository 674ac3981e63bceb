use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::{
    dto::catalog::{CategoryList, HomePage, ProductDetail, ProductList},
    entity::{
        categories::{Column as CategoryCol, Entity as Categories, Model as CategoryModel},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    models::{Category, Product},
    response::{ApiResponse, Meta},
    routes::params::ProductQuery,
    state::AppState,
};

const FEATURED_LIMIT: u64 = 8;
const HOME_CATEGORY_LIMIT: u64 = 6;
const RELATED_LIMIT: u64 = 4;

pub async fn home(state: &AppState) -> AppResult<ApiResponse<HomePage>> {
    let featured_products = Products::find()
        .filter(ProdCol::Available.eq(true))
        .order_by_desc(ProdCol::CreatedAt)
        .limit(FEATURED_LIMIT)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let categories = Categories::find()
        .order_by_asc(CategoryCol::Name)
        .limit(HOME_CATEGORY_LIMIT)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(category_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Home",
        HomePage {
            featured_products,
            categories,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items: Vec<Category> = Categories::find()
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(category_from_entity)
        .collect();
    let total = items.len() as i64;

    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(ProdCol::Available.eq(true));

    if let Some(slug) = query.category.as_ref().filter(|s| !s.is_empty()) {
        let category = find_category(state, slug).await?;
        condition = condition.add(ProdCol::CategoryId.eq(category.id));
    }

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(ProdCol::Name).ilike(pattern.clone()))
                .add(Expr::col(ProdCol::Description).ilike(pattern)),
        );
    }

    let finder = Products::find()
        .filter(condition)
        .order_by_desc(ProdCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product_detail(
    state: &AppState,
    slug: &str,
) -> AppResult<ApiResponse<ProductDetail>> {
    let product = Products::find()
        .filter(ProdCol::Slug.eq(slug))
        .filter(ProdCol::Available.eq(true))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let category = Categories::find_by_id(product.category_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let related_products = Products::find()
        .filter(ProdCol::CategoryId.eq(product.category_id))
        .filter(ProdCol::Available.eq(true))
        .filter(ProdCol::Id.ne(product.id))
        .order_by_desc(ProdCol::CreatedAt)
        .limit(RELATED_LIMIT)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Product",
        ProductDetail {
            product: product_from_entity(product),
            category: category_from_entity(category),
            related_products,
        },
        None,
    ))
}

/// Looks a product up by slug regardless of availability.
pub async fn find_product(state: &AppState, slug: &str) -> AppResult<ProductModel> {
    Products::find()
        .filter(ProdCol::Slug.eq(slug))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

async fn find_category(state: &AppState, slug: &str) -> AppResult<CategoryModel> {
    Categories::find()
        .filter(CategoryCol::Slug.eq(slug))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

/// Builds an `ILIKE` pattern matching `needle` anywhere, with wildcards in
/// the needle itself escaped.
fn contains_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    format!("%{escaped}%")
}

/// URL-friendly identifier derived from a display name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

pub fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        category_id: model.category_id,
        name: model.name,
        slug: model.slug,
        description: model.description,
        price: model.price,
        stock: model.stock,
        available: model.available,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn category_from_entity(model: CategoryModel) -> Category {
    Category {
        id: model.id,
        name: model.name,
        slug: model.slug,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
