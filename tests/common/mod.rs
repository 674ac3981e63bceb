#![allow(dead_code)]

use std::sync::Arc;

use axum_storefront::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    entity::{
        categories::{ActiveModel as CategoryActive, Model as CategoryModel},
        products::ActiveModel as ProductActive,
        products::Model as ProductModel, users::ActiveModel as UserActive,
    },
    middleware::{
        auth::{AuthUser, ROLE_CUSTOMER},
        session::{Visitor, new_session_token},
    },
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use tokio::sync::OnceCell;
use uuid::Uuid;

static MIGRATED: OnceCell<()> = OnceCell::const_new();

pub fn test_config(database_url: String) -> AppConfig {
    AppConfig {
        database_url,
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        jwt_ttl_hours: 1,
    }
}

/// Connects to the test database, or returns `None` when none is configured.
pub async fn setup_state() -> anyhow::Result<Option<AppState>> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run flow tests.");
            return Ok(None);
        }
    };

    MIGRATED
        .get_or_try_init(|| async {
            let orm = create_orm_conn(&database_url).await?;
            run_migrations(&orm).await?;
            anyhow::Ok(())
        })
        .await?;

    let orm = create_orm_conn(&database_url).await?;
    let pool = create_pool(&database_url).await?;
    Ok(Some(AppState {
        pool,
        orm,
        config: Arc::new(test_config(database_url)),
    }))
}

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

pub async fn create_user(state: &AppState, role: &str) -> anyhow::Result<AuthUser> {
    let username = unique("user");
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(format!("{username}@example.com")),
        username: Set(username),
        phone: Set(Some("0600000000".into())),
        password_hash: Set("dummy".into()),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}

pub async fn customer(state: &AppState) -> anyhow::Result<AuthUser> {
    create_user(state, ROLE_CUSTOMER).await
}

pub fn guest() -> Visitor {
    Visitor::Guest {
        session_token: new_session_token(),
    }
}

pub async fn create_category(state: &AppState) -> anyhow::Result<CategoryModel> {
    let slug = unique("category");
    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(format!("Category {slug}")),
        slug: Set(slug),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(category)
}

pub async fn create_product_in(
    state: &AppState,
    category: &CategoryModel,
    name: &str,
    description: &str,
    available: bool,
) -> anyhow::Result<ProductModel> {
    insert_product(state, category, name, description, 1000, available).await
}

pub async fn create_product(
    state: &AppState,
    price: i64,
    available: bool,
) -> anyhow::Result<ProductModel> {
    let category = create_category(state).await?;
    insert_product(state, &category, "Test Widget", "A product for testing", price, available).await
}

async fn insert_product(
    state: &AppState,
    category: &CategoryModel,
    name: &str,
    description: &str,
    price: i64,
    available: bool,
) -> anyhow::Result<ProductModel> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        category_id: Set(category.id),
        name: Set(name.into()),
        slug: Set(unique("widget")),
        description: Set(Some(description.into())),
        price: Set(price),
        stock: Set(10),
        available: Set(available),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}

pub async fn set_price(state: &AppState, product: &ProductModel, price: i64) -> anyhow::Result<()> {
    let mut active: ProductActive = product.clone().into();
    active.price = Set(price);
    active.update(&state.orm).await?;
    Ok(())
}
