use axum_storefront::{
    config::AppConfig,
    db::create_pool,
    middleware::auth::{ROLE_ADMIN, ROLE_CUSTOMER},
    services::{auth_service::hash_password, catalog_service::slugify},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "admin", "admin@example.com", "admin-pass-123", ROLE_ADMIN).await?;
    let user_id = ensure_user(&pool, "customer", "customer@example.com", "customer-pass-123", ROLE_CUSTOMER).await?;
    seed_catalog(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, Customer ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash =
        hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (username) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {username} (role={role})");
    Ok(user_id)
}

async fn ensure_category(pool: &sqlx::PgPool, name: &str) -> anyhow::Result<Uuid> {
    let (category_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO categories (id, name, slug)
        VALUES ($1, $2, $3)
        ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(slugify(name))
    .fetch_one(pool)
    .await?;
    Ok(category_id)
}

async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let apparel = ensure_category(pool, "Apparel").await?;
    let kitchen = ensure_category(pool, "Kitchen").await?;
    let books = ensure_category(pool, "Books").await?;

    let products: Vec<(Uuid, &str, &str, i64, i32, bool)> = vec![
        (apparel, "Ferris Hoodie", "Warm hoodie for Rustaceans", 5500, 50, true),
        (apparel, "Crab T-Shirt", "Cotton tee with a friendly crab", 2000, 120, true),
        (kitchen, "Ferris Mug", "Coffee tastes better with Ferris", 1200, 100, true),
        (kitchen, "Borrow Checker Apron", "Limited run, back soon", 2500, 0, false),
        (books, "E-book: Async Rust", "Learn async Rust patterns", 2500, 75, true),
        (books, "Sticker Pack", "Decorate your laptop", 500, 200, true),
    ];

    for (category_id, name, desc, price, stock, available) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, category_id, name, slug, description, price, stock, available)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(category_id)
        .bind(name)
        .bind(slugify(name))
        .bind(desc)
        .bind(price)
        .bind(stock)
        .bind(available)
        .execute(pool)
        .await?;
    }

    println!("Seeded catalog");
    Ok(())
}
