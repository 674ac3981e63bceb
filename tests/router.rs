mod common;

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use axum_storefront::{
    middleware::auth::ROLE_CUSTOMER, models::User, routes::create_app,
    services::auth_service::issue_token, state::AppState,
};
use sea_orm::DatabaseConnection;
use sqlx::postgres::PgPoolOptions;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

// None of these requests reach the database, so a lazy pool and a
// disconnected ORM handle are enough.
fn offline_app() -> anyhow::Result<Router> {
    let database_url = "postgres://localhost/storefront_offline".to_string();
    let pool = PgPoolOptions::new().connect_lazy(&database_url)?;
    let state = AppState {
        pool,
        orm: DatabaseConnection::Disconnected,
        config: Arc::new(common::test_config(database_url)),
    };
    Ok(create_app(state))
}

#[tokio::test]
async fn unknown_path_is_json_not_found() -> anyhow::Result<()> {
    let response = offline_app()?
        .oneshot(Request::get("/nowhere").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn checkout_requires_login() -> anyhow::Result<()> {
    let response = offline_app()?
        .oneshot(Request::get("/api/checkout").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = offline_app()?
        .oneshot(
            Request::post("/api/checkout")
                .header(header::AUTHORIZATION, "Bearer not-a-token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn order_history_requires_login() -> anyhow::Result<()> {
    let response = offline_app()?
        .oneshot(Request::get("/api/orders").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn get_on_add_to_cart_redirects_to_product() -> anyhow::Result<()> {
    let response = offline_app()?
        .oneshot(Request::get("/api/cart/add/ferris-mug").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/api/products/ferris-mug"
    );
    Ok(())
}

#[tokio::test]
async fn malformed_session_token_is_rejected() -> anyhow::Result<()> {
    let response = offline_app()?
        .oneshot(
            Request::get("/api/cart")
                .header("x-session-token", "not valid!")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn request_id_is_echoed() -> anyhow::Result<()> {
    let response = offline_app()?
        .oneshot(
            Request::get("/health")
                .header("x-request-id", "req-42")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-request-id").unwrap(), "req-42");
    Ok(())
}

async fn envelope(response: axum::response::Response) -> anyhow::Result<Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn unknown_cart_action_is_bad_request() -> anyhow::Result<()> {
    let response = offline_app()?
        .oneshot(
            Request::post(format!("/api/cart/items/{}", Uuid::new_v4()))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"action":"explode"}"#))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = envelope(response).await?;
    assert!(body["message"].as_str().unwrap().contains("explode"));
    assert!(body["data"]["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn incomplete_checkout_details_are_bad_request() -> anyhow::Result<()> {
    let user = User {
        id: Uuid::new_v4(),
        username: "ada".into(),
        email: "ada@example.com".into(),
        phone: None,
        password_hash: String::new(),
        role: ROLE_CUSTOMER.into(),
        created_at: chrono::Utc::now(),
    };
    let token = issue_token(&user, "test-secret", 1)?;

    let response = offline_app()?
        .oneshot(
            Request::post("/api/checkout")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"full_name":"A"}"#))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = envelope(response).await?;
    assert!(body["message"].as_str().unwrap().contains("email"));
    Ok(())
}

#[tokio::test]
async fn malformed_login_body_is_bad_request() -> anyhow::Result<()> {
    let response = offline_app()?
        .oneshot(
            Request::post("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
