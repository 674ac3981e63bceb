use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    audit,
    dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest},
    error::{AppError, AppResult},
    middleware::auth::ROLE_CUSTOMER,
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 8;

pub fn validate_password(password: &str, confirm: &str) -> AppResult<()> {
    if password != confirm {
        return Err(AppError::BadRequest("Passwords do not match".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must contain at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::BadRequest(
            "Password cannot be entirely numeric".into(),
        ));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let RegisterRequest {
        username,
        email,
        phone,
        password,
        password_confirm,
    } = payload;
    let username = username.trim().to_string();
    let email = email.trim().to_string();
    if username.is_empty() {
        return Err(AppError::BadRequest("Username is required".into()));
    }
    if !email.contains('@') {
        return Err(AppError::BadRequest("A valid email is required".into()));
    }
    validate_password(&password, &password_confirm)?;

    let exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE username = $1")
        .bind(username.as_str())
        .fetch_optional(&state.pool)
        .await?;

    if exist.is_some() {
        return Err(AppError::BadRequest("Username is already taken".to_string()));
    }

    let password_hash = hash_password(&password)?;
    let phone = phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());

    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, phone, password_hash, role)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username.as_str())
    .bind(email.as_str())
    .bind(phone)
    .bind(password_hash)
    .bind(ROLE_CUSTOMER)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!(user_id = %user.id, "user registered");
    audit::record(
        &state.pool,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;
    Ok(ApiResponse::success("User created", user, None))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { username, password } = payload;
    let user: Option<User> = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username.trim())
        .fetch_optional(&state.pool)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::BadRequest("Invalid username or password".into())),
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::BadRequest("Invalid username or password".into()));
    }

    let token = issue_token(&user, &state.config.jwt_secret, state.config.jwt_ttl_hours)?;
    let resp = LoginResponse {
        token: format!("Bearer {}", token),
    };

    audit::record(
        &state.pool,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

pub fn issue_token(user: &User, secret: &str, ttl_hours: i64) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.clone(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::auth::bearer_user;
    use axum::http::{HeaderMap, HeaderValue, header};

    #[test]
    fn password_rules() {
        assert!(validate_password("correct horse", "correct horse").is_ok());
        assert!(validate_password("correct horse", "correct h0rse").is_err());
        assert!(validate_password("short", "short").is_err());
        assert!(validate_password("12345678901", "12345678901").is_err());
    }

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("correct horse").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"correct horse", &parsed)
                .is_ok()
        );
        assert!(Argon2::default().verify_password(b"wrong", &parsed).is_err());
    }

    #[test]
    fn issued_token_is_accepted_by_extractor() {
        let user = User {
            id: Uuid::new_v4(),
            username: "ada".into(),
            email: "ada@example.com".into(),
            phone: None,
            password_hash: String::new(),
            role: ROLE_CUSTOMER.into(),
            created_at: Utc::now(),
        };
        let token = issue_token(&user, "secret", 1).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );

        let auth = bearer_user(&headers, "secret").unwrap().unwrap();
        assert_eq!(auth.user_id, user.id);
        assert_eq!(auth.role, ROLE_CUSTOMER);
    }
}
