use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::auth::{AuthUser, bearer_user},
    state::AppState,
};

pub const SESSION_HEADER: &str = "x-session-token";
const MAX_TOKEN_LEN: usize = 64;

/// Whoever is driving the current request: a logged-in user, or an anonymous
/// browser session recognised by its session token.
#[derive(Debug, Clone)]
pub enum Visitor {
    User(AuthUser),
    Guest { session_token: String },
}

impl Visitor {
    /// Token to hand back to the client; only guests have one.
    pub fn session_token(&self) -> Option<String> {
        match self {
            Visitor::User(_) => None,
            Visitor::Guest { session_token } => Some(session_token.clone()),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Visitor::User(user) => Some(user.user_id),
            Visitor::Guest { .. } => None,
        }
    }
}

pub fn new_session_token() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn validate_session_token(raw: &str) -> Result<String, AppError> {
    let token = raw.trim();
    let well_formed = !token.is_empty()
        && token.len() <= MAX_TOKEN_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if !well_formed {
        return Err(AppError::BadRequest("Invalid session token".into()));
    }
    Ok(token.to_string())
}

impl FromRequestParts<AppState> for Visitor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = bearer_user(&parts.headers, &state.config.jwt_secret)? {
            return Ok(Visitor::User(user));
        }

        let session_token = match parts.headers.get(SESSION_HEADER) {
            Some(value) => {
                let raw = value
                    .to_str()
                    .map_err(|_| AppError::BadRequest("Invalid session token".into()))?;
                validate_session_token(raw)?
            }
            None => {
                let token = new_session_token();
                tracing::debug!(session_token = %token, "issued anonymous session");
                token
            }
        };

        Ok(Visitor::Guest { session_token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_tokens_are_valid_and_distinct() {
        let a = new_session_token();
        let b = new_session_token();
        assert_ne!(a, b);
        assert_eq!(validate_session_token(&a).unwrap(), a);
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(validate_session_token("").is_err());
        assert!(validate_session_token("has space").is_err());
        assert!(validate_session_token("semi;colon").is_err());
        assert!(validate_session_token(&"a".repeat(65)).is_err());
    }

    #[test]
    fn accepts_url_safe_tokens() {
        assert_eq!(
            validate_session_token(" abc-DEF_123 ").unwrap(),
            "abc-DEF_123"
        );
    }

    #[test]
    fn only_guests_expose_a_session_token() {
        let guest = Visitor::Guest {
            session_token: "tok".into(),
        };
        let user = Visitor::User(AuthUser {
            user_id: Uuid::new_v4(),
            role: "customer".into(),
        });
        assert_eq!(guest.session_token().as_deref(), Some("tok"));
        assert!(user.session_token().is_none());
        assert!(guest.user_id().is_none());
    }
}
