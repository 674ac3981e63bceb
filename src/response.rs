use axum::{
    Json,
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::middleware::session::SESSION_HEADER;

#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
        }
    }

    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }
}

/// JSON envelope that also hands the anonymous session token back to the client.
pub struct SessionResponse<T> {
    pub session_token: Option<String>,
    pub body: ApiResponse<T>,
}

impl<T> SessionResponse<T> {
    pub fn new(session_token: Option<String>, body: ApiResponse<T>) -> Self {
        Self {
            session_token,
            body,
        }
    }
}

impl<T: Serialize> IntoResponse for SessionResponse<T> {
    fn into_response(self) -> Response {
        let mut response = Json(self.body).into_response();
        if let Some(value) = self
            .session_token
            .and_then(|token| HeaderValue::from_str(&token).ok())
        {
            response
                .headers_mut()
                .insert(HeaderName::from_static(SESSION_HEADER), value);
        }
        response
    }
}
