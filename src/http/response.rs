//! Error responses.
//!
//! Every failure a handler or the admission layer can produce maps to one
//! [`ApiError`] variant, rendered as JSON with a `detail` field.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::catalog::{FieldError, StoreError};

pub const RATE_LIMITED_DETAIL: &str = "Demasiadas solicitudes";
pub const UNAUTHORIZED_DETAIL: &str = "Credenciales de autenticación inválidas";
const STORAGE_DETAIL: &str = "Error interno al guardar los libros";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed input, reported per field.
    #[error("validation failed at {location:?}: {message}")]
    Validation {
        location: Vec<String>,
        message: String,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("invalid credentials")]
    Unauthorized,

    #[error("too many requests")]
    RateLimited,

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl ApiError {
    /// Validation error for a query-string or path parameter.
    pub fn invalid_param(kind: &str, name: &str, message: impl Into<String>) -> Self {
        ApiError::Validation {
            location: vec![kind.to_string(), name.to_string()],
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FieldError> for ApiError {
    fn from(err: FieldError) -> Self {
        let mut location = vec!["body".to_string()];
        if !err.field.is_empty() {
            location.push(err.field);
        }
        ApiError::Validation {
            location,
            message: err.message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation { location, message } => json!({
                "detail": [{ "loc": location, "msg": message, "type": "value_error" }]
            }),
            ApiError::NotFound(message) => json!({ "detail": message }),
            ApiError::Unauthorized => json!({ "detail": UNAUTHORIZED_DETAIL }),
            ApiError::RateLimited => json!({ "detail": RATE_LIMITED_DETAIL }),
            ApiError::Storage(e) => {
                tracing::error!(error = %e, "Failed to persist books");
                json!({ "detail": STORAGE_DETAIL })
            }
        };

        let mut response = (status, Json(body)).into_response();
        if matches!(self, ApiError::Unauthorized) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Basic"));
        }
        response
    }
}
