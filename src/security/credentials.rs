//! HTTP Basic credential checking for the mutating routes.
//!
//! Username and password are compared in constant time and both comparisons
//! always run. Every failure maps to the same 401 so callers cannot tell an
//! unknown user from a wrong password.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderValue},
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use subtle::ConstantTimeEq;

use crate::config::AuthConfig;
use crate::http::response::ApiError;

/// The configured username/password pair.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.username.clone(), config.password.clone())
    }

    /// Constant-time comparison of both fields.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let user_ok = username.as_bytes().ct_eq(self.username.as_bytes());
        let pass_ok = password.as_bytes().ct_eq(self.password.as_bytes());
        (user_ok & pass_ok).into()
    }

    /// Check an `Authorization` header value, returning the username.
    pub fn authenticate(&self, header: Option<&HeaderValue>) -> Result<String, ApiError> {
        let (username, password) = header.and_then(decode_basic).ok_or(ApiError::Unauthorized)?;
        if self.verify(&username, &password) {
            Ok(username)
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Parse `Basic <base64(user:pass)>`. The scheme is case-insensitive and the
/// password may itself contain colons.
pub fn decode_basic(value: &HeaderValue) -> Option<(String, String)> {
    let value = value.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

/// Extractor that admits only requests with valid Basic credentials.
#[derive(Debug, Clone)]
pub struct BasicAuth(pub String);

impl<S> FromRequestParts<S> for BasicAuth
where
    Arc<Credentials>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let credentials = Arc::<Credentials>::from_ref(state);
        match credentials.authenticate(parts.headers.get(header::AUTHORIZATION)) {
            Ok(user) => Ok(BasicAuth(user)),
            Err(e) => {
                tracing::warn!(path = %parts.uri.path(), method = %parts.method, "Rejected credentials");
                Err(e)
            }
        }
    }
}
