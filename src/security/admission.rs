//! Request admission pipeline.
//!
//! # Stages (outermost first)
//! ```text
//! request
//!     → CORS layer: OPTIONS preflight answered here with the allow-* headers,
//!       never reaching the limiter or any route
//!     → CORS layer: allow-* headers attached to every other response,
//!       including 429 rejections
//!     → timeout: 408 when the rest of the stack runs too long
//!     → rate_limit_middleware: per-address fixed-window check, 429 on reject
//!     → router: handlers, which verify credentials before writing
//! ```
//!
//! Preflight handling must stay outside the limiter and the limiter must stay
//! outside the router; [`apply`] is the only place that orders them. Every
//! response produced below the CORS layer, 408 and 429 included, carries the
//! allow-* headers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{HeaderValue, Method, StatusCode},
    middleware, Router,
};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;

use crate::config::CorsConfig;
use crate::security::rate_limit::{rate_limit_middleware, RateLimiter};

/// Methods browsers may use cross-origin.
pub const ALLOWED_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];

/// CORS layer for the configured origin list.
///
/// Request headers are mirrored rather than wildcarded so credentials can be
/// allowed at the same time.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(_) if origin == "*" => {
                tracing::warn!("Ignoring wildcard CORS origin in explicit origin list");
                None
            }
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(ALLOWED_METHODS.to_vec())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(config.allow_credentials)
}

/// Wrap `router` in the admission stages.
pub fn apply(
    router: Router,
    cors: &CorsConfig,
    limiter: Arc<RateLimiter>,
    request_timeout: Duration,
) -> Router {
    router
        .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(cors_layer(cors))
}
