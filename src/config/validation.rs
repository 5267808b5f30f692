//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limit > 0, timeouts > 0, addresses parse)
//! - Check that configured origins can be sent as header values
//! - Resolve the listener host, which may be a name or an IP literal
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: CatalogConfig → Result<(), Vec<ValidationError>>

use std::net::{SocketAddr, ToSocketAddrs};

use axum::http::HeaderValue;

use crate::config::schema::CatalogConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener address `{0}` does not resolve to a socket address")]
    BindAddress(String),

    #[error("rate_limit.requests_per_second must be greater than zero")]
    ZeroRateLimit,

    #[error("auth.username must not be empty")]
    EmptyUsername,

    #[error("cors origin `{0}` is not a valid header value")]
    InvalidOrigin(String),

    #[error("cors origin `*` cannot be combined with an explicit origin list or credentials")]
    WildcardOrigin,

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("observability.metrics_address `{0}` is not a valid socket address")]
    MetricsAddress(String),

    #[error("storage.books_file must not be empty")]
    EmptyBooksFile,
}

/// Check every semantic rule and collect the failures.
pub fn validate_config(config: &CatalogConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let resolves = (config.listener.host.as_str(), config.listener.port)
        .to_socket_addrs()
        .is_ok_and(|mut addrs| addrs.next().is_some());
    if !resolves {
        errors.push(ValidationError::BindAddress(config.bind_address()));
    }

    if config.rate_limit.requests_per_second == 0 {
        errors.push(ValidationError::ZeroRateLimit);
    }

    if config.auth.username.is_empty() {
        errors.push(ValidationError::EmptyUsername);
    }

    for origin in &config.cors.allowed_origins {
        if origin == "*" {
            errors.push(ValidationError::WildcardOrigin);
        } else if HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::InvalidOrigin(origin.clone()));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::MetricsAddress(addr.clone()));
        }
    }

    if config.storage.books_file.trim().is_empty() {
        errors.push(ValidationError::EmptyBooksFile);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&CatalogConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = CatalogConfig::default();
        config.listener.host = "not a host".into();
        config.rate_limit.requests_per_second = 0;
        config.auth.username.clear();
        config.cors.allowed_origins.push("http://bad\norigin".into());
        config.observability.metrics_address = Some("nowhere".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::ZeroRateLimit));
        assert!(errors.contains(&ValidationError::EmptyUsername));
        assert!(errors.contains(&ValidationError::InvalidOrigin("http://bad\norigin".into())));
    }

    #[test]
    fn test_listener_host_may_be_a_name_or_ipv6() {
        for host in ["localhost", "::1", "0.0.0.0", "127.0.0.1"] {
            let mut config = CatalogConfig::default();
            config.listener.host = host.into();
            assert!(validate_config(&config).is_ok(), "host {host} rejected");
        }
    }

    #[test]
    fn test_wildcard_origin_is_rejected() {
        let mut config = CatalogConfig::default();
        config.cors.allowed_origins = vec!["*".into()];
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::WildcardOrigin]
        );
    }
}
