//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{CatalogConfig, LogFormat};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: `{value}`")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the effective configuration from the process environment: defaults,
/// then the optional TOML file, then environment variables.
pub fn load_with_env(path: Option<&Path>) -> Result<CatalogConfig, ConfigError> {
    load_from(path, |name| std::env::var(name).ok())
}

/// Same as [`load_with_env`] with an explicit variable lookup. The result is
/// validated once at the end.
pub fn load_from<F>(path: Option<&Path>, lookup: F) -> Result<CatalogConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => toml::from_str(&fs::read_to_string(path)?)?,
        None => CatalogConfig::default(),
    };

    apply_env(&mut config, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` abstracts the environment so tests never touch process state.
pub fn apply_env<F>(config: &mut CatalogConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("HOST") {
        config.listener.host = host;
    }
    if let Some(port) = lookup("PORT") {
        config.listener.port = parse_var("PORT", port)?;
    }
    if let Some(origins) = lookup("ALLOWED_ORIGINS") {
        let parsed = split_origins(&origins);
        // An empty or all-blank list keeps the defaults.
        if !parsed.is_empty() {
            config.cors.allowed_origins = parsed;
        }
    }
    if let Some(user) = lookup("API_USER") {
        config.auth.username = user;
    }
    if let Some(pass) = lookup("API_PASS") {
        config.auth.password = pass;
    }
    if let Some(rps) = lookup("RATE_LIMIT_RPS") {
        config.rate_limit.requests_per_second = parse_var("RATE_LIMIT_RPS", rps)?;
    }
    if let Some(file) = lookup("BOOKS_FILE") {
        config.storage.books_file = file;
    }
    if let Some(level) = lookup("LOG_LEVEL") {
        config.observability.log_level = level;
    }
    if let Some(format) = lookup("LOG_FORMAT") {
        config.observability.log_format = match format.to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            _ => {
                return Err(ConfigError::Env {
                    var: "LOG_FORMAT",
                    value: format,
                })
            }
        };
    }
    if let Some(addr) = lookup("METRICS_ADDRESS") {
        config.observability.metrics_address = Some(addr).filter(|a| !a.is_empty());
    }
    if let Some(secs) = lookup("REQUEST_TIMEOUT_SECS") {
        config.timeouts.request_secs = parse_var("REQUEST_TIMEOUT_SECS", secs)?;
    }
    Ok(())
}

/// Split a comma-separated origin list, trimming blanks.
pub fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { var, value })
}
