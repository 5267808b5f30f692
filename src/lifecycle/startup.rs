//! Startup orchestration.
//!
//! Order: validated config in hand → metrics exporter → bind listener →
//! signal listener → serve. Any failure before serving is fatal.

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::CatalogConfig;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;

/// Error type for startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Start every subsystem and serve until a termination signal arrives.
pub async fn start(config: CatalogConfig) -> Result<(), StartupError> {
    if config.auth.uses_default_credentials() {
        tracing::warn!("Using default API credentials; set API_USER and API_PASS");
    }

    if let Some(addr) = &config.observability.metrics_address {
        match addr.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(metrics_address = %addr, error = %e, "Failed to parse metrics address"),
        }
    }

    let listener = bind_listener(&config).await?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(&shutdown);

    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;
    Ok(())
}

/// Bind the configured host, which may be a name or an IP literal.
pub async fn bind_listener(config: &CatalogConfig) -> Result<TcpListener, StartupError> {
    TcpListener::bind((config.listener.host.as_str(), config.listener.port))
        .await
        .map_err(|source| StartupError::Bind {
            address: config.bind_address(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_listener_accepts_host_names() {
        let mut config = CatalogConfig::default();
        config.listener.host = "localhost".into();
        config.listener.port = 0;

        let listener = bind_listener(&config).await.unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());
    }
}
