//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all catalog handlers
//! - Wire up admission (CORS, rate limit) and ambient middleware
//!   (tracing, request ID, timeout, body limit, metrics)
//! - Serve with peer addresses attached so the limiter can key on them
//! - Stop on the shutdown broadcast

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, FromRef},
    middleware,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::catalog::BookStore;
use crate::config::CatalogConfig;
use crate::http::handlers;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, trace_layer};
use crate::observability::metrics;
use crate::security::{admission, Credentials, RateLimiter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<BookStore>,
    pub credentials: Arc<Credentials>,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    /// State built from configuration, with a wall-clock limiter.
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::with_limiter(
            config,
            Arc::new(RateLimiter::new(config.rate_limit.requests_per_second)),
        )
    }

    /// State with a caller-supplied limiter (e.g. one driven by a test clock).
    pub fn with_limiter(config: &CatalogConfig, limiter: Arc<RateLimiter>) -> Self {
        Self {
            store: Arc::new(BookStore::new(&config.storage.books_file)),
            credentials: Arc::new(Credentials::from_config(&config.auth)),
            limiter,
        }
    }
}

impl FromRef<AppState> for Arc<Credentials> {
    fn from_ref(state: &AppState) -> Self {
        state.credentials.clone()
    }
}

/// HTTP server for the catalog.
pub struct HttpServer {
    router: Router,
    config: CatalogConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: CatalogConfig) -> Self {
        let state = AppState::from_config(&config);
        Self::with_state(config, state)
    }

    pub fn with_state(config: CatalogConfig, state: AppState) -> Self {
        let router = build_router(&config, state);
        Self { router, config }
    }

    /// The fully layered router, e.g. for driving with `oneshot` in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until a
    /// shutdown message arrives.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            rate_limit = self.config.rate_limit.requests_per_second,
            books_file = %self.config.storage.books_file,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }
}

/// Build the Axum router with all middleware layers.
///
/// Layer order, outermost first: request id, trace, request id echo,
/// metrics, CORS, timeout, rate limit, body limit, routes.
pub fn build_router(config: &CatalogConfig, state: AppState) -> Router {
    let limiter = state.limiter.clone();

    let routes = Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/books", get(handlers::list_books).post(handlers::add_book))
        .route("/books/stats", get(handlers::book_stats))
        .route("/books/authors", get(handlers::list_authors))
        .route("/books/languages", get(handlers::list_languages))
        .route("/books/countries", get(handlers::list_countries))
        .route(
            "/books/{index}",
            get(handlers::get_book).delete(handlers::delete_book),
        )
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(config.security.max_body_size))
        .with_state(state);

    let request_timeout = Duration::from_secs(config.timeouts.request_secs);

    admission::apply(routes, &config.cors, limiter, request_timeout)
        .layer(middleware::from_fn(metrics::track_requests))
        .layer(propagate_request_id_layer())
        .layer(trace_layer())
        .layer(set_request_id_layer())
}
