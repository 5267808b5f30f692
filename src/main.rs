//! Book catalog service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id / trace / metrics / timeout
//!                          │
//!                          ▼
//!                    ┌───────────┐  OPTIONS   ┌──────────────────┐
//!                    │   CORS    │───────────▶│ empty 200 + CORS │
//!                    └─────┬─────┘            └──────────────────┘
//!                          ▼
//!                    ┌───────────┐  over limit ┌──────────────────┐
//!                    │rate limit │────────────▶│ 429 + CORS       │
//!                    └─────┬─────┘             └──────────────────┘
//!                          ▼
//!                    ┌───────────┐   POST/DELETE   ┌─────────────┐
//!                    │  routes   │────────────────▶│ Basic auth  │
//!                    └─────┬─────┘                 └──────┬──────┘
//!                          ▼                              ▼
//!                    ┌─────────────────────────────────────────┐
//!                    │          books.json (BookStore)         │
//!                    └─────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use book_catalog::config::loader::load_with_env;
use book_catalog::lifecycle;
use book_catalog::observability::logging;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "book-catalog")]
#[command(about = "HTTP API for a catalog of classic books")]
struct Args {
    /// Optional TOML config file; environment variables override it.
    #[arg(short, long, env = "CATALOG_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match load_with_env(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return Err(e.into());
        }
    };

    logging::init(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.bind_address(),
        rate_limit = config.rate_limit.requests_per_second,
        allowed_origins = ?config.cors.allowed_origins,
        "book-catalog starting"
    );

    lifecycle::start(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
