//! Book catalog HTTP service.
//!
//! A filterable catalog of book records stored in a JSON file, with Basic
//! auth on writes and a per-client fixed-window request limit.

pub mod catalog;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::CatalogConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
