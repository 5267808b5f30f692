//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (peer address attached)
//!     → server.rs (Axum setup, ambient layers)
//!     → request.rs (request ID, trace span)
//!     → security::admission (CORS, rate limit)
//!     → handlers.rs (catalog routes)
//!     → response.rs (errors → JSON)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use response::ApiError;
pub use server::{build_router, AppState, HttpServer};
