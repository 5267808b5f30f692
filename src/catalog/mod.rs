//! Book catalog subsystem.
//!
//! # Data Flow
//! ```text
//! books.json
//!     → store.rs (load / save the whole array)
//!     → filter.rs (query-string matching)  → GET /books
//!     → stats.rs (aggregates, facets)      → GET /books/stats, /authors, ...
//!     → model.rs (validate new records)    → POST /books
//! ```
//!
//! # Design Decisions
//! - Array position is the public id; no separate key
//! - Every request re-reads the file, so external edits are picked up

pub mod filter;
pub mod model;
pub mod stats;
pub mod store;

pub use filter::BookQuery;
pub use model::{parse_new_book, Book, FieldError};
pub use stats::{CatalogStats, Facet};
pub use store::{BookStore, StoreError};
