//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → admission.rs (CORS preflight + headers, then the limiter)
//!     → rate_limit.rs (per-IP fixed-window check)
//!     → Pass to routing
//!     → credentials.rs (Basic auth on POST/DELETE handlers)
//! ```
//!
//! # Design Decisions
//! - Preflights are never counted or throttled
//! - Throttling happens before any handler can touch the store
//! - Auth failures are indistinguishable from each other

pub mod admission;
pub mod credentials;
pub mod rate_limit;

pub use credentials::{BasicAuth, Credentials};
pub use rate_limit::{Clock, Decision, RateLimiter, RateWindow, SystemClock};
