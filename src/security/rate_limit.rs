//! Per-client fixed-window rate limiting.
//!
//! Each client address owns one window aligned to the wall-clock second.
//! The first request of a new second resets the count to 1; later requests
//! in the same second increment it. A request whose resulting count exceeds
//! the limit is rejected.
//!
//! The whole map sits behind a single mutex. Lookup, update and comparison
//! happen inside one critical section, so two requests from the same address
//! in the same second can never both observe a count of 1.
//!
//! # Known limitations
//! - Fixed windows: `limit` requests at the end of second S plus `limit` at
//!   the start of S+1 are all admitted.
//! - Windows are never evicted; the map grows with the number of distinct
//!   addresses seen during the process lifetime.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::response::ApiError;
use crate::observability::metrics;

/// Key used when the transport did not provide a peer address.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Source of the current whole second.
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch, rounded down.
    fn now_second(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_second(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Counter for one client within one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    pub window_start_second: u64,
    pub count: u32,
}

/// Outcome of a rate check, carrying the count after this request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admitted { count: u32 },
    Rejected { count: u32 },
}

impl Decision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Decision::Admitted { .. })
    }

    pub fn count(&self) -> u32 {
        match *self {
            Decision::Admitted { count } | Decision::Rejected { count } => count,
        }
    }
}

/// Shared fixed-window limiter. Wrap in `Arc` and hand to the middleware.
pub struct RateLimiter {
    windows: Mutex<HashMap<String, RateWindow>>,
    limit: u32,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Limiter with `limit` requests per second per address on the wall clock.
    pub fn new(limit: u32) -> Self {
        Self::with_clock(limit, Arc::new(SystemClock))
    }

    pub fn with_clock(limit: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            limit,
            clock,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Record one request from `client` and decide whether it may proceed.
    pub fn check(&self, client: &str) -> Decision {
        self.check_at(client, self.clock.now_second())
    }

    /// Same as [`check`](Self::check) with an explicit second.
    pub fn check_at(&self, client: &str, now_second: u64) -> Decision {
        self.record(client, now_second).0
    }

    /// Count one request and report the decision together with the number
    /// of tracked addresses, both taken under the same lock.
    fn record(&self, client: &str, now_second: u64) -> (Decision, usize) {
        // The map only holds counters, so a poisoned lock is still usable.
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        let window = windows.entry(client.to_string()).or_insert(RateWindow {
            window_start_second: now_second,
            count: 0,
        });
        if window.window_start_second != now_second {
            *window = RateWindow {
                window_start_second: now_second,
                count: 0,
            };
        }
        window.count = window.count.saturating_add(1);
        let count = window.count;
        let tracked = windows.len();

        let decision = if count > self.limit {
            Decision::Rejected { count }
        } else {
            Decision::Admitted { count }
        };
        (decision, tracked)
    }

    /// Current window for `client`, if any request was ever seen from it.
    pub fn window(&self, client: &str) -> Option<RateWindow> {
        let windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        windows.get(client).copied()
    }

    /// Number of distinct addresses holding a window.
    pub fn tracked_clients(&self) -> usize {
        self.windows.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("limit", &self.limit)
            .field("tracked_clients", &self.tracked_clients())
            .finish()
    }
}

/// Rate key for a request: the peer IP, or [`UNKNOWN_CLIENT`].
pub fn client_key(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Middleware enforcing the per-address limit.
///
/// `OPTIONS` requests pass through uncounted so preflights are never throttled.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    let client = client_key(&request);
    let (decision, tracked) = limiter.record(&client, limiter.clock.now_second());
    metrics::record_tracked_clients(tracked);

    match decision {
        Decision::Admitted { count } => {
            tracing::trace!(client = %client, count, "Request admitted");
            next.run(request).await
        }
        Decision::Rejected { count } => {
            tracing::warn!(client = %client, count, limit = limiter.limit(), "Rate limit exceeded");
            metrics::record_rate_limited();
            ApiError::RateLimited.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: u64 = 1_700_000_000;

    #[test]
    fn test_burst_up_to_limit_then_reject() {
        let limiter = RateLimiter::new(5);

        for expected in 1..=5 {
            assert_eq!(
                limiter.check_at("1.2.3.4", T),
                Decision::Admitted { count: expected }
            );
        }
        assert_eq!(limiter.check_at("1.2.3.4", T), Decision::Rejected { count: 6 });

        // Next second starts a fresh window.
        assert_eq!(limiter.check_at("1.2.3.4", T + 1), Decision::Admitted { count: 1 });
        assert_eq!(
            limiter.window("1.2.3.4"),
            Some(RateWindow {
                window_start_second: T + 1,
                count: 1
            })
        );
    }

    #[test]
    fn test_rejections_keep_counting() {
        let limiter = RateLimiter::new(1);
        assert!(limiter.check_at("a", T).is_admitted());
        assert_eq!(limiter.check_at("a", T).count(), 2);
        assert_eq!(limiter.check_at("a", T).count(), 3);
        assert!(!limiter.check_at("a", T).is_admitted());
    }

    #[test]
    fn test_addresses_are_independent() {
        let limiter = RateLimiter::new(2);
        for _ in 0..4 {
            limiter.check_at("10.0.0.1", T);
        }
        assert!(!limiter.check_at("10.0.0.1", T).is_admitted());
        assert_eq!(limiter.check_at("10.0.0.2", T), Decision::Admitted { count: 1 });
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn test_boundary_burst_is_admitted_twice() {
        let limiter = RateLimiter::new(3);
        for _ in 0..3 {
            assert!(limiter.check_at("c", T).is_admitted());
        }
        for _ in 0..3 {
            assert!(limiter.check_at("c", T + 1).is_admitted());
        }
        assert!(!limiter.check_at("c", T + 1).is_admitted());
    }

    #[test]
    fn test_any_second_change_resets() {
        let limiter = RateLimiter::new(1);
        assert!(limiter.check_at("c", T + 5).is_admitted());
        // A clock step backwards also starts a new window.
        assert_eq!(limiter.check_at("c", T), Decision::Admitted { count: 1 });
    }

    #[test]
    fn test_concurrent_checks_never_duplicate_counts() {
        let limiter = Arc::new(RateLimiter::new(5));
        let threads = 16;
        let per_thread = 25;

        let mut counts: Vec<u32> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    let limiter = Arc::clone(&limiter);
                    scope.spawn(move || {
                        (0..per_thread)
                            .map(|_| limiter.check_at("9.9.9.9", T))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .map(|d| d.count())
                .collect()
        });

        counts.sort_unstable();
        let expected: Vec<u32> = (1..=(threads * per_thread) as u32).collect();
        assert_eq!(counts, expected);
    }

    #[test]
    fn test_record_reports_tracked_clients() {
        let limiter = RateLimiter::new(5);
        assert_eq!(limiter.record("a", T).1, 1);
        assert_eq!(limiter.record("a", T).1, 1);
        assert_eq!(limiter.record("b", T), (Decision::Admitted { count: 1 }, 2));
    }

    #[test]
    fn test_client_key_from_connect_info() {
        let mut request = Request::builder().uri("/books").body(Body::empty()).unwrap();
        assert_eq!(client_key(&request), UNKNOWN_CLIENT);

        let addr: SocketAddr = "192.168.1.20:51234".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(client_key(&request), "192.168.1.20");
    }
}
