//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use base64::Engine;
use book_catalog::config::CatalogConfig;
use book_catalog::http::{AppState, HttpServer};
use book_catalog::security::{Clock, RateLimiter};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

pub const ORIGIN: &str = "http://localhost:5500";
pub const USER: &str = "admin";
pub const PASS: &str = "password";

/// Clock the test moves by hand.
#[derive(Debug)]
pub struct ManualClock(AtomicU64);

impl ManualClock {
    pub fn at(second: u64) -> Arc<Self> {
        Arc::new(Self(AtomicU64::new(second)))
    }

    pub fn set(&self, second: u64) {
        self.0.store(second, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_second(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn sample_books() -> Value {
    json!([
        {
            "author": "Chinua Achebe",
            "country": "Nigeria",
            "imageLink": "images/things-fall-apart.jpg",
            "language": "English",
            "link": "https://en.wikipedia.org/wiki/Things_Fall_Apart",
            "pages": 209,
            "title": "Things Fall Apart",
            "year": 1958
        },
        {
            "author": "Homer",
            "country": "Greece",
            "imageLink": "images/the-iliad-of-homer.jpg",
            "language": "Greek",
            "link": "https://en.wikipedia.org/wiki/Iliad",
            "pages": 608,
            "title": "Iliad",
            "year": -735
        },
        {
            "author": "Homer",
            "country": "Greece",
            "imageLink": "images/the-odyssey-of-homer.jpg",
            "language": "Greek",
            "link": "https://en.wikipedia.org/wiki/Odyssey",
            "pages": 374,
            "title": "Odyssey",
            "year": -800
        },
        {
            "author": "Miguel de Cervantes",
            "country": "Spain",
            "imageLink": "images/don-quijote-de-la-mancha.jpg",
            "language": "Spanish",
            "link": "https://en.wikipedia.org/wiki/Don_Quixote",
            "pages": 1056,
            "title": "Don Quijote De La Mancha",
            "year": 1610
        }
    ])
}

/// A fully layered router over a temporary books file, with a hand-driven
/// limiter clock.
pub struct TestApp {
    pub router: Router,
    pub clock: Arc<ManualClock>,
    pub limiter: Arc<RateLimiter>,
    pub books_path: PathBuf,
    _dir: TempDir,
}

impl TestApp {
    pub fn new(limit: u32) -> Self {
        Self::with_books(limit, &sample_books())
    }

    pub fn with_books(limit: u32, books: &Value) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let books_path = dir.path().join("books.json");
        std::fs::write(&books_path, serde_json::to_vec_pretty(books).unwrap()).unwrap();

        let config = test_config(&books_path, limit);
        let clock = ManualClock::at(1_700_000_000);
        let limiter = Arc::new(RateLimiter::with_clock(limit, clock.clone()));
        let state = AppState::with_limiter(&config, limiter.clone());
        let router = HttpServer::with_state(config, state).router();

        Self {
            router,
            clock,
            limiter,
            books_path,
            _dir: dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        send(&self.router, request).await
    }

    /// The books file as currently stored on disk.
    pub fn stored_books(&self) -> Value {
        serde_json::from_slice(&std::fs::read(&self.books_path).unwrap()).unwrap()
    }
}

pub fn test_config(books_path: &std::path::Path, limit: u32) -> CatalogConfig {
    let mut config = CatalogConfig::default();
    config.storage.books_file = books_path.to_string_lossy().into_owned();
    config.rate_limit.requests_per_second = limit;
    config.auth.username = USER.to_string();
    config.auth.password = PASS.to_string();
    config
}

/// Request from `peer` (None models a transport without a peer address).
pub fn request(method: Method, uri: &str, peer: Option<&str>) -> Request<Body> {
    build(method, uri, peer, None, Body::empty())
}

pub fn json_request(method: Method, uri: &str, peer: &str, auth: Option<(&str, &str)>, body: &Value) -> Request<Body> {
    let mut req = build(method, uri, Some(peer), auth, Body::from(body.to_string()));
    req.headers_mut()
        .insert("content-type", "application/json".parse().unwrap());
    req
}

pub fn authed_request(method: Method, uri: &str, peer: &str, auth: (&str, &str)) -> Request<Body> {
    build(method, uri, Some(peer), Some(auth), Body::empty())
}

pub fn preflight(uri: &str, peer: &str) -> Request<Body> {
    let mut req = request(Method::OPTIONS, uri, Some(peer));
    let headers = req.headers_mut();
    headers.insert("access-control-request-method", "POST".parse().unwrap());
    headers.insert("access-control-request-headers", "authorization,content-type".parse().unwrap());
    req
}

fn build(method: Method, uri: &str, peer: Option<&str>, auth: Option<(&str, &str)>, body: Body) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("origin", ORIGIN);
    if let Some((user, pass)) = auth {
        let token = base64::engine::general_purpose::STANDARD.encode(format!("{user}:{pass}"));
        builder = builder.header("authorization", format!("Basic {token}"));
    }
    let mut req = builder.body(body).unwrap();
    if let Some(peer) = peer {
        let addr: SocketAddr = format!("{peer}:40000").parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
    }
    req
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, headers, body)
}
