//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use alice_router::config::RouterConfig;
use alice_router::store::{keys, MemoryStore};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Router;
use tokio::net::TcpListener;

/// Router configuration for tests: in-memory store, no heartbeat, short waits.
pub fn test_config() -> RouterConfig {
    let mut config = RouterConfig::default();
    config.listener.host = "router-test".into();
    config.listener.port = 5200;
    config.store.url = "memory://".into();
    config.store.selection_timeout_secs = 1;
    config.store.lookup_timeout_ms = 500;
    config.heartbeat.enabled = false;
    config
}

/// Store holding the canonical scenario:
/// `*.example.com.` → app1, `/v1/*` → web, backend m1:8080 (i1), passer 9000.
pub fn scenario_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.set_field(keys::DOMAINS, "*.example.com.", r#"["d1", [["forward", "app1"]]]"#);
    store.set_field(&keys::paths("app1"), "/v1/*", r#"["p1", [["forward", "web"]]]"#);
    store.push(&keys::backends("app1", "web"), r#"["b1", "m1", 8080, "i1"]"#);
    store.push(&keys::passers("m1"), r#"["e1", "9000"]"#);
    store
}

/// Point the scenario's backend at a passer listening on `addr`.
pub fn route_to_passer(store: &MemoryStore, addr: SocketAddr) {
    let machine = addr.ip().to_string();
    let backends = keys::backends("app1", "web");
    store.remove(&backends, r#"["b1", "m1", 8080, "i1"]"#);
    store.push(&backends, format!(r#"["b1", "{}", 8080, "i1"]"#, machine));
    store.push(&keys::passers(&machine), format!(r#"["e1", {}]"#, addr.port()));
}

/// Wait until the stats queue holds `count` ids.
pub async fn wait_for_stats(store: &MemoryStore, queue: &str, count: usize) -> Vec<String> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let queued = store.queued(queue);
        if queued.len() >= count || tokio::time::Instant::now() >= deadline {
            return queued;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Start a passer stand-in that answers every request with an ETag and
/// echoes the routing headers it received.
pub async fn start_passer() -> SocketAddr {
    let app = Router::new().fallback(|headers: HeaderMap| async move {
        let mut response = (StatusCode::OK, "from backend").into_response();
        let out = response.headers_mut();
        out.insert(header::ETAG, HeaderValue::from_static("\"abc\""));
        out.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        for (received, echo) in [
            ("x-pluto-backend-port", "x-echo-backend-port"),
            ("if-none-match", "x-echo-if-none-match"),
            ("host", "x-echo-host"),
        ] {
            if let Some(v) = headers.get(received) {
                out.insert(echo, v.clone());
            }
        }
        response
    });
    serve(app).await
}

/// Serve `app` on an ephemeral local port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// A local address nothing is listening on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
