//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use spa_frontdoor::config::FrontdoorConfig;
use spa_frontdoor::{EnvSource, HttpServer, MapEnv, Shutdown};

pub const INDEX_HTML: &str = "<!doctype html><div id=\"root\"></div>";
pub const APP_JS: &str = "console.log('app');";

/// Paths ending in this segment make the mock upstream stall.
pub const SLOW_SEGMENT: &str = "slow";

/// Start a mock upstream on an ephemeral port.
///
/// Every request is echoed back as JSON (method, path, query, headers,
/// body). The `x-mock-status` request header picks the response status.
pub async fn start_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = axum::Router::new().fallback(echo);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Events seen by [`start_stalling_upstream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallEvent {
    Entered,
    Cancelled,
}

struct CancelGuard(mpsc::UnboundedSender<StallEvent>);

impl Drop for CancelGuard {
    fn drop(&mut self) {
        let _ = self.0.send(StallEvent::Cancelled);
    }
}

/// Start an upstream whose handler never answers.
///
/// It reports when a handler starts and when its future is dropped.
pub async fn start_stalling_upstream() -> (SocketAddr, mpsc::UnboundedReceiver<StallEvent>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    let app = axum::Router::new().fallback(move || {
        let tx = tx.clone();
        async move {
            let _ = tx.send(StallEvent::Entered);
            let _guard = CancelGuard(tx);
            tokio::time::sleep(Duration::from_secs(30)).await;
            "late"
        }
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, rx)
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    if uri.path().rsplit('/').next() == Some(SLOW_SEGMENT) {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }

    let status = headers
        .get("x-mock-status")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u16>().ok())
        .and_then(|v| StatusCode::from_u16(v).ok())
        .unwrap_or(StatusCode::OK);

    let header_map: Map<String, Value> = headers
        .iter()
        .map(|(name, value)| {
            let value = value.to_str().unwrap_or_default().to_string();
            (name.to_string(), Value::String(value))
        })
        .collect();

    let payload = json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "headers": header_map,
        "body": String::from_utf8_lossy(&body),
    });
    (status, [("x-upstream", "mock")], Json(payload)).into_response()
}

/// A build output directory with an entry document and one asset.
pub fn dist() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), INDEX_HTML).unwrap();
    std::fs::create_dir(dir.path().join("assets")).unwrap();
    std::fs::write(dir.path().join("assets/app.js"), APP_JS).unwrap();
    dir
}

/// Config serving `dist` and proxying `/api` to `upstream`.
pub fn config(dist: &TempDir, upstream: SocketAddr) -> FrontdoorConfig {
    let mut config = FrontdoorConfig::default();
    config.listener.bind_address = "127.0.0.1".into();
    config.listener.port = 0;
    config.static_files.root = dist.path().to_string_lossy().into_owned();
    config.proxy.backend_url = Some(format!("http://{upstream}"));
    config
}

/// In-process router for `config`, with an empty environment.
pub fn router(config: FrontdoorConfig) -> axum::Router {
    router_with_env(config, Arc::new(MapEnv::new()))
}

pub fn router_with_env(config: FrontdoorConfig, env: Arc<dyn EnvSource>) -> axum::Router {
    HttpServer::with_env(config, env).unwrap().router()
}

/// Run a real server on an ephemeral port.
pub async fn spawn(config: FrontdoorConfig) -> (SocketAddr, Shutdown) {
    let server = HttpServer::with_env(config, Arc::new(MapEnv::new())).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Collect a response body as a string.
pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}
