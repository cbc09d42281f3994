//! Proxy rule forwarding through the full middleware stack.

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, Method, Request, StatusCode};
use tower::ServiceExt;

use spa_frontdoor::config::ProxyRuleConfig;

mod common;

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn preserves_prefix_by_default() {
    let upstream = common::start_upstream().await;
    let dist = common::dist();
    let app = common::router(common::config(&dist, upstream));

    let response = app.oneshot(get("/api/users/1?page=2")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-upstream"], "mock");
    let echo = common::body_json(response).await;
    assert_eq!(echo["method"], "GET");
    assert_eq!(echo["path"], "/api/users/1");
    assert_eq!(echo["query"], "page=2");
}

#[tokio::test]
async fn strips_prefix_when_configured() {
    let upstream = common::start_upstream().await;
    let dist = common::dist();
    let mut config = common::config(&dist, upstream);
    config.proxy.rules[0].strip_prefix = true;
    let app = common::router(config);

    let echo = common::body_json(app.clone().oneshot(get("/api/users/1")).await.unwrap()).await;
    assert_eq!(echo["path"], "/users/1");

    let echo = common::body_json(app.oneshot(get("/api")).await.unwrap()).await;
    assert_eq!(echo["path"], "/");
}

#[tokio::test]
async fn target_base_path_is_prepended() {
    let upstream = common::start_upstream().await;
    let dist = common::dist();
    let mut config = common::config(&dist, upstream);
    config.proxy.backend_url = Some(format!("http://{upstream}/v1"));
    config.proxy.rules[0].strip_prefix = true;
    let app = common::router(config);

    let echo = common::body_json(app.oneshot(get("/api/orders?open=1")).await.unwrap()).await;
    assert_eq!(echo["path"], "/v1/orders");
    assert_eq!(echo["query"], "open=1");
}

#[tokio::test]
async fn relays_upstream_status_and_body() {
    let upstream = common::start_upstream().await;
    let dist = common::dist();
    let app = common::router(common::config(&dist, upstream));

    let request = Request::builder()
        .uri("/api/missing")
        .header("x-mock-status", "404")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let echo = common::body_json(response).await;
    assert_eq!(echo["path"], "/api/missing");
}

#[tokio::test]
async fn forwards_method_and_body() {
    let upstream = common::start_upstream().await;
    let dist = common::dist();
    let app = common::router(common::config(&dist, upstream));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/orders")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"dish":"ramen"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let echo = common::body_json(response).await;
    assert_eq!(echo["method"], "POST");
    assert_eq!(echo["body"], r#"{"dish":"ramen"}"#);
    assert_eq!(echo["headers"]["content-type"], "application/json");
}

#[tokio::test]
async fn host_follows_change_origin() {
    let upstream = common::start_upstream().await;
    let dist = common::dist();

    let request = || {
        Request::builder()
            .uri("/api/me")
            .header(header::HOST, "app.example.com")
            .body(Body::empty())
            .unwrap()
    };

    let app = common::router(common::config(&dist, upstream));
    let echo = common::body_json(app.oneshot(request()).await.unwrap()).await;
    assert_eq!(echo["headers"]["host"], upstream.to_string());
    assert_eq!(echo["headers"]["x-forwarded-host"], "app.example.com");

    let mut config = common::config(&dist, upstream);
    config.proxy.rules[0].change_origin = false;
    let app = common::router(config);
    let echo = common::body_json(app.oneshot(request()).await.unwrap()).await;
    assert_eq!(echo["headers"]["host"], "app.example.com");
}

#[tokio::test]
async fn hop_by_hop_headers_are_not_forwarded() {
    let upstream = common::start_upstream().await;
    let dist = common::dist();
    let app = common::router(common::config(&dist, upstream));

    let request = Request::builder()
        .uri("/api/me")
        .header(header::CONNECTION, "x-session-hint")
        .header("x-session-hint", "secret")
        .header("proxy-authorization", "Basic abc")
        .header("x-kept", "yes")
        .body(Body::empty())
        .unwrap();
    let echo = common::body_json(app.oneshot(request).await.unwrap()).await;

    let headers = &echo["headers"];
    assert!(headers.get("x-session-hint").is_none());
    assert!(headers.get("proxy-authorization").is_none());
    assert_eq!(headers["x-kept"], "yes");
}

#[tokio::test]
async fn forwarded_for_is_appended() {
    let upstream = common::start_upstream().await;
    let dist = common::dist();
    let (addr, shutdown) = common::spawn(common::config(&dist, upstream)).await;

    let echo: serde_json::Value = common::client()
        .get(format!("http://{addr}/api/me"))
        .header("x-forwarded-for", "198.51.100.4")
        .header("x-forwarded-proto", "https")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(echo["headers"]["x-forwarded-for"], "198.51.100.4, 127.0.0.1");
    assert_eq!(echo["headers"]["x-forwarded-proto"], "https,http");
    assert_eq!(echo["headers"]["x-forwarded-host"], addr.to_string());

    shutdown.trigger();
}

#[tokio::test]
async fn forwarding_headers_can_be_disabled() {
    let upstream = common::start_upstream().await;
    let dist = common::dist();
    let mut config = common::config(&dist, upstream);
    let forward = &mut config.proxy.rules[0].forward_headers;
    forward.client_ip = false;
    forward.proto = false;
    forward.host = false;
    let (addr, shutdown) = common::spawn(config).await;

    let echo: serde_json::Value = common::client()
        .get(format!("http://{addr}/api/me"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let headers = &echo["headers"];
    assert!(headers.get("x-forwarded-for").is_none());
    assert!(headers.get("x-forwarded-proto").is_none());
    assert!(headers.get("x-forwarded-host").is_none());

    shutdown.trigger();
}

#[tokio::test]
async fn unreachable_upstream_is_bad_gateway() {
    let closed = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let dist = common::dist();
    let app = common::router(common::config(&dist, closed));

    let response = app.oneshot(get("/api/users")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn slow_upstream_is_gateway_timeout() {
    let upstream = common::start_upstream().await;
    let dist = common::dist();
    let mut config = common::config(&dist, upstream);
    config.proxy.timeouts.upstream_secs = 1;
    let app = common::router(config);

    let started = std::time::Instant::now();
    let response = app
        .oneshot(get(&format!("/api/{}", common::SLOW_SEGMENT)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert!(started.elapsed() < Duration::from_secs(4));
}

fn upload(body: Body) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/upload")
        .body(body)
        .unwrap()
}

#[tokio::test]
async fn chunked_body_over_limit_is_payload_too_large() {
    let upstream = common::start_upstream().await;
    let dist = common::dist();
    let mut config = common::config(&dist, upstream);
    config.security.max_body_bytes = 16;
    let app = common::router(config);

    let chunks = futures_util::stream::iter(
        (0..3).map(|_| Ok::<_, std::io::Error>(Bytes::from_static(b"0123456789"))),
    );
    let response = app.oneshot(upload(Body::from_stream(chunks))).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(response.headers().get("x-upstream").is_none());
}

#[tokio::test]
async fn declared_body_over_limit_is_payload_too_large() {
    let upstream = common::start_upstream().await;
    let dist = common::dist();
    let mut config = common::config(&dist, upstream);
    config.security.max_body_bytes = 16;
    let app = common::router(config);

    let mut request = upload(Body::from("012345678901234567890123456789"));
    request
        .headers_mut()
        .insert(header::CONTENT_LENGTH, "30".parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let response = app.oneshot(upload(Body::from("0123456789"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await["body"], "0123456789");
}

#[tokio::test]
async fn dot_segments_are_rejected() {
    let upstream = common::start_upstream().await;
    let dist = common::dist();
    let app = common::router(common::config(&dist, upstream));

    let response = app.oneshot(get("/api/%2e%2e/admin")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn prefix_matches_on_segment_boundary() {
    let upstream = common::start_upstream().await;
    let dist = common::dist();
    let app = common::router(common::config(&dist, upstream));

    let response = app.oneshot(get("/apiary")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-upstream").is_none());
    assert_eq!(common::body_string(response).await, common::INDEX_HTML);
}

#[tokio::test]
async fn rules_with_own_targets() {
    let primary = common::start_upstream().await;
    let secondary = common::start_upstream().await;
    let dist = common::dist();
    let mut config = common::config(&dist, primary);
    config.proxy.rules.push(ProxyRuleConfig {
        name: "uploads".into(),
        prefix: "/api/uploads".into(),
        target: Some(format!("http://{secondary}/store")),
        strip_prefix: true,
        ..ProxyRuleConfig::default()
    });
    let app = common::router(config);

    let request = Request::builder()
        .uri("/api/uploads/a.png")
        .header(header::HOST, "app.example.com")
        .body(Body::empty())
        .unwrap();
    let echo = common::body_json(app.clone().oneshot(request).await.unwrap()).await;
    assert_eq!(echo["path"], "/store/a.png");
    assert_eq!(echo["headers"]["host"], secondary.to_string());

    let echo = common::body_json(app.oneshot(get("/api/menu")).await.unwrap()).await;
    assert_eq!(echo["path"], "/api/menu");
}

#[tokio::test]
async fn health_does_not_depend_on_upstream() {
    let closed = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let dist = common::dist();
    let app = common::router(common::config(&dist, closed));

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await, serde_json::json!({ "ok": true }));
}
