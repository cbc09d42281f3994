//! Request forwarding to the upstream origin.
//!
//! # Responsibilities
//! - Build the upstream request (URL, headers, streamed body)
//! - Relay status, headers and body back unchanged
//! - Map transport failures to 502/504 with one log line
//! - Report inbound body failures (over the size limit, client abort) as
//!   client errors, never as upstream failures
//!
//! # Design Decisions
//! - No retries and no response buffering
//! - Dropping the handler future (client gone) drops the upstream call

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use axum::body::{Body, HttpBody};
use axum::extract::ConnectInfo;
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::TryStreamExt;
use http_body_util::LengthLimitError;
use url::Url;

use crate::config::schema::UpstreamTimeoutConfig;
use crate::http::request::RequestIdExt;
use crate::observability::metrics;
use crate::resilience::{upstream_client, UpstreamFailure};
use crate::routing::ProxyRule;
use crate::security::headers::{append_forwarded, strip_hop_by_hop, upstream_host, ClientContext};
use crate::security::traversal::{has_dot_segments, TraversalError};

use super::path::upstream_url;

/// Why a forward did not produce an upstream response.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("rejected request path: {0}")]
    Path(#[from] TraversalError),

    #[error("request body exceeds the configured limit")]
    PayloadTooLarge,

    #[error("request body could not be read: {0}")]
    RequestBody(String),

    #[error("upstream {url} {}: {source}", .kind.as_str())]
    Upstream {
        url: Url,
        kind: UpstreamFailure,
        #[source]
        source: reqwest::Error,
    },
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Path(_) | Self::RequestBody(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Upstream { kind, .. } => kind.status(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Path(_) => "Bad request path",
            Self::PayloadTooLarge => "Payload Too Large",
            Self::RequestBody(_) => "Request body could not be read",
            Self::Upstream { kind: UpstreamFailure::Timeout, .. } => "Upstream timed out",
            Self::Upstream { .. } => "Upstream request failed",
        };
        (self.status(), message).into_response()
    }
}

/// Forwards requests for all proxy rules over one shared client.
#[derive(Debug, Clone)]
pub struct Gateway {
    client: reqwest::Client,
}

impl Gateway {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn from_config(timeouts: &UpstreamTimeoutConfig) -> reqwest::Result<Self> {
        Ok(Self::new(upstream_client(timeouts)?))
    }

    /// Forward `req` according to `rule` and relay the answer.
    pub async fn forward(&self, rule: &ProxyRule, req: Request<Body>) -> Response {
        let request_id = req.request_id().to_string();
        match self.try_forward(rule, req).await {
            Ok(response) => response,
            Err(err) => {
                match &err {
                    GatewayError::Upstream { kind, .. } => {
                        metrics::record_upstream_failure(&rule.name, kind.as_str());
                        tracing::warn!(
                            request_id = %request_id,
                            rule = %rule.name,
                            error = %err,
                            "Upstream request failed"
                        );
                    }
                    GatewayError::Path(_) => {
                        tracing::warn!(
                            request_id = %request_id,
                            rule = %rule.name,
                            error = %err,
                            "Rejected proxy path"
                        );
                    }
                    GatewayError::PayloadTooLarge | GatewayError::RequestBody(_) => {
                        tracing::info!(
                            request_id = %request_id,
                            rule = %rule.name,
                            error = %err,
                            "Inbound request body rejected"
                        );
                    }
                }
                err.into_response()
            }
        }
    }

    async fn try_forward(&self, rule: &ProxyRule, req: Request<Body>) -> Result<Response, GatewayError> {
        if has_dot_segments(req.uri().path())? {
            return Err(TraversalError::Escape.into());
        }

        let url = upstream_url(rule, req.uri());
        let client = client_context(&req);

        tracing::debug!(
            request_id = %req.request_id(),
            method = %req.method(),
            path = %req.uri().path(),
            rule = %rule.name,
            upstream = %url,
            "Forwarding request"
        );

        let (parts, body) = req.into_parts();
        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        append_forwarded(&mut headers, rule.forward, &client);
        if rule.change_origin {
            if let Some(host) = upstream_host(&rule.target) {
                headers.insert(header::HOST, host);
            }
        }

        let mut upstream = self
            .client
            .request(parts.method, url.clone())
            .headers(headers);
        let body_failure = Arc::new(OnceLock::new());
        if body.size_hint().exact() != Some(0) {
            let seen = Arc::clone(&body_failure);
            let stream = body.into_data_stream().inspect_err(move |err| {
                let _ = seen.set(BodyFailure::from_error(err));
            });
            upstream = upstream.body(reqwest::Body::wrap_stream(stream));
        }

        let upstream = match upstream.send().await {
            Ok(upstream) => upstream,
            Err(source) => {
                return Err(match body_failure.get() {
                    Some(BodyFailure::TooLarge) => GatewayError::PayloadTooLarge,
                    Some(BodyFailure::Aborted(reason)) => GatewayError::RequestBody(reason.clone()),
                    None => GatewayError::Upstream {
                        url,
                        kind: UpstreamFailure::classify(&source),
                        source,
                    },
                });
            }
        };

        let status = upstream.status();
        let mut headers = upstream.headers().clone();
        strip_hop_by_hop(&mut headers);

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}

/// Failure of the inbound body while it was being streamed upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
enum BodyFailure {
    TooLarge,
    Aborted(String),
}

impl BodyFailure {
    fn from_error(err: &axum::Error) -> Self {
        let mut cause: Option<&(dyn std::error::Error + 'static)> = Some(err);
        while let Some(e) = cause {
            if e.is::<LengthLimitError>() {
                return Self::TooLarge;
            }
            cause = e.source();
        }
        Self::Aborted(err.to_string())
    }
}

fn client_context(req: &Request<Body>) -> ClientContext {
    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| req.uri().authority().map(|a| a.to_string()));
    let proto = req.uri().scheme_str().unwrap_or("http").to_string();

    ClientContext { ip, proto, host }
}
