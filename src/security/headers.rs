//! Header manipulation for the forwarding leg.
//!
//! # Responsibilities
//! - Add X-Forwarded-For, X-Forwarded-Proto, X-Forwarded-Host
//! - Rewrite Host to the upstream origin
//! - Strip hop-by-hop headers in both directions
//!
//! # Design Decisions
//! - Existing X-Forwarded-* values are extended, never replaced
//! - Headers named by `Connection` are treated as hop-by-hop too

use std::net::IpAddr;

use axum::http::header::{
    HeaderName, HeaderValue, CONNECTION, PROXY_AUTHENTICATE, PROXY_AUTHORIZATION, TE, TRAILER,
    TRANSFER_ENCODING, UPGRADE,
};
use axum::http::HeaderMap;
use url::Url;

use crate::routing::ForwardPolicy;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
const KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");

/// Remove connection-level headers before a message crosses the proxy.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in named {
        headers.remove(name);
    }

    for name in [
        CONNECTION,
        KEEP_ALIVE,
        PROXY_AUTHENTICATE,
        PROXY_AUTHORIZATION,
        TE,
        TRAILER,
        TRANSFER_ENCODING,
        UPGRADE,
    ] {
        headers.remove(name);
    }
}

/// What the frontdoor knows about the inbound request.
#[derive(Debug, Clone, Default)]
pub struct ClientContext {
    pub ip: Option<IpAddr>,
    pub proto: String,
    pub host: Option<String>,
}

/// Add the forwarding headers `policy` asks for.
pub fn append_forwarded(headers: &mut HeaderMap, policy: ForwardPolicy, client: &ClientContext) {
    if policy.client_ip {
        if let Some(ip) = client.ip {
            append_value(headers, X_FORWARDED_FOR, &ip.to_string(), ", ");
        }
    }
    if policy.proto && !client.proto.is_empty() {
        append_value(headers, X_FORWARDED_PROTO, &client.proto, ",");
    }
    if policy.host {
        if let Some(host) = &client.host {
            append_value(headers, X_FORWARDED_HOST, host, ",");
        }
    }
}

fn append_value(headers: &mut HeaderMap, name: HeaderName, value: &str, separator: &str) {
    let existing: Vec<&str> = headers
        .get_all(&name)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    let combined = if existing.is_empty() {
        value.to_string()
    } else {
        format!("{}{separator}{value}", existing.join(separator))
    };

    if let Ok(v) = HeaderValue::from_str(&combined) {
        headers.insert(name, v);
    }
}

/// `host[:port]` of the upstream, suitable for the Host header.
pub fn upstream_host(target: &Url) -> Option<HeaderValue> {
    let host = target.host_str()?;
    let value = match target.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    HeaderValue::from_str(&value).ok()
}
