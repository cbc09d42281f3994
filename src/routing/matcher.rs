//! Request conditions for proxy rules.
//!
//! A rule claims a request when its path prefix matches on a segment
//! boundary (`/api` claims `/api` and `/api/...`, never `/apiary`) and, if
//! the rule is host-bound, the Host header names that host. Paths compare
//! case-sensitively; hosts compare case-insensitively without the port.

use axum::body::Body;
use axum::http::{header, Request};

/// One condition a proxy rule places on a request.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    fn matches(&self, req: &Request<Body>) -> bool;
}

/// Segment-boundary prefix test shared by the router and config validation.
pub fn prefix_matches(prefix: &str, path: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}

/// Restricts a rule to one virtual host.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    host: String,
}

impl HostMatcher {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into().to_lowercase(),
        }
    }
}

impl Matcher for HostMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        let Some(inbound) = req
            .headers()
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .or_else(|| req.uri().host())
        else {
            return false;
        };

        let inbound = inbound.to_lowercase();
        inbound == self.host || strip_port(&inbound) == self.host
    }
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        // [v6]:port
        return host.split_once("]:").map_or(host, |(h, _)| &host[..h.len() + 1]);
    }
    host.rsplit_once(':').map_or(host, |(h, _)| h)
}

/// Claims a path and everything below it.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        prefix_matches(&self.prefix, req.uri().path())
    }
}

/// Passes when every inner matcher passes.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        self.matchers.iter().all(|m| m.matches(req))
    }
}
