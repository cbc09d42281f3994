//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled proxy rules
//! - Classify a request as proxied (with its rule) or static
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) prefix scan, longest prefix first; host-bound rules beat
//!   host-less rules with the same prefix
//! - Anything not claimed by a rule belongs to the static responder

use axum::body::Body;
use axum::http::Request;
use url::Url;

use crate::config::schema::{ForwardHeadersConfig, ProxyConfig, DEFAULT_BACKEND_URL};
use crate::config::validation::parse_target;
use crate::routing::matcher::{AndMatcher, HostMatcher, Matcher, PathPrefixMatcher};

/// Which `X-Forwarded-*` headers to add on the upstream leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardPolicy {
    pub client_ip: bool,
    pub proto: bool,
    pub host: bool,
}

impl From<ForwardHeadersConfig> for ForwardPolicy {
    fn from(config: ForwardHeadersConfig) -> Self {
        Self {
            client_ip: config.client_ip,
            proto: config.proto,
            host: config.host,
        }
    }
}

/// A compiled forwarding rule.
#[derive(Debug)]
pub struct ProxyRule {
    pub name: String,
    pub prefix: String,
    pub host: Option<String>,
    pub target: Url,
    pub strip_prefix: bool,
    pub change_origin: bool,
    pub forward: ForwardPolicy,
    matcher: AndMatcher,
}

impl ProxyRule {
    pub fn new(
        name: impl Into<String>,
        prefix: impl Into<String>,
        host: Option<String>,
        target: Url,
        strip_prefix: bool,
    ) -> Self {
        let prefix = prefix.into();
        let mut matchers: Vec<Box<dyn Matcher>> = vec![Box::new(PathPrefixMatcher::new(&prefix))];
        if let Some(host) = &host {
            matchers.push(Box::new(HostMatcher::new(host)));
        }

        Self {
            name: name.into(),
            prefix,
            host,
            target,
            strip_prefix,
            change_origin: true,
            forward: ForwardHeadersConfig::default().into(),
            matcher: AndMatcher::new(matchers),
        }
    }

    pub fn matches(&self, req: &Request<Body>) -> bool {
        self.matcher.matches(req)
    }
}

/// Outcome of classifying a request.
#[derive(Debug, Clone, Copy)]
pub enum Route<'a> {
    Proxy(&'a ProxyRule),
    Static,
}

/// Error compiling rules from config.
#[derive(Debug, thiserror::Error)]
#[error("proxy rule {name:?}: {reason}")]
pub struct RouteError {
    pub name: String,
    pub reason: String,
}

/// Immutable rule table.
#[derive(Debug, Default)]
pub struct Router {
    rules: Vec<ProxyRule>,
}

impl Router {
    /// Compile rules from config. Rules without a target use
    /// `proxy.backend_url`, or the built-in default when that is unset.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, RouteError> {
        let fallback_target = config
            .backend_url
            .as_deref()
            .unwrap_or(DEFAULT_BACKEND_URL);

        let mut rules = Vec::with_capacity(config.rules.len());
        for rule in &config.rules {
            let raw = rule.target.as_deref().unwrap_or(fallback_target);
            let target = parse_target(raw).map_err(|reason| RouteError {
                name: rule.name.clone(),
                reason,
            })?;

            let mut compiled = ProxyRule::new(
                rule.name.clone(),
                rule.prefix.clone(),
                rule.host.clone(),
                target,
                rule.strip_prefix,
            );
            compiled.change_origin = rule.change_origin;
            compiled.forward = rule.forward_headers.into();
            rules.push(compiled);
        }

        Ok(Self::new(rules))
    }

    pub fn new(mut rules: Vec<ProxyRule>) -> Self {
        // Longest prefix first; host-bound first on ties. Stable sort keeps
        // config order otherwise.
        rules.sort_by(|a, b| {
            b.prefix
                .len()
                .cmp(&a.prefix.len())
                .then_with(|| b.host.is_some().cmp(&a.host.is_some()))
        });
        Self { rules }
    }

    /// Classify a request.
    pub fn route(&self, req: &Request<Body>) -> Route<'_> {
        self.rules
            .iter()
            .find(|rule| rule.matches(req))
            .map_or(Route::Static, Route::Proxy)
    }

    pub fn rules(&self) -> &[ProxyRule] {
        &self.rules
    }
}
