//! Timeout enforcement.
//!
//! # Responsibilities
//! - Build the upstream client with connect and total deadlines
//! - Classify upstream failures so timeouts and transport errors map to
//!   distinct gateway statuses
//!
//! # Design Decisions
//! - Every upstream call has a deadline; there is no retry
//! - Timed-out requests return 504 Gateway Timeout
//! - Connect failures and other transport errors return 502 Bad Gateway

use std::time::Duration;

use axum::http::StatusCode;

use crate::config::schema::UpstreamTimeoutConfig;

/// How an upstream call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamFailure {
    Timeout,
    Connect,
    Transport,
}

impl UpstreamFailure {
    pub fn classify(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect
        } else {
            Self::Transport
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Connect | Self::Transport => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Transport => "transport",
        }
    }
}

/// Upstream client with the configured deadlines.
///
/// Redirects are relayed to the browser, not followed. System proxy
/// variables are ignored.
pub fn upstream_client(timeouts: &UpstreamTimeoutConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .timeout(Duration::from_secs(timeouts.upstream_secs))
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
}
