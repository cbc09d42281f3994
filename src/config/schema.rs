//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the frontdoor.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Upstream used when neither the config file nor the environment names one.
pub const DEFAULT_BACKEND_URL: &str = "https://backend-production-a417.up.railway.app";

/// Root configuration for the frontdoor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FrontdoorConfig {
    /// Listener configuration (bind address, port).
    pub listener: ListenerConfig,

    /// Static asset root and SPA fallback behaviour.
    pub static_files: StaticFilesConfig,

    /// Forwarding rules and upstream client settings.
    pub proxy: ProxyConfig,

    /// The `/config.js` runtime script.
    pub runtime_config: RuntimeConfigScript,

    /// Health and root endpoints.
    pub endpoints: EndpointsConfig,

    /// Server-wide timeouts.
    pub timeouts: TimeoutConfig,

    /// Request limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub bind_address: String,

    /// TCP port. `0` asks the OS for an ephemeral port.
    pub port: u16,
}

impl ListenerConfig {
    /// `host:port` form accepted by `TcpListener::bind`.
    pub fn socket_address(&self) -> String {
        if self.bind_address.contains(':') {
            format!("[{}]:{}", self.bind_address, self.port)
        } else {
            format!("{}:{}", self.bind_address, self.port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// What the responder does with a path that matches no file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FallbackMode {
    /// Every unmatched path gets the entry document.
    #[default]
    Always,
    /// Only unmatched paths without a file extension get the entry document.
    Extensionless,
    /// Unmatched paths are 404.
    Disabled,
}

/// Static asset configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Build output directory.
    pub root: String,

    /// Entry document served for SPA fallback.
    pub index_file: String,

    /// Fallback behaviour for unmatched paths.
    pub fallback: FallbackMode,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: "dist".to_string(),
            index_file: "index.html".to_string(),
            fallback: FallbackMode::Always,
        }
    }
}

/// Proxy configuration: the upstream default plus the rule list.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Upstream for rules without an explicit `target`.
    pub backend_url: Option<String>,

    /// Forwarding rules. Longest prefix wins.
    pub rules: Vec<ProxyRuleConfig>,

    /// Upstream client timeouts.
    pub timeouts: UpstreamTimeoutConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            rules: vec![ProxyRuleConfig::default()],
            timeouts: UpstreamTimeoutConfig::default(),
        }
    }
}

/// A single forwarding rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyRuleConfig {
    /// Rule identifier for logging/metrics.
    pub name: String,

    /// Path prefix to match, on a segment boundary.
    pub prefix: String,

    /// Host header to match (exact match).
    pub host: Option<String>,

    /// Upstream base URL. `None` uses `proxy.backend_url`.
    pub target: Option<String>,

    /// Remove `prefix` from the path before forwarding.
    pub strip_prefix: bool,

    /// Rewrite `Host` to the upstream's host.
    pub change_origin: bool,

    /// Forwarding headers to add.
    pub forward_headers: ForwardHeadersConfig,
}

impl Default for ProxyRuleConfig {
    fn default() -> Self {
        Self {
            name: "api".to_string(),
            prefix: "/api".to_string(),
            host: None,
            target: None,
            strip_prefix: false,
            change_origin: true,
            forward_headers: ForwardHeadersConfig::default(),
        }
    }
}

/// Which `X-Forwarded-*` headers a rule adds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardHeadersConfig {
    /// `X-Forwarded-For`.
    pub client_ip: bool,
    /// `X-Forwarded-Proto`.
    pub proto: bool,
    /// `X-Forwarded-Host`.
    pub host: bool,
}

impl Default for ForwardHeadersConfig {
    fn default() -> Self {
        Self {
            client_ip: true,
            proto: true,
            host: true,
        }
    }
}

/// Upstream client timeouts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamTimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Total upstream call timeout (including body) in seconds.
    pub upstream_secs: u64,
}

impl Default for UpstreamTimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            upstream_secs: 30,
        }
    }
}

/// The runtime configuration script.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RuntimeConfigScript {
    /// Serve the script at all.
    pub enabled: bool,

    /// Request path.
    pub path: String,

    /// Name of the `window` property the script assigns.
    pub global_name: String,

    /// Environment variables consulted per request, first non-empty wins.
    pub env_vars: Vec<String>,
}

impl Default for RuntimeConfigScript {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/config.js".to_string(),
            global_name: "FOODY_API".to_string(),
            env_vars: vec!["BACKEND_URL".to_string(), "FOODY_API".to_string()],
        }
    }
}

/// Health and root endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointsConfig {
    /// Liveness path.
    pub health_path: String,

    /// Readiness path.
    pub ready_path: String,

    /// Redirect `/` here instead of serving the SPA shell.
    pub root_redirect: Option<String>,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            health_path: "/health".to_string(),
            ready_path: "/ready".to_string(),
            root_redirect: None,
        }
    }
}

/// Server-wide timeouts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed to produce a response head, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
