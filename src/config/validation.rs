//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate upstream URLs, path prefixes and endpoint paths
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect duplicate rules and endpoints shadowed by a proxy prefix
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FrontdoorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};

use url::Url;

use crate::config::schema::FrontdoorConfig;
use crate::routing::matcher::prefix_matches;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: {reason}")]
    Invalid { field: String, reason: String },

    #[error("proxy rule {name:?}: prefix {prefix:?} is declared more than once")]
    DuplicatePrefix { name: String, prefix: String },

    #[error("{field} {path:?} is shadowed by proxy prefix {prefix:?}")]
    ShadowedEndpoint {
        field: String,
        path: String,
        prefix: String,
    },
}

impl ValidationError {
    fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Parse an upstream base URL: http(s), with a host, no query or fragment.
pub fn parse_target(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("{raw:?} is not a URL: {e}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("{raw:?} must use http or https"));
    }
    if url.host_str().is_none() {
        return Err(format!("{raw:?} has no host"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(format!("{raw:?} must not carry a query or fragment"));
    }
    Ok(url)
}

/// Validate the whole configuration.
pub fn validate_config(config: &FrontdoorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::invalid(
            "listener.bind_address",
            format!("{:?} is not an IP address", config.listener.bind_address),
        ));
    }

    validate_static_files(config, &mut errors);
    validate_proxy(config, &mut errors);
    validate_endpoints(config, &mut errors);

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::invalid("timeouts.request_secs", "must be > 0"));
    }
    if config.security.max_body_bytes == 0 {
        errors.push(ValidationError::invalid("security.max_body_bytes", "must be > 0"));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::invalid(
            "observability.metrics_address",
            format!("{:?} is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_static_files(config: &FrontdoorConfig, errors: &mut Vec<ValidationError>) {
    let static_files = &config.static_files;
    if static_files.root.trim().is_empty() {
        errors.push(ValidationError::invalid("static_files.root", "must not be empty"));
    }
    let index = static_files.index_file.as_str();
    if index.is_empty() || index == "." || index == ".." || index.contains(['/', '\\']) {
        errors.push(ValidationError::invalid(
            "static_files.index_file",
            format!("{index:?} must be a plain file name"),
        ));
    }
}

fn validate_proxy(config: &FrontdoorConfig, errors: &mut Vec<ValidationError>) {
    let proxy = &config.proxy;

    if let Some(url) = &proxy.backend_url {
        if let Err(reason) = parse_target(url) {
            errors.push(ValidationError::invalid("proxy.backend_url", reason));
        }
    }
    if proxy.timeouts.connect_secs == 0 {
        errors.push(ValidationError::invalid("proxy.timeouts.connect_secs", "must be > 0"));
    }
    if proxy.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::invalid("proxy.timeouts.upstream_secs", "must be > 0"));
    }

    let mut seen = HashSet::new();
    for (i, rule) in proxy.rules.iter().enumerate() {
        let field = format!("proxy.rules[{i}].prefix");
        let prefix = rule.prefix.as_str();
        if !prefix.starts_with('/') {
            errors.push(ValidationError::invalid(&field, format!("{prefix:?} must start with '/'")));
        } else if prefix == "/" {
            errors.push(ValidationError::invalid(&field, "\"/\" would proxy every request"));
        } else if prefix.ends_with('/') {
            errors.push(ValidationError::invalid(&field, format!("{prefix:?} must not end with '/'")));
        }

        let host = rule.host.as_ref().map(|h| h.to_lowercase());
        if !seen.insert((prefix.to_string(), host)) {
            errors.push(ValidationError::DuplicatePrefix {
                name: rule.name.clone(),
                prefix: prefix.to_string(),
            });
        }

        if let Some(target) = &rule.target {
            if let Err(reason) = parse_target(target) {
                errors.push(ValidationError::invalid(format!("proxy.rules[{i}].target"), reason));
            }
        }
    }
}

fn validate_endpoints(config: &FrontdoorConfig, errors: &mut Vec<ValidationError>) {
    let mut endpoints = vec![
        ("endpoints.health_path", config.endpoints.health_path.as_str()),
        ("endpoints.ready_path", config.endpoints.ready_path.as_str()),
    ];
    if config.runtime_config.enabled {
        endpoints.push(("runtime_config.path", config.runtime_config.path.as_str()));
    }

    let mut seen = HashSet::new();
    if config.endpoints.root_redirect.is_some() {
        seen.insert("/");
    }

    for (field, path) in endpoints {
        if !path.starts_with('/') {
            errors.push(ValidationError::invalid(field, format!("{path:?} must start with '/'")));
            continue;
        }
        if path.contains(['{', '}', '*', ':']) {
            errors.push(ValidationError::invalid(
                field,
                format!("{path:?} must be a literal path"),
            ));
            continue;
        }
        if !seen.insert(path) {
            errors.push(ValidationError::invalid(field, format!("{path:?} is already routed")));
            continue;
        }
        for rule in config.proxy.rules.iter().filter(|r| r.host.is_none()) {
            if prefix_matches(&rule.prefix, path) {
                errors.push(ValidationError::ShadowedEndpoint {
                    field: field.to_string(),
                    path: path.to_string(),
                    prefix: rule.prefix.clone(),
                });
            }
        }
    }

    if config.runtime_config.enabled && !is_js_identifier(&config.runtime_config.global_name) {
        errors.push(ValidationError::invalid(
            "runtime_config.global_name",
            format!("{:?} is not a JavaScript identifier", config.runtime_config.global_name),
        ));
    }

    if let Some(target) = &config.endpoints.root_redirect {
        if !target.starts_with('/') && parse_target(target).is_err() {
            errors.push(ValidationError::invalid(
                "endpoints.root_redirect",
                format!("{target:?} must be a path or an http(s) URL"),
            ));
        }
        if target == "/" {
            errors.push(ValidationError::invalid("endpoints.root_redirect", "redirect loop"));
        }
    }
}

fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
