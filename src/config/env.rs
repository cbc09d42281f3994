//! Environment variable overlay.
//!
//! # Responsibilities
//! - Abstract environment lookup behind [`EnvSource`]
//! - Apply `PORT`, `STATIC_DIR`, backend URL and logging variables over a
//!   loaded [`FrontdoorConfig`]
//!
//! # Design Decisions
//! - Empty values count as unset
//! - The same source is kept in `AppState` so `/config.js` can re-read it

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use crate::config::loader::ConfigError;
use crate::config::schema::{FrontdoorConfig, LogFormat};

/// Listen port.
pub const PORT: &str = "PORT";
/// Static root override.
pub const STATIC_DIR: &str = "STATIC_DIR";
/// Strip flag applied to every proxy rule.
pub const PROXY_STRIP_PREFIX: &str = "PROXY_STRIP_PREFIX";
/// `pretty` or `json`.
pub const LOG_FORMAT: &str = "LOG_FORMAT";
/// Default filter when `RUST_LOG` is unset.
pub const LOG_LEVEL: &str = "LOG_LEVEL";

/// Read access to environment variables.
pub trait EnvSource: Send + Sync + fmt::Debug {
    /// Raw value of `key`, if set.
    fn var(&self, key: &str) -> Option<String>;

    /// Value of `key` if set and non-blank, trimmed.
    fn non_empty(&self, key: &str) -> Option<String> {
        self.var(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// First non-blank value among `keys`.
    fn first_of(&self, keys: &[String]) -> Option<String> {
        keys.iter().find_map(|k| self.non_empty(k))
    }
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// In-memory environment, mutable at runtime.
///
/// Part of the supported API: embedders that hold configuration somewhere
/// other than the process environment hand one of these to
/// [`HttpServer::with_env`](crate::HttpServer::with_env) and update it
/// with [`set`](Self::set) and [`remove`](Self::remove). `/config.js`
/// reflects changes on the next request. Integration tests use it the
/// same way.
#[derive(Debug, Default)]
pub struct MapEnv {
    vars: RwLock<HashMap<String, String>>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&self, key: &str, value: &str) {
        if let Ok(mut vars) = self.vars.write() {
            vars.insert(key.to_string(), value.to_string());
        }
    }

    pub fn remove(&self, key: &str) {
        if let Ok(mut vars) = self.vars.write() {
            vars.remove(key);
        }
    }
}

impl EnvSource for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.read().ok()?.get(key).cloned()
    }
}

/// Overlay environment values onto `config`.
pub fn apply_env(config: &mut FrontdoorConfig, env: &dyn EnvSource) -> Result<(), ConfigError> {
    if let Some(port) = env.non_empty(PORT) {
        config.listener.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
            key: PORT.to_string(),
            value: port.clone(),
        })?;
    }

    if let Some(root) = env.non_empty(STATIC_DIR) {
        config.static_files.root = root;
    }

    if let Some(url) = env.first_of(&config.runtime_config.env_vars) {
        config.proxy.backend_url = Some(url);
    }

    if let Some(raw) = env.non_empty(PROXY_STRIP_PREFIX) {
        let strip = parse_bool(&raw).ok_or_else(|| ConfigError::InvalidEnv {
            key: PROXY_STRIP_PREFIX.to_string(),
            value: raw.clone(),
        })?;
        for rule in &mut config.proxy.rules {
            rule.strip_prefix = strip;
        }
    }

    if let Some(format) = env.non_empty(LOG_FORMAT) {
        config.observability.log_format = match format.to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            _ => {
                return Err(ConfigError::InvalidEnv {
                    key: LOG_FORMAT.to_string(),
                    value: format,
                })
            }
        };
    }

    if let Some(level) = env.non_empty(LOG_LEVEL) {
        config.observability.log_level = level;
    }

    Ok(())
}

/// Parse `true`/`false`/`1`/`0`/`yes`/`no`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_and_backend_override_defaults() {
        let env = MapEnv::new()
            .with("PORT", "3000")
            .with("BACKEND_URL", "https://api.example.com");
        let mut config = FrontdoorConfig::default();
        apply_env(&mut config, &env).unwrap();

        assert_eq!(config.listener.port, 3000);
        assert_eq!(config.proxy.backend_url.as_deref(), Some("https://api.example.com"));
    }

    #[test]
    fn backend_url_wins_over_secondary_var() {
        let env = MapEnv::new()
            .with("FOODY_API", "https://second.example.com")
            .with("BACKEND_URL", "https://first.example.com");
        let mut config = FrontdoorConfig::default();
        apply_env(&mut config, &env).unwrap();
        assert_eq!(config.proxy.backend_url.as_deref(), Some("https://first.example.com"));

        let env = MapEnv::new()
            .with("BACKEND_URL", "   ")
            .with("FOODY_API", "https://second.example.com");
        let mut config = FrontdoorConfig::default();
        apply_env(&mut config, &env).unwrap();
        assert_eq!(config.proxy.backend_url.as_deref(), Some("https://second.example.com"));
    }

    #[test]
    fn bad_port_is_rejected() {
        let env = MapEnv::new().with("PORT", "eighty");
        let mut config = FrontdoorConfig::default();
        let err = apply_env(&mut config, &env).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { ref key, .. } if key == "PORT"));
    }

    #[test]
    fn strip_flag_applies_to_every_rule() {
        let env = MapEnv::new().with("PROXY_STRIP_PREFIX", "1");
        let mut config = FrontdoorConfig::default();
        config.proxy.rules.push(config.proxy.rules[0].clone());
        apply_env(&mut config, &env).unwrap();
        assert!(config.proxy.rules.iter().all(|r| r.strip_prefix));
    }

    #[test]
    fn map_env_mutation_is_visible() {
        let env = MapEnv::new().with("BACKEND_URL", "https://a.example.com");
        assert_eq!(env.var("BACKEND_URL").as_deref(), Some("https://a.example.com"));
        env.set("BACKEND_URL", "https://b.example.com");
        assert_eq!(env.var("BACKEND_URL").as_deref(), Some("https://b.example.com"));
        env.remove("BACKEND_URL");
        assert!(env.var("BACKEND_URL").is_none());
    }
}
