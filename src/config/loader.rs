//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::env::{self, apply_env, EnvSource};
use crate::config::schema::FrontdoorConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value {value:?} for environment variable {key}")]
    InvalidEnv { key: String, value: String },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML config file without validating it.
pub fn read_config_file(path: &Path) -> Result<FrontdoorConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Values supplied on the command line. They outrank the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub port: Option<u16>,
    pub static_dir: Option<String>,
    pub backend_url: Option<String>,
    pub strip_prefix: Option<bool>,
}

impl Overrides {
    pub fn apply(&self, config: &mut FrontdoorConfig) {
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(dir) = &self.static_dir {
            config.static_files.root = dir.clone();
        }
        if let Some(url) = &self.backend_url {
            config.proxy.backend_url = Some(url.clone());
        }
        if let Some(strip) = self.strip_prefix {
            for rule in &mut config.proxy.rules {
                rule.strip_prefix = strip;
            }
        }
    }

    /// Environment keys made irrelevant by these overrides.
    fn shadowed_keys(&self, config: &FrontdoorConfig) -> Vec<String> {
        let mut keys = Vec::new();
        if self.port.is_some() {
            keys.push(env::PORT.to_string());
        }
        if self.static_dir.is_some() {
            keys.push(env::STATIC_DIR.to_string());
        }
        if self.backend_url.is_some() {
            keys.extend(config.runtime_config.env_vars.iter().cloned());
        }
        if self.strip_prefix.is_some() {
            keys.push(env::PROXY_STRIP_PREFIX.to_string());
        }
        keys
    }
}

/// An environment with some keys hidden.
#[derive(Debug)]
struct Shadowed<'a> {
    inner: &'a dyn EnvSource,
    hidden: Vec<String>,
}

impl EnvSource for Shadowed<'_> {
    fn var(&self, key: &str) -> Option<String> {
        if self.hidden.iter().any(|k| k == key) {
            return None;
        }
        self.inner.var(key)
    }
}

/// Build the effective configuration: defaults, then the optional file,
/// then the environment. The result is validated.
pub fn load_config(
    path: Option<&Path>,
    env: &dyn EnvSource,
) -> Result<FrontdoorConfig, ConfigError> {
    load_config_with(path, env, &Overrides::default())
}

/// [`load_config`] with command-line overrides layered last.
///
/// Environment keys an override replaces are never parsed, so a malformed
/// `PORT` does not fail startup when `--port` is given. Validation runs
/// once, on the fully layered result.
pub fn load_config_with(
    path: Option<&Path>,
    env: &dyn EnvSource,
    overrides: &Overrides,
) -> Result<FrontdoorConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => FrontdoorConfig::default(),
    };

    let env = Shadowed {
        inner: env,
        hidden: overrides.shadowed_keys(&config),
    };
    apply_env(&mut config, &env)?;
    overrides.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
