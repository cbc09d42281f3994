//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → environment overlay (env.rs: PORT, BACKEND_URL, ...)
//!     → CLI flags (loader.rs `Overrides`, parsed in main.rs)
//!     → validation.rs (semantic checks, once)
//!     → FrontdoorConfig (validated, immutable)
//!     → compiled into routing rules, shared via Arc
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;

pub use env::{EnvSource, MapEnv, ProcessEnv};
pub use loader::{load_config, load_config_with, ConfigError, Overrides};
pub use schema::{
    EndpointsConfig, FallbackMode, ForwardHeadersConfig, FrontdoorConfig, ListenerConfig,
    LogFormat, ObservabilityConfig, ProxyConfig, ProxyRuleConfig, RuntimeConfigScript,
    StaticFilesConfig, DEFAULT_BACKEND_URL,
};
