//! SPA frontdoor library.
//!
//! One process that serves a compiled single-page application and relays
//! API traffic to a separately hosted backend, so the browser only ever
//! talks to one origin.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                   FRONTDOOR                      │
//!                      │                                                  │
//!   Client Request     │  ┌─────────┐    ┌─────────────────────────────┐  │
//!   ───────────────────┼─▶│  http   │───▶│ fixed endpoints             │  │
//!                      │  │ server  │    │ /health /ready /config.js / │  │
//!                      │  └────┬────┘    └─────────────────────────────┘  │
//!                      │       │ fallback                                 │
//!                      │       ▼                                          │
//!                      │  ┌─────────┐  proxy rule   ┌──────────┐          │
//!                      │  │ routing │──────────────▶│ gateway  │──────────┼──▶ Backend
//!                      │  └────┬────┘               └──────────┘          │
//!                      │       │ no rule                                  │
//!                      │       ▼                                          │
//!                      │  ┌─────────┐                                     │
//!                      │  │ assets  │  build output + SPA fallback        │
//!                      │  └─────────┘                                     │
//!                      │                                                  │
//!                      │  config · security · resilience · observability  │
//!                      │  lifecycle (signals, graceful shutdown)          │
//!                      └──────────────────────────────────────────────────┘
//! ```

pub mod assets;
pub mod config;
pub mod gateway;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod security;

pub use config::{
    load_config, load_config_with, ConfigError, EnvSource, FrontdoorConfig, MapEnv, Overrides,
    ProcessEnv,
};
pub use http::{HttpServer, ServerError};
pub use lifecycle::Shutdown;
