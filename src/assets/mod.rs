//! Static Asset Responder.
//!
//! # Data Flow
//! ```text
//! Request not claimed by a proxy rule or fixed endpoint
//!     → resolver.rs (sanitize, look up file, SPA fallback)
//!     → file with validators, or entry document with no-cache headers
//!
//! GET /config.js
//!     → runtime_config.rs (read env now, render script, no-cache)
//! ```

pub mod resolver;
pub mod runtime_config;

pub use resolver::{Resolved, StaticFile, StaticResponder};
pub use runtime_config::ConfigScript;
