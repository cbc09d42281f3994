//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path)
//!     → router.rs (rule lookup)
//!     → matcher.rs (evaluate match conditions)
//!     → Return: Route::Proxy(rule) or Route::Static
//!
//! Rule Compilation (at startup):
//!     ProxyConfig
//!     → Resolve targets (rule target, backend_url, built-in default)
//!     → Sort by prefix length
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same rule

pub mod matcher;
pub mod router;

pub use router::{ForwardPolicy, ProxyRule, Route, RouteError, Router};
