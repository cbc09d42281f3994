//! API Forwarding Gateway.
//!
//! # Data Flow
//! ```text
//! Request matched by a ProxyRule
//!     → path.rs (strip or keep prefix, join with target, keep query)
//!     → forward.rs (headers, stream body, send with deadline)
//!     → upstream response relayed as-is, or 502/504
//! ```

pub mod forward;
pub mod path;

pub use forward::{Gateway, GatewayError};
