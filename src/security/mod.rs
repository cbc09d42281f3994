//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Static request:
//!     → traversal.rs (decode, reject `..`, confine to root)
//!
//! Proxied request:
//!     → traversal.rs (reject dot segments)
//!     → headers.rs (strip hop-by-hop, add X-Forwarded-*, rewrite Host)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - No trust in client input

pub mod headers;
pub mod traversal;

pub use traversal::TraversalError;
