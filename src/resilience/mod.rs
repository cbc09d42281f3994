//! Upstream deadlines and failure classification.
//!
//! Every upstream call carries a connect and a total deadline. A failed call
//! is classified once (timeout → 504, anything else → 502) and never retried.

pub mod timeouts;

pub use timeouts::{upstream_client, UpstreamFailure};
