//! Logs and metrics.
//!
//! ```text
//! TraceLayer span per request (method, uri, x-request-id)
//!     → logging.rs: pretty or JSON lines on stdout
//! dispatch / gateway
//!     → metrics.rs: request counter + latency histogram, upstream failures
//!     → Prometheus scrape listener (optional)
//! ```

pub mod logging;
pub mod metrics;
