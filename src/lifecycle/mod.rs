//! Process lifecycle.
//!
//! `main` loads and validates config, starts logging and metrics, binds and
//! serves. [`signals::shutdown_on_signal`] turns SIGINT/SIGTERM into a
//! [`Shutdown`] trigger; the server then stops accepting and lets in-flight
//! requests finish.

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
