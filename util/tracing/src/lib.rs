//! Tracing setup for guard services.
//!
//! Log level is controlled with the standard `RUST_LOG` directives and
//! defaults to `info`. Output can optionally be switched to JSON and
//! mirrored into a daily rolling log file.

mod config;
mod subscriber;

pub use config::Config;
pub use subscriber::{init_tracing_subscriber, ScopeGuard};
