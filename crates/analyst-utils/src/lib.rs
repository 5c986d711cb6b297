//! Shared utilities for the equity analyst workspace
//!
//! Logging setup and small environment helpers used by the configuration
//! layers of the other crates.

pub mod env;
pub mod logging;

pub use env::{env_flag, env_or, env_parse};
pub use logging::{LogFormat, init_tracing, init_tracing_with};
