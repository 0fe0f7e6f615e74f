//! Logging setup and path helpers

pub mod logging;
pub mod paths;

pub use logging::{init_from_env, init_logging, LoggingConfig};
