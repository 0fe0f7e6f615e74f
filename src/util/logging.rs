//! Structured logging setup for svcbuild
//!
//! Logs are written to stderr through a `tracing` subscriber so that stdout stays
//! reserved for progress lines and command output.
//!
//! # Example
//!
//! ```no_run
//! use svcbuild::util::logging;
//!
//! // Reads SVCBUILD_LOG_LEVEL and SVCBUILD_LOG_JSON
//! logging::init_from_env();
//!
//! tracing::info!(unit = "PlayerService", "Discovered unit");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level to display
    pub level: Level,

    /// Use JSON output format
    pub use_json: bool,

    /// Include the module target (e.g., svcbuild::build) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,

    /// Include thread ID and name in logs; useful with parallel builds
    pub include_thread_ids: bool,
}

impl Default for LoggingConfig {
    /// Defaults: INFO, console output, targets on, no locations, no thread ids
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
            include_thread_ids: false,
        }
    }
}

impl LoggingConfig {
    /// Creates a logging configuration with the specified level
    ///
    /// ```
    /// use svcbuild::util::LoggingConfig;
    /// use tracing::Level;
    ///
    /// let config = LoggingConfig::with_level(Level::DEBUG);
    /// assert!(!config.use_json);
    /// ```
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// JSON output with full metadata, for CI log collection
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            use_json: true,
            include_target: true,
            include_location: true,
            include_thread_ids: true,
        }
    }

    /// Debug level console output
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            use_json: false,
            include_target: true,
            include_location: false,
            include_thread_ids: false,
        }
    }
}

/// Parses a log level from a string, case-insensitively.
///
/// Unknown values fall back to `Level::INFO` with a notice on stderr.
///
/// ```
/// use svcbuild::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Level::DEBUG);
/// assert_eq!(parse_level("invalid"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

fn build_filter(level: Level) -> EnvFilter {
    // RUST_LOG wins when set
    if env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }

    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(format!("svcbuild={}", level))
}

/// Initializes the logging system. Only the first call has any effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        // Exactly one of the two layers is present
        let json_layer = config.use_json.then(|| {
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(config.include_target)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_thread_ids(config.include_thread_ids)
                .with_thread_names(config.include_thread_ids)
        });
        let text_layer = (!config.use_json).then(|| {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(config.include_target)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_thread_ids(config.include_thread_ids)
                .with_thread_names(config.include_thread_ids)
        });

        tracing_subscriber::registry()
            .with(build_filter(config.level))
            .with(json_layer)
            .with(text_layer)
            .init();
    });
}

/// Initializes logging from `SVCBUILD_LOG_LEVEL` and `SVCBUILD_LOG_JSON`.
pub fn init_from_env() {
    init_logging(config_from_env(None));
}

/// Builds a configuration from the environment; `level_override` (CLI flags) wins over
/// `SVCBUILD_LOG_LEVEL`.
pub fn config_from_env(level_override: Option<Level>) -> LoggingConfig {
    let level = level_override.unwrap_or_else(|| {
        let level_str = env::var("SVCBUILD_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        parse_level(&level_str)
    });

    let use_json = env::var("SVCBUILD_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    LoggingConfig {
        level,
        use_json,
        include_thread_ids: use_json,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level("info"), Level::INFO);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
    }

    #[test]
    fn test_parse_level_case_insensitive() {
        assert_eq!(parse_level("TRACE"), Level::TRACE);
        assert_eq!(parse_level("Debug"), Level::DEBUG);
    }

    #[test]
    fn test_parse_level_invalid() {
        assert_eq!(parse_level("invalid"), Level::INFO);
        assert_eq!(parse_level(""), Level::INFO);
    }

    #[test]
    fn test_presets() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.use_json);

        let config = LoggingConfig::production();
        assert!(config.use_json);
        assert!(config.include_thread_ids);

        let config = LoggingConfig::development();
        assert_eq!(config.level, Level::DEBUG);
        assert!(!config.include_location);
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        env::set_var("SVCBUILD_LOG_LEVEL", "warn");
        env::set_var("SVCBUILD_LOG_JSON", "true");

        let config = config_from_env(None);
        assert_eq!(config.level, Level::WARN);
        assert!(config.use_json);

        let config = config_from_env(Some(Level::TRACE));
        assert_eq!(config.level, Level::TRACE);

        env::remove_var("SVCBUILD_LOG_LEVEL");
        env::remove_var("SVCBUILD_LOG_JSON");
    }
}
