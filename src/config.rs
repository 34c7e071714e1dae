//! Configuration loading and constants.
//!
//! Loads the service configuration from a TOML file and defines the defaults for
//! the run loop timing, notifier selection, the hang test hook and logging.
//! `AppConfig` is the root configuration struct; `Timings` is the validated
//! pair of work period and watchdog interval the supervisor runs with.

use const_format::formatcp;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// =============================================================================
// Run Loop Timing
// =============================================================================

/// Sleep between two cycles of the run loop
pub const DEFAULT_WORK_PERIOD_MS: u64 = 1000;

/// Maximum silence declared to the external watcher (WATCHDOG_USEC)
pub const DEFAULT_WATCHDOG_INTERVAL_MS: u64 = 5000;

/// Smallest interval/period gap accepted without a warning
pub const DEFAULT_MIN_MARGIN_MS: u64 = 1000;

/// Largest WATCHDOG_USEC value the notification protocol carries (about 71 minutes)
pub const MAX_WATCHDOG_INTERVAL_USEC: u64 = u32::MAX as u64;

// =============================================================================
// Default Paths and Strings
// =============================================================================

/// Crate name used as the log target prefix
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Sentinel file whose presence makes the work unit hang
pub const DEFAULT_SENTINEL_PATH: &str = "/tmp/crash";

/// Default log filter when neither --log-level nor RUST_LOG is set
pub const DEFAULT_LOG_FILTER: &str = formatcp!("{}=info", CRATE_NAME);

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Run loop timing
    #[serde(default)]
    pub supervisor: SupervisorConfig,
    /// Liveness sink selection
    #[serde(default)]
    pub notifier: NotifierConfig,
    /// Simulated hang test hook
    #[serde(default)]
    pub hang: HangConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Run loop timing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SupervisorConfig {
    /// Sleep between cycles in milliseconds (default: 1000)
    #[serde(default = "SupervisorConfig::default_work_period")]
    pub work_period_ms: u64,
    /// Watchdog interval declared to the notifier in milliseconds (default: 5000)
    #[serde(default = "SupervisorConfig::default_watchdog_interval")]
    pub watchdog_interval_ms: u64,
    /// Margin below which a warning is logged (default: 1000)
    #[serde(default = "SupervisorConfig::default_min_margin")]
    pub min_margin_ms: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            work_period_ms: Self::default_work_period(),
            watchdog_interval_ms: Self::default_watchdog_interval(),
            min_margin_ms: Self::default_min_margin(),
        }
    }
}

impl SupervisorConfig {
    fn default_work_period() -> u64 {
        DEFAULT_WORK_PERIOD_MS
    }

    fn default_watchdog_interval() -> u64 {
        DEFAULT_WATCHDOG_INTERVAL_MS
    }

    fn default_min_margin() -> u64 {
        DEFAULT_MIN_MARGIN_MS
    }

    /// Validate the configured values and produce run loop timings.
    pub fn timings(&self) -> Result<Timings, ConfigError> {
        let timings = Timings::new(
            Duration::from_millis(self.work_period_ms),
            Duration::from_millis(self.watchdog_interval_ms),
        )?;

        let min_margin = Duration::from_millis(self.min_margin_ms);
        if timings.margin() < min_margin {
            tracing::warn!(
                work_period_ms = self.work_period_ms,
                watchdog_interval_ms = self.watchdog_interval_ms,
                min_margin_ms = self.min_margin_ms,
                "Watchdog margin is smaller than configured minimum; a slow cycle may trip the watchdog"
            );
        }

        Ok(timings)
    }
}

/// Validated run loop timing.
///
/// Only constructible with `work_period < watchdog_interval`, both non-zero,
/// and an interval that fits in WATCHDOG_USEC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    work_period: Duration,
    watchdog_interval: Duration,
}

impl Timings {
    pub fn new(work_period: Duration, watchdog_interval: Duration) -> Result<Self, ConfigError> {
        if work_period.is_zero() {
            return Err(ConfigError::Validation(
                "supervisor.work_period_ms must be greater than zero".to_string(),
            ));
        }
        if watchdog_interval.is_zero() {
            return Err(ConfigError::Validation(
                "supervisor.watchdog_interval_ms must be greater than zero".to_string(),
            ));
        }
        if watchdog_interval.as_micros() > u128::from(MAX_WATCHDOG_INTERVAL_USEC) {
            return Err(ConfigError::Validation(format!(
                "watchdog interval ({:?}) exceeds the largest declarable value ({:?})",
                watchdog_interval,
                Duration::from_micros(MAX_WATCHDOG_INTERVAL_USEC)
            )));
        }
        if work_period >= watchdog_interval {
            return Err(ConfigError::Validation(format!(
                "work period ({:?}) must be strictly less than watchdog interval ({:?})",
                work_period, watchdog_interval
            )));
        }

        Ok(Self {
            work_period,
            watchdog_interval,
        })
    }

    pub fn work_period(&self) -> Duration {
        self.work_period
    }

    pub fn watchdog_interval(&self) -> Duration {
        self.watchdog_interval
    }

    /// Slack between the declared interval and one period
    pub fn margin(&self) -> Duration {
        self.watchdog_interval - self.work_period
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            work_period: Duration::from_millis(DEFAULT_WORK_PERIOD_MS),
            watchdog_interval: Duration::from_millis(DEFAULT_WATCHDOG_INTERVAL_MS),
        }
    }
}

/// Which liveness sink to report to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    /// systemd when NOTIFY_SOCKET is set, otherwise none
    #[default]
    Auto,
    Systemd,
    None,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub kind: NotifierKind,
}

/// Simulated hang hook configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HangConfig {
    /// Whether the sentinel file is polled at all (default: false)
    #[serde(default)]
    pub enabled: bool,
    /// Sentinel file path (default: /tmp/crash)
    #[serde(default = "HangConfig::default_sentinel_path")]
    pub sentinel_path: PathBuf,
}

impl Default for HangConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sentinel_path: Self::default_sentinel_path(),
        }
    }
}

impl HangConfig {
    fn default_sentinel_path() -> PathBuf {
        PathBuf::from(DEFAULT_SENTINEL_PATH)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured)
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

impl LoggingConfig {
    fn default_format() -> String {
        DEFAULT_LOG_FORMAT.to_string()
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;

        match config.logging.format.to_ascii_lowercase().as_str() {
            "text" | "json" => {}
            other => {
                return Err(ConfigError::Validation(format!(
                    "Unknown logging.format '{}', expected \"text\" or \"json\"",
                    other
                )))
            }
        }

        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // =============================================================================
    // Timings tests
    // =============================================================================

    #[test]
    fn test_default_timings_hold_invariant() {
        let timings = Timings::default();
        assert_eq!(timings.work_period(), Duration::from_secs(1));
        assert_eq!(timings.watchdog_interval(), Duration::from_secs(5));
        assert!(timings.work_period() < timings.watchdog_interval());
        assert_eq!(timings.margin(), Duration::from_secs(4));
    }

    #[test]
    fn test_timings_reject_equal_period_and_interval() {
        let result = Timings::new(Duration::from_secs(5), Duration::from_secs(5));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_timings_reject_period_above_interval() {
        let result = Timings::new(Duration::from_secs(6), Duration::from_secs(5));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_timings_reject_zero() {
        assert!(Timings::new(Duration::ZERO, Duration::from_secs(5)).is_err());
        assert!(Timings::new(Duration::from_secs(1), Duration::ZERO).is_err());
    }

    #[test]
    fn test_timings_reject_interval_beyond_watchdog_usec() {
        // 90 minutes would be truncated to ~71.6 minutes when declared,
        // ending up below the 80 minute period
        let result = Timings::new(Duration::from_secs(80 * 60), Duration::from_secs(90 * 60));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_timings_accept_largest_declarable_interval() {
        let interval = Duration::from_micros(MAX_WATCHDOG_INTERVAL_USEC);
        let timings = Timings::new(Duration::from_secs(60), interval).unwrap();
        assert_eq!(timings.watchdog_interval(), interval);

        let too_long = interval + Duration::from_micros(1);
        assert!(Timings::new(Duration::from_secs(60), too_long).is_err());
    }

    #[test]
    fn test_small_margin_is_accepted() {
        let config = SupervisorConfig {
            work_period_ms: 4900,
            watchdog_interval_ms: 5000,
            min_margin_ms: 1000,
        };
        let timings = config.timings().unwrap();
        assert_eq!(timings.margin(), Duration::from_millis(100));
    }

    // =============================================================================
    // Loading tests
    // =============================================================================

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.supervisor.work_period_ms, DEFAULT_WORK_PERIOD_MS);
        assert_eq!(
            config.supervisor.watchdog_interval_ms,
            DEFAULT_WATCHDOG_INTERVAL_MS
        );
        assert_eq!(config.notifier.kind, NotifierKind::Auto);
        assert!(!config.hang.enabled);
        assert_eq!(config.hang.sentinel_path, PathBuf::from("/tmp/crash"));
        assert!(!config.logging.is_json());
    }

    #[test]
    fn test_parse_full_config() {
        let config = AppConfig::parse(
            r#"
            [supervisor]
            work_period_ms = 250
            watchdog_interval_ms = 2000
            min_margin_ms = 500

            [notifier]
            kind = "none"

            [hang]
            enabled = true
            sentinel_path = "/run/phoenix/hang"

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        let timings = config.supervisor.timings().unwrap();
        assert_eq!(timings.work_period(), Duration::from_millis(250));
        assert_eq!(timings.watchdog_interval(), Duration::from_secs(2));
        assert_eq!(config.notifier.kind, NotifierKind::None);
        assert!(config.hang.enabled);
        assert_eq!(config.hang.sentinel_path, PathBuf::from("/run/phoenix/hang"));
        assert!(config.logging.is_json());
    }

    #[test]
    fn test_timings_reject_period_not_below_interval_from_file() {
        let config = AppConfig::parse(
            r#"
            [supervisor]
            work_period_ms = 5000
            watchdog_interval_ms = 5000
            "#,
        )
        .unwrap();
        let result = config.supervisor.timings();
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_parse_rejects_unknown_notifier_kind() {
        let result = AppConfig::parse("[notifier]\nkind = \"dbus\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_parse_rejects_unknown_log_format() {
        let result = AppConfig::parse("[logging]\nformat = \"xml\"\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[supervisor]\nwork_period_ms = 100\nwatchdog_interval_ms = 300").unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.supervisor.work_period_ms, 100);
        assert_eq!(config.supervisor.watchdog_interval_ms, 300);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppConfig::load(dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
