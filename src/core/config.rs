//! Configuration management for daqlog.
//!
//! This module provides configuration handling with:
//! - YAML file support
//! - Environment variable and CLI overrides (applied through [`ConfigBuilder`])
//! - Validation and defaults

use crate::core::retry::RetryConfig;
use crate::core::{DaqError, Result};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Complete configuration for daqlog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Acquisition cadence and data source
    pub acquisition: AcquisitionConfig,
    /// History sizes and consumer cadence
    pub history: HistoryConfig,
    /// Raw log file settings
    pub log: LogFileConfig,
    /// Chart rendering cadence
    pub plot: PlotConfig,
    /// HTTP front end
    pub server: ServerConfig,
    /// Diagnostic logging
    pub logging: LoggingConfig,
}

/// Acquisition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Minimum time between two samples
    #[serde(with = "humantime_serde")]
    pub period: Duration,
    /// How often the acquirer checks the clock and the stop signal
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Built-in data source
    pub source: SourceKind,
    /// Lower bound for the random source
    pub random_low: i64,
    /// Upper bound (inclusive) for the random source
    pub random_high: i64,
    /// Period of the sine source
    #[serde(with = "humantime_serde")]
    pub sine_period: Duration,
    /// Amplitude of the sine source
    pub sine_amplitude: f64,
    /// Reconnect policy for sources that wrap a device
    pub reconnect: RetryConfig,
}

/// History configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum points per column in both the short and the long history
    pub length: usize,
    /// Number of value columns per sample
    pub columns: usize,
    /// How long the consumer idles when the queue is empty
    #[serde(with = "humantime_serde")]
    pub idle_wait: Duration,
}

/// Raw log file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogFileConfig {
    /// Directory the log file is created in
    pub directory: PathBuf,
    /// strftime pattern for the file name, evaluated at start in local time
    pub filename_pattern: String,
    /// Optional header line, one heading per column including time
    pub headings: Vec<String>,
    /// Digits after the decimal point for logged values
    pub precision: usize,
}

/// Chart configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// Refresh period of the long-history chart
    #[serde(with = "humantime_serde")]
    pub long_period: Duration,
    /// Refresh period of the short-history chart
    #[serde(with = "humantime_serde")]
    pub short_period: Duration,
    /// Chart width in pixels
    pub width: u32,
    /// Chart height in pixels
    pub height: u32,
}

/// HTTP front end configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Serve the HTTP front end
    pub enabled: bool,
    /// Bind address
    pub bind_address: IpAddr,
    /// Port
    pub port: u16,
    /// Page auto-refresh interval
    #[serde(with = "humantime_serde")]
    pub refresh: Duration,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,
}

/// Built-in data sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Uniform random integers
    Random,
    /// Deterministic sine wave
    Sine,
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything
    Trace,
    /// Compactions, arity adjustments, per-sample detail
    Debug,
    /// Lifecycle events
    Info,
    /// Recoverable problems
    Warn,
    /// Terminal failures only
    Error,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        AcquisitionConfig {
            period: Duration::from_secs(1),
            poll_interval: Duration::from_millis(10),
            source: SourceKind::Random,
            random_low: 0,
            random_high: 100,
            sine_period: Duration::from_secs(60),
            sine_amplitude: 1.0,
            reconnect: RetryConfig::default(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            length: 256,
            columns: 1,
            idle_wait: Duration::from_secs(1),
        }
    }
}

impl Default for LogFileConfig {
    fn default() -> Self {
        LogFileConfig {
            directory: PathBuf::from("."),
            filename_pattern: "%Y%m%d-%H%M%S.txt".to_string(),
            headings: Vec::new(),
            precision: 6,
        }
    }
}

impl Default for PlotConfig {
    fn default() -> Self {
        PlotConfig {
            long_period: Duration::from_secs(5),
            short_period: Duration::from_secs(5),
            width: 1280,
            height: 720,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            enabled: true,
            bind_address: IpAddr::from([0, 0, 0, 0]),
            port: 8000,
            refresh: Duration::from_secs(5),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Result<Self> {
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let nonzero = [
            ("acquisition.period", self.acquisition.period),
            ("acquisition.poll_interval", self.acquisition.poll_interval),
            ("history.idle_wait", self.history.idle_wait),
            ("plot.long_period", self.plot.long_period),
            ("plot.short_period", self.plot.short_period),
        ];
        for (name, value) in nonzero {
            if value.is_zero() {
                return Err(DaqError::config(format!("{} must be greater than 0", name)));
            }
        }

        if self.history.length == 0 {
            return Err(DaqError::config("history.length must be at least 1"));
        }

        if self.history.columns == 0 {
            return Err(DaqError::config("history.columns must be at least 1"));
        }

        if self.log.filename_pattern.trim().is_empty() {
            return Err(DaqError::config("log.filename_pattern must not be empty"));
        }

        if self.log.headings.len() > self.history.columns + 1 {
            return Err(DaqError::config(format!(
                "{} headings given for {} columns plus time",
                self.log.headings.len(),
                self.history.columns
            )));
        }

        if self.acquisition.source == SourceKind::Random
            && self.acquisition.random_low > self.acquisition.random_high
        {
            return Err(DaqError::config(format!(
                "random_low {} exceeds random_high {}",
                self.acquisition.random_low, self.acquisition.random_high
            )));
        }

        if self.acquisition.source == SourceKind::Sine && self.acquisition.sine_period.is_zero() {
            return Err(DaqError::config("acquisition.sine_period must be greater than 0"));
        }

        if self.acquisition.reconnect.multiplier < 1.0 {
            return Err(DaqError::config(format!(
                "reconnect multiplier must be at least 1.0, got {}",
                self.acquisition.reconnect.multiplier
            )));
        }

        if self.plot.width == 0 || self.plot.height == 0 {
            return Err(DaqError::config("plot dimensions must be non-zero"));
        }

        Ok(())
    }
}

impl LogLevel {
    /// Convert to tracing filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Configuration builder for programmatic construction
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Load configuration from YAML string
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        self.config = serde_yaml::from_str(yaml)
            .map_err(|e| DaqError::config(format!("Failed to parse YAML config: {}", e)))?;
        Ok(self)
    }

    /// Set the acquisition period
    pub fn period(mut self, period: Duration) -> Self {
        self.config.acquisition.period = period;
        self
    }

    /// Set the built-in source
    pub fn source(mut self, source: SourceKind) -> Self {
        self.config.acquisition.source = source;
        self
    }

    /// Set the history length H
    pub fn history_length(mut self, length: usize) -> Self {
        self.config.history.length = length;
        self
    }

    /// Set the number of value columns
    pub fn columns(mut self, columns: usize) -> Self {
        self.config.history.columns = columns;
        self
    }

    /// Set the consumer idle wait
    pub fn idle_wait(mut self, wait: Duration) -> Self {
        self.config.history.idle_wait = wait;
        self
    }

    /// Set the log directory
    pub fn log_dir(mut self, path: PathBuf) -> Self {
        self.config.log.directory = path;
        self
    }

    /// Set the log file header
    pub fn headings<I, S>(mut self, headings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.log.headings = headings.into_iter().map(Into::into).collect();
        self
    }

    /// Set both chart refresh periods
    pub fn plot_period(mut self, period: Duration) -> Self {
        self.config.plot.long_period = period;
        self.config.plot.short_period = period;
        self
    }

    /// Set the HTTP port
    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    /// Enable or disable the HTTP front end
    pub fn server_enabled(mut self, enabled: bool) -> Self {
        self.config.server.enabled = enabled;
        self
    }

    /// Set the diagnostic log level
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.history.length, 256);
        assert_eq!(config.log.filename_pattern, "%Y%m%d-%H%M%S.txt");
    }

    #[test]
    fn test_zero_history_rejected() {
        let result = ConfigBuilder::new().history_length(0).build();
        assert!(matches!(result, Err(DaqError::Config(_))));
    }

    #[test]
    fn test_history_of_one_accepted() {
        assert!(ConfigBuilder::new().history_length(1).build().is_ok());
    }

    #[test]
    fn test_zero_period_rejected() {
        assert!(ConfigBuilder::new().period(Duration::ZERO).build().is_err());
        assert!(ConfigBuilder::new().idle_wait(Duration::ZERO).build().is_err());
    }

    #[test]
    fn test_too_many_headings_rejected() {
        let result = ConfigBuilder::new()
            .columns(1)
            .headings(["time", "temperature", "humidity"])
            .build();
        assert!(result.is_err());

        let ok = ConfigBuilder::new()
            .columns(1)
            .headings(["time", "temperature"])
            .build();
        assert!(ok.is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .period(Duration::from_millis(500))
            .history_length(64)
            .columns(3)
            .port(9000)
            .source(SourceKind::Sine)
            .log_level(LogLevel::Debug)
            .build()
            .unwrap();

        assert_eq!(config.acquisition.period, Duration::from_millis(500));
        assert_eq!(config.history.length, 64);
        assert_eq!(config.history.columns, 3);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.acquisition.source, SourceKind::Sine);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
acquisition:
  period: 250ms
  source: sine
  reconnect:
    max_attempts: 5
    initial_backoff: 50ms
history:
  length: 128
  columns: 2
log:
  directory: /var/lib/daqlog
  headings: [time, ain0, ain1]
  precision: 3
plot:
  long_period: 10s
server:
  port: 8081
"#;

        let config = ConfigBuilder::new().from_yaml(yaml).unwrap().build().unwrap();

        assert_eq!(config.acquisition.period, Duration::from_millis(250));
        assert_eq!(config.acquisition.source, SourceKind::Sine);
        assert_eq!(config.acquisition.reconnect.max_attempts, 5);
        assert_eq!(
            config.acquisition.reconnect.initial_backoff,
            Duration::from_millis(50)
        );
        assert_eq!(config.acquisition.reconnect.multiplier, 2.0);
        assert_eq!(config.history.length, 128);
        assert_eq!(config.history.columns, 2);
        assert_eq!(config.log.directory, PathBuf::from("/var/lib/daqlog"));
        assert_eq!(config.log.precision, 3);
        assert_eq!(config.plot.long_period, Duration::from_secs(10));
        assert_eq!(config.plot.short_period, Duration::from_secs(5));
        assert_eq!(config.server.port, 8081);
    }
}
