//! Configuration system tests.

use daqlog_lib::core::config::LogLevel;
use daqlog_lib::core::{Config, ConfigBuilder, SourceKind};
use std::time::Duration;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.acquisition.period, Duration::from_secs(1));
    assert_eq!(config.acquisition.poll_interval, Duration::from_millis(10));
    assert_eq!(config.acquisition.source, SourceKind::Random);
    assert_eq!(config.history.length, 256);
    assert_eq!(config.history.idle_wait, Duration::from_secs(1));
    assert_eq!(config.plot.long_period, Duration::from_secs(5));
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.logging.level, LogLevel::Info);
}

#[test]
fn test_config_builder() {
    let config = ConfigBuilder::new()
        .period(Duration::from_millis(100))
        .history_length(3)
        .columns(2)
        .headings(["time", "a", "b"])
        .port(8123)
        .log_level(LogLevel::Debug)
        .build()
        .unwrap();

    assert_eq!(config.acquisition.period, Duration::from_millis(100));
    assert_eq!(config.history.length, 3);
    assert_eq!(config.log.headings, vec!["time", "a", "b"]);
    assert_eq!(config.server.port, 8123);
    assert_eq!(config.logging.level, LogLevel::Debug);
}

#[test]
fn test_yaml_config() {
    let yaml = r#"
acquisition:
  period: 2s
  poll_interval: 5ms
  source: random
  random_low: -10
  random_high: 10
history:
  length: 512
  idle_wait: 250ms
log:
  filename_pattern: "run-%Y%m%d.txt"
  precision: 2
server:
  enabled: false
  bind_address: 127.0.0.1
logging:
  level: debug
"#;

    let config = ConfigBuilder::new()
        .from_yaml(yaml)
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(config.acquisition.period, Duration::from_secs(2));
    assert_eq!(config.acquisition.poll_interval, Duration::from_millis(5));
    assert_eq!(config.acquisition.random_low, -10);
    assert_eq!(config.history.length, 512);
    assert_eq!(config.history.idle_wait, Duration::from_millis(250));
    assert_eq!(config.log.filename_pattern, "run-%Y%m%d.txt");
    assert_eq!(config.log.precision, 2);
    assert!(!config.server.enabled);
    assert_eq!(config.server.bind_address.to_string(), "127.0.0.1");
    assert_eq!(config.logging.level, LogLevel::Debug);
}

#[test]
fn test_invalid_yaml_rejected() {
    assert!(ConfigBuilder::new().from_yaml("history: [1, 2").is_err());
    assert!(ConfigBuilder::new()
        .from_yaml("acquisition:\n  period: soon\n")
        .is_err());
}

#[test]
fn test_config_validation() {
    let mut config = Config::default();
    config.history.length = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.acquisition.random_low = 10;
    config.acquisition.random_high = 1;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.plot.width = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.acquisition.reconnect.multiplier = 0.5;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.log.filename_pattern = "  ".to_string();
    assert!(config.validate().is_err());
}
