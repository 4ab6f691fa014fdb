//! Command-line interface for daqlog.
//!
//! Just run `daqlog` to log a demo source once per second, with charts
//! served on port 8000.

use crate::acquisition;
use crate::api;
use crate::application::Pipeline;
use crate::core::config::{ConfigBuilder, LogLevel};
use crate::core::{Config, DaqError, Result, SourceKind};
use crate::plot::svg_factory;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Periodic data logger with decimated history and live charts
#[derive(Parser, Debug)]
#[command(name = "daqlog")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (default: ~/.config/daqlog/config.yaml)
    #[arg(short, long, env = "DAQLOG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Acquisition period, e.g. "1s" or "250ms"
    #[arg(short, long, env = "DAQLOG_PERIOD", value_parser = parse_duration)]
    pub period: Option<Duration>,

    /// Points kept in each history view
    #[arg(long, env = "DAQLOG_HISTORY")]
    pub history: Option<usize>,

    /// Directory for the raw log file
    #[arg(long, env = "DAQLOG_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// HTTP port for the chart server
    #[arg(long, env = "DAQLOG_PORT")]
    pub port: Option<u16>,

    /// Run without the HTTP front end
    #[arg(long, env = "DAQLOG_NO_SERVER")]
    pub no_server: bool,

    /// Built-in data source
    #[arg(long, env = "DAQLOG_SOURCE", value_enum)]
    pub source: Option<SourceArg>,

    /// Enable debug logging
    #[arg(short, long, env = "DAQLOG_DEBUG")]
    pub debug: bool,

    /// Validate configuration and exit
    #[arg(long)]
    pub check_config: bool,
}

/// Parse a human readable duration such as "1s" or "250ms".
fn parse_duration(text: &str) -> std::result::Result<Duration, String> {
    use serde::de::value::{Error, StrDeserializer};
    use serde::de::IntoDeserializer;

    let deserializer: StrDeserializer<'_, Error> = text.into_deserializer();
    humantime_serde::deserialize(deserializer).map_err(|e| e.to_string())
}

/// Built-in data sources selectable on the command line
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceArg {
    /// Uniform random integers
    Random,
    /// Sine wave
    Sine,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Random => SourceKind::Random,
            SourceArg::Sine => SourceKind::Sine,
        }
    }
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Load configuration with proper precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables
    /// 3. Config file
    /// 4. Defaults (lowest priority)
    pub fn load_config(&self) -> Result<Config> {
        let mut builder = ConfigBuilder::new();

        let config_path = if let Some(path) = &self.config {
            path.clone()
        } else {
            let default_path = dirs::config_dir()
                .map(|d| d.join("daqlog").join("config.yaml"))
                .unwrap_or_else(|| PathBuf::from("~/.config/daqlog/config.yaml"));

            if default_path.exists() {
                default_path
            } else {
                return self.build_config_from_args(builder);
            }
        };

        match std::fs::read_to_string(&config_path) {
            Ok(content) => {
                builder = builder.from_yaml(&content)?;
                tracing::info!("Loaded configuration from: {:?}", config_path);
            },
            Err(e) if self.config.is_some() => {
                return Err(DaqError::config(format!(
                    "Failed to read config file {:?}: {}",
                    config_path, e
                )));
            },
            Err(_) => {
                tracing::debug!("No config file found at {:?}, using defaults", config_path);
            },
        }

        self.build_config_from_args(builder)
    }

    fn build_config_from_args(&self, mut builder: ConfigBuilder) -> Result<Config> {
        // Flags backed by an env var arrive here already resolved by clap.
        if let Some(period) = self.period {
            builder = builder.period(period);
        }
        if let Some(length) = self.history {
            builder = builder.history_length(length);
        }
        if let Some(dir) = &self.log_dir {
            builder = builder.log_dir(dir.clone());
        }
        if let Some(port) = self.port {
            builder = builder.port(port);
        }
        if let Some(source) = self.source {
            builder = builder.source(source.into());
        }
        if self.no_server {
            builder = builder.server_enabled(false);
        }
        if self.debug {
            builder = builder.log_level(LogLevel::Debug);
        }

        builder.build()
    }

    /// Initialize logging. `--debug` wins over `DAQLOG_LOG_LEVEL`, which wins
    /// over the configured level; `RUST_LOG` replaces all of them.
    pub fn init_logging(&self, configured: LogLevel) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let env_log_level = std::env::var("DAQLOG_LOG_LEVEL")
            .unwrap_or_else(|_| configured.as_str().to_string());
        let log_level = if self.debug {
            "debug"
        } else {
            env_log_level.as_str()
        };

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(self.debug)
            .with_thread_names(true)
            .compact();

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| DaqError::config(format!("Failed to initialize logging: {}", e)))?;

        Ok(())
    }
}

/// Execute the daqlog application.
pub async fn execute(cli: Cli) -> Result<()> {
    let config = cli.load_config()?;

    cli.init_logging(config.logging.level)?;
    tracing::debug!(?config, "configuration loaded");

    if cli.check_config {
        println!("Configuration is valid!");
        println!("  Period: {:?}", config.acquisition.period);
        println!("  Source: {:?}", config.acquisition.source);
        println!("  History length: {}", config.history.length);
        println!("  Columns: {}", config.history.columns);
        println!("  Log directory: {}", config.log.directory.display());
        if config.server.enabled {
            println!("  HTTP: {}:{}", config.server.bind_address, config.server.port);
        } else {
            println!("  HTTP: disabled");
        }
        return Ok(());
    }

    run(config).await
}

async fn run(config: Config) -> Result<()> {
    let source = acquisition::from_config(&config.acquisition, config.history.columns)?;
    let renderers = svg_factory(config.plot.width, config.plot.height);
    let pipeline = Arc::new(Pipeline::new(config.clone(), source, renderers)?);

    pipeline.start()?;

    let outcome = if config.server.enabled {
        api::serve(Arc::clone(&pipeline), &config.server, shutdown_signal()).await
    } else {
        tracing::info!("HTTP front end disabled");
        shutdown_signal().await;
        Ok(())
    };

    let pipeline_for_stop = Arc::clone(&pipeline);
    let states = tokio::task::spawn_blocking(move || pipeline_for_stop.stop())
        .await
        .map_err(|e| DaqError::network(format!("Failed to join shutdown task: {}", e)))?;

    for status in &states {
        tracing::info!(worker = %status.name, state = ?status.state, "final worker state");
    }
    if let Some(path) = pipeline.log_path() {
        tracing::info!(path = %path.display(), processed = pipeline.store().processed(), "log closed");
    }

    outcome
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received shutdown signal, stopping..."),
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["daqlog"]).unwrap();
        assert!(cli.config.is_none());
        assert!(!cli.debug);
        assert!(!cli.no_server);
        assert!(cli.source.is_none());
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "acquisition:\n  period: 5s\nhistory:\n  length: 32\nserver:\n  port: 9100\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "daqlog",
            "--config",
            path.to_str().unwrap(),
            "--period",
            "250ms",
            "--source",
            "sine",
            "--no-server",
        ])
        .unwrap();
        let config = cli.load_config().unwrap();

        assert_eq!(config.acquisition.period, Duration::from_millis(250));
        assert_eq!(config.acquisition.source, SourceKind::Sine);
        assert_eq!(config.history.length, 32);
        assert_eq!(config.server.port, 9100);
        assert!(!config.server.enabled);
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let cli = Cli::try_parse_from(["daqlog", "--config", "/nonexistent/daqlog.yaml"]).unwrap();
        assert!(matches!(cli.load_config(), Err(DaqError::Config(_))));
    }

    #[test]
    fn test_debug_flag_sets_log_level() {
        let cli = Cli::try_parse_from(["daqlog", "--debug"]).unwrap();
        let config = cli.load_config().unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_invalid_history_rejected() {
        let cli = Cli::try_parse_from(["daqlog", "--history", "0"]).unwrap();
        assert!(cli.load_config().is_err());
    }
}
