//! Error types for daqlog.

use std::path::PathBuf;
use thiserror::Error;

/// Every failure the pipeline can report.
#[derive(Error, Debug)]
pub enum DaqError {
    /// The sampling collaborator failed to produce a reading.
    #[error("Sample error: {0}")]
    Sample(String),

    /// The data source is not connected and could not be reconnected.
    #[error("Source disconnected after {attempts} reconnect attempts: {reason}")]
    Disconnected {
        /// Connect attempts made before giving up
        attempts: u32,
        /// Last failure reported by the device
        reason: String,
    },

    /// Appending a record to the raw log file failed.
    #[error("Log write error on {}: {source}", .path.display())]
    LogWrite {
        /// Log file being written
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The chart renderer failed.
    #[error("Render error: {0}")]
    Render(String),

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A reading that cannot become a sample.
    #[error("Invalid sample: {0}")]
    InvalidSample(String),

    /// I/O outside the raw log.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP front end or device link failure.
    #[error("Network error: {0}")]
    Network(String),

    /// A worker thread panicked.
    #[error("Worker '{name}' panicked: {message}")]
    WorkerPanicked {
        /// Worker name
        name: String,
        /// Panic payload
        message: String,
    },
}

/// Result type alias for daqlog operations
pub type Result<T> = std::result::Result<T, DaqError>;

impl DaqError {
    /// Creates a new sample error
    pub fn sample<S: Into<String>>(msg: S) -> Self {
        Self::Sample(msg.into())
    }

    /// Creates a new render error
    pub fn render<S: Into<String>>(msg: S) -> Self {
        Self::Render(msg.into())
    }

    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Wraps an I/O failure on the raw log file
    pub fn log_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LogWrite {
            path: path.into(),
            source,
        }
    }

    /// Returns true if a reconnecting source should try again after this error
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Sample(_) | Self::Network(_) => true,
            Self::Io(err) => !matches!(
                err.kind(),
                std::io::ErrorKind::PermissionDenied | std::io::ErrorKind::InvalidInput
            ),
            _ => false,
        }
    }

    /// Returns the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Sample(_) | Self::Disconnected { .. } => "sample",
            Self::LogWrite { .. } => "log_write",
            Self::Render(_) => "render",
            Self::Config(_) => "config",
            Self::InvalidSample(_) => "validation",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Network(_) => "network",
            Self::WorkerPanicked { .. } => "worker",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = DaqError::sample("device timed out");
        assert_eq!(err.to_string(), "Sample error: device timed out");
        assert_eq!(err.category(), "sample");
    }

    #[test]
    fn test_log_write_error_names_path() {
        let err = DaqError::log_write(
            "/tmp/run.txt",
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        );
        assert_eq!(err.to_string(), "Log write error on /tmp/run.txt: disk full");
        assert_eq!(err.category(), "log_write");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_error_recoverability() {
        assert!(DaqError::sample("glitch").is_recoverable());
        assert!(DaqError::network("usb reset").is_recoverable());
        assert!(!DaqError::render("bad frame").is_recoverable());
        assert!(!DaqError::Disconnected {
            attempts: 3,
            reason: "gone".into()
        }
        .is_recoverable());
    }
}
