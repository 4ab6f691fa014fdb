//! Core domain types, configuration and error handling for daqlog.
//!
//! Everything in here is shared by the acquisition, history and plot
//! pipelines.

#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod error;
pub mod retry;
pub mod types;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, ConfigBuilder, SourceKind};
pub use error::{DaqError, Result};
pub use retry::{Backoff, RetryConfig};
pub use types::{ArityAdjustment, HistorySnapshot, Sample, Timestamp};
