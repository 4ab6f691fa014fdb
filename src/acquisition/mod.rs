//! Sampling: data sources and the periodic acquirer that drives them.

pub mod acquirer;
pub mod source;

pub use acquirer::{Acquirer, LastReading, DEFAULT_POLL_INTERVAL};
pub use source::{
    scalar, Device, LinkState, RandomSource, ReconnectingSource, SampleSource, SineSource,
    SourceDevice,
};

use crate::core::config::{AcquisitionConfig, SourceKind};
use crate::core::Result;

/// Build the configured source for `columns` value columns, wrapped in the
/// configured reconnect policy.
pub fn from_config(config: &AcquisitionConfig, columns: usize) -> Result<Box<dyn SampleSource>> {
    let source: Box<dyn SampleSource> = match config.source {
        SourceKind::Random => Box::new(RandomSource::new(
            config.random_low,
            config.random_high,
            columns,
        )?),
        SourceKind::Sine => Box::new(SineSource::new(
            config.sine_period,
            config.sine_amplitude,
            columns,
        )?),
    };
    Ok(Box::new(ReconnectingSource::new(
        SourceDevice::new(source),
        config.reconnect.clone(),
    )))
}
