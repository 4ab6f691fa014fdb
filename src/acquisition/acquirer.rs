//! Periodic sampler.
//!
//! The acquirer polls a clock at a fine interval and takes a reading whenever
//! at least one period has elapsed since the previous one. The next deadline
//! is measured from the actual firing time, so jitter is not compensated and
//! the effective rate is at most one sample per period.

use crate::acquisition::source::SampleSource;
use crate::core::{Clock, Result, Sample, Timestamp};
use crate::worker::Shutdown;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Default interval between clock checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Shared view of the most recent reading.
#[derive(Debug, Clone, Default)]
pub struct LastReading {
    inner: Arc<Mutex<Option<Sample>>>,
}

impl LastReading {
    /// Most recent sample, if any has been taken
    pub fn get(&self) -> Option<Sample> {
        self.inner.lock().clone()
    }

    fn set(&self, sample: Sample) {
        *self.inner.lock() = Some(sample);
    }
}

/// Takes a reading from its source once per period.
pub struct Acquirer {
    period: Duration,
    poll_interval: Duration,
    source: Box<dyn SampleSource>,
    clock: Arc<dyn Clock>,
    last_fire: Option<Timestamp>,
    last: LastReading,
    taken: u64,
}

impl Acquirer {
    /// Create an acquirer that samples `source` every `period` of `clock` time.
    pub fn new(period: Duration, source: Box<dyn SampleSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            period,
            poll_interval: DEFAULT_POLL_INTERVAL,
            source,
            clock,
            last_fire: None,
            last: LastReading::default(),
            taken: 0,
        }
    }

    /// Override how often the clock is checked.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Handle onto the most recent reading
    pub fn last_reading(&self) -> LastReading {
        self.last.clone()
    }

    /// Readings taken so far
    pub fn taken(&self) -> u64 {
        self.taken
    }

    /// Take a reading if one is due at `now`.
    ///
    /// The first call always fires. Later calls fire once `now` reaches the
    /// previous firing time plus one period. A source error is returned as is.
    pub fn poll(&mut self, now: Timestamp) -> Result<Option<Sample>> {
        let due = match self.last_fire {
            None => true,
            Some(last) => now >= last + self.period.as_secs_f64(),
        };
        if !due {
            return Ok(None);
        }

        let values = self.source.sample()?;
        self.last_fire = Some(now);
        let sample = Sample::new(now, values)?;
        self.last.set(sample.clone());
        self.taken += 1;
        tracing::trace!(source = self.source.name(), %sample, "sample taken");
        Ok(Some(sample))
    }

    /// Poll until `shutdown` is triggered, handing every reading to
    /// `on_sample`. Returns the first source error.
    pub fn run<F>(mut self, shutdown: &Shutdown, mut on_sample: F) -> Result<()>
    where
        F: FnMut(Sample),
    {
        self.source.attach(shutdown);
        tracing::info!(
            source = self.source.name(),
            period = ?self.period,
            "acquisition started"
        );

        while !shutdown.is_triggered() {
            let now = self.clock.now();
            if let Some(sample) = self.poll(now)? {
                on_sample(sample);
            }
            if shutdown.wait(self.poll_interval) {
                break;
            }
        }

        tracing::info!(taken = self.taken, "acquisition stopped");
        Ok(())
    }
}
