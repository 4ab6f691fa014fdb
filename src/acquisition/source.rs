//! Data sources the acquirer samples from.
//!
//! Anything implementing [`SampleSource`] can feed the pipeline, including
//! plain closures. [`ReconnectingSource`] wraps a connection-oriented
//! [`Device`] with a bounded reconnect policy.

use crate::core::retry::{Backoff, RetryConfig};
use crate::core::{DaqError, Result};
use crate::worker::Shutdown;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::f64::consts::TAU;
use std::time::{Duration, Instant};

/// Produces one tuple of column values per call.
pub trait SampleSource: Send {
    /// Take one reading.
    fn sample(&mut self) -> Result<Vec<f64>>;

    /// Short name used in logs
    fn name(&self) -> &str {
        "source"
    }

    /// Hand the source its worker's cancellation signal before the first
    /// sample. Sources that sleep between attempts wake on it.
    fn attach(&mut self, _shutdown: &Shutdown) {}
}

impl<F> SampleSource for F
where
    F: FnMut() -> Result<Vec<f64>> + Send,
{
    fn sample(&mut self) -> Result<Vec<f64>> {
        self()
    }

    fn name(&self) -> &str {
        "closure"
    }
}

/// Adapt a closure returning a single value into a one-column source.
pub fn scalar<F>(mut read: F) -> impl SampleSource
where
    F: FnMut() -> Result<f64> + Send,
{
    move || read().map(|value| vec![value])
}

/// Uniformly distributed integer values in `low..=high`, one per column.
#[derive(Debug)]
pub struct RandomSource {
    rng: StdRng,
    low: i64,
    high: i64,
    columns: usize,
}

impl RandomSource {
    /// Create a source of `columns` values drawn from `low..=high`
    pub fn new(low: i64, high: i64, columns: usize) -> Result<Self> {
        if low > high {
            return Err(DaqError::config(format!(
                "random source bounds are inverted: {} > {}",
                low, high
            )));
        }
        Ok(Self {
            rng: StdRng::from_entropy(),
            low,
            high,
            columns: columns.max(1),
        })
    }

    /// Same as [`RandomSource::new`] with a fixed seed
    pub fn seeded(low: i64, high: i64, columns: usize, seed: u64) -> Result<Self> {
        let mut source = Self::new(low, high, columns)?;
        source.rng = StdRng::seed_from_u64(seed);
        Ok(source)
    }
}

impl SampleSource for RandomSource {
    fn sample(&mut self) -> Result<Vec<f64>> {
        Ok((0..self.columns)
            .map(|_| self.rng.gen_range(self.low..=self.high) as f64)
            .collect())
    }

    fn name(&self) -> &str {
        "random"
    }
}

/// Sine wave over wall-clock time; column `i` is phase shifted by `i/columns`
/// of a period.
#[derive(Debug)]
pub struct SineSource {
    started: Instant,
    period: Duration,
    amplitude: f64,
    columns: usize,
}

impl SineSource {
    /// Create a sine source
    pub fn new(period: Duration, amplitude: f64, columns: usize) -> Result<Self> {
        if period.is_zero() {
            return Err(DaqError::config("sine period must be greater than 0"));
        }
        Ok(Self {
            started: Instant::now(),
            period,
            amplitude,
            columns: columns.max(1),
        })
    }

    /// Values at `elapsed` since the source was created
    pub fn values_at(&self, elapsed: Duration) -> Vec<f64> {
        let cycles = elapsed.as_secs_f64() / self.period.as_secs_f64();
        (0..self.columns)
            .map(|i| {
                let phase = i as f64 / self.columns as f64;
                self.amplitude * (TAU * (cycles + phase)).sin()
            })
            .collect()
    }
}

impl SampleSource for SineSource {
    fn sample(&mut self) -> Result<Vec<f64>> {
        Ok(self.values_at(self.started.elapsed()))
    }

    fn name(&self) -> &str {
        "sine"
    }
}

/// A connection-oriented instrument.
pub trait Device: Send {
    /// (Re)establish the link
    fn connect(&mut self) -> Result<()>;

    /// Read one tuple of values over an established link
    fn read(&mut self) -> Result<Vec<f64>>;

    /// Short name used in logs
    fn name(&self) -> &str {
        "device"
    }
}

/// Presents an always-available [`SampleSource`] as a [`Device`], so the
/// configured sources run under the same reconnect policy as real
/// instruments. Connecting never fails; read errors come from the source.
pub struct SourceDevice {
    source: Box<dyn SampleSource>,
}

impl SourceDevice {
    /// Wrap `source`
    pub fn new(source: Box<dyn SampleSource>) -> Self {
        Self { source }
    }
}

impl Device for SourceDevice {
    fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    fn read(&mut self) -> Result<Vec<f64>> {
        self.source.sample()
    }

    fn name(&self) -> &str {
        self.source.name()
    }
}

/// Link state of a [`ReconnectingSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum LinkState {
    /// Reads go straight to the device
    Connected,
    /// Never connected, or the last read failed
    Disconnected,
    /// Reconnect attempt in progress
    Reconnecting {
        /// 1-based attempt number
        attempt: u32,
    },
}

/// Wraps a [`Device`], reconnecting with exponential backoff when a read
/// fails with a recoverable error. After `max_attempts` failed connects in a row the sample fails with
/// [`DaqError::Disconnected`]; a disabled policy still allows one attempt.
pub struct ReconnectingSource<D> {
    device: D,
    retry: RetryConfig,
    backoff: Backoff,
    state: LinkState,
    shutdown: Option<Shutdown>,
}

impl<D: Device> ReconnectingSource<D> {
    /// Wrap `device`. The first sample connects it.
    pub fn new(device: D, retry: RetryConfig) -> Self {
        Self {
            device,
            backoff: retry.backoff(),
            retry,
            state: LinkState::Disconnected,
            shutdown: None,
        }
    }

    /// Abort backoff sleeps when `shutdown` is triggered.
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Current link state
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// The wrapped device
    pub fn device(&self) -> &D {
        &self.device
    }

    fn pause(&self, delay: Duration) -> bool {
        match &self.shutdown {
            Some(shutdown) => shutdown.wait(delay),
            None => {
                std::thread::sleep(delay);
                false
            },
        }
    }

    /// Connect attempts allowed per outage
    fn attempt_limit(&self) -> u32 {
        self.retry.max_attempts.max(1)
    }

    /// One outage: connect with backoff until the device answers or the
    /// attempt limit is reached.
    fn reconnect(&mut self) -> Result<()> {
        self.backoff.reset();

        loop {
            let attempt = self.backoff.attempts() + 1;
            self.state = LinkState::Reconnecting { attempt };

            let reason = match self.device.connect() {
                Ok(()) => {
                    tracing::info!(device = self.device.name(), attempt, "device connected");
                    self.state = LinkState::Connected;
                    return Ok(());
                },
                Err(err) => err.to_string(),
            };
            tracing::warn!(device = self.device.name(), attempt, "connect failed: {}", reason);

            let delay = match self.backoff.next() {
                Some(delay) if attempt < self.attempt_limit() => delay,
                _ => {
                    self.state = LinkState::Disconnected;
                    return Err(DaqError::Disconnected {
                        attempts: attempt,
                        reason,
                    });
                },
            };
            if self.pause(delay) {
                self.state = LinkState::Disconnected;
                return Err(DaqError::Disconnected {
                    attempts: attempt,
                    reason: "stopped while reconnecting".to_string(),
                });
            }
        }
    }
}

impl<D: Device> SampleSource for ReconnectingSource<D> {
    fn sample(&mut self) -> Result<Vec<f64>> {
        if self.state != LinkState::Connected {
            self.reconnect()?;
        }

        match self.device.read() {
            Ok(values) => Ok(values),
            Err(err) if !err.is_recoverable() => Err(err),
            Err(err) => {
                tracing::warn!(device = self.device.name(), "read failed: {}", err);
                self.state = LinkState::Disconnected;
                self.reconnect()?;
                self.device.read().map_err(|err| {
                    self.state = LinkState::Disconnected;
                    err
                })
            },
        }
    }

    fn name(&self) -> &str {
        self.device.name()
    }

    fn attach(&mut self, shutdown: &Shutdown) {
        self.shutdown = Some(shutdown.clone());
    }
}
