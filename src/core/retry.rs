//! Backoff schedule for reconnecting to a data source.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of reconnect attempts before giving up
    pub max_attempts: u32,
    /// Delay before the first reconnect attempt
    #[serde(with = "humantime_serde")]
    pub initial_backoff: Duration,
    /// Upper bound for any single delay
    #[serde(with = "humantime_serde")]
    pub max_backoff: Duration,
    /// Backoff multiplier (e.g., 2.0 for exponential backoff)
    pub multiplier: f64,
    /// Add up to 10% random jitter to each delay
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// No reconnect attempts at all.
    pub fn disabled() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    /// Start a fresh backoff schedule
    pub fn backoff(&self) -> Backoff {
        Backoff {
            config: self.clone(),
            attempt: 0,
        }
    }
}

/// Stateful exponential backoff. Yields one delay per attempt until
/// `max_attempts` is reached.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: RetryConfig,
    attempt: u32,
}

impl Backoff {
    /// Attempts handed out so far
    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    /// True once every allowed attempt has been used
    pub fn exhausted(&self) -> bool {
        self.attempt >= self.config.max_attempts
    }

    /// Forget previous attempts, e.g. after a successful reconnect
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Delay before attempt number `attempt` (1-based), without jitter.
    pub fn delay_for(config: &RetryConfig, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = config.multiplier.powi(i32::try_from(exponent).unwrap_or(i32::MAX));
        let secs = config.initial_backoff.as_secs_f64() * factor;
        if !secs.is_finite() || secs >= config.max_backoff.as_secs_f64() {
            config.max_backoff
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.exhausted() {
            return None;
        }
        self.attempt += 1;
        let delay = Self::delay_for(&self.config, self.attempt);
        if self.config.jitter {
            let jitter = rand::random::<f64>() * delay.as_secs_f64() * 0.1;
            Some(delay.saturating_add(Duration::from_secs_f64(jitter)))
        } else {
            Some(delay)
        }
    }
}
