//! Common test utilities and fixtures.

#![allow(dead_code)]

use daqlog_lib::acquisition::SampleSource;
use daqlog_lib::core::{Config, ConfigBuilder, DaqError, Result};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Config tuned for fast tests: short periods, log files under `dir`.
pub fn fast_config(dir: &Path) -> ConfigBuilder {
    ConfigBuilder::new()
        .period(Duration::from_millis(10))
        .idle_wait(Duration::from_millis(20))
        .plot_period(Duration::from_millis(50))
        .history_length(16)
        .log_dir(dir.to_path_buf())
        .server_enabled(false)
}

/// Build a fast config or panic.
pub fn config_in(dir: &Path) -> Config {
    fast_config(dir).build().unwrap()
}

/// Poll `condition` every few milliseconds until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// Source returning 1, 2, 3, ... and counting its calls.
pub struct CountingSource {
    calls: Arc<AtomicU64>,
}

impl CountingSource {
    pub fn new() -> (Self, Arc<AtomicU64>) {
        let calls = Arc::new(AtomicU64::new(0));
        (
            Self {
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

impl SampleSource for CountingSource {
    fn sample(&mut self) -> Result<Vec<f64>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(vec![n as f64])
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Source that succeeds `good` times and then fails forever.
pub struct FailingAfter {
    good: u32,
}

impl FailingAfter {
    pub fn new(good: u32) -> Self {
        Self { good }
    }
}

impl SampleSource for FailingAfter {
    fn sample(&mut self) -> Result<Vec<f64>> {
        if self.good == 0 {
            return Err(DaqError::sample("instrument unplugged"));
        }
        self.good -= 1;
        Ok(vec![1.0])
    }
}

/// Lines of a log file, header included.
pub fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}
