//! History store: drains the sample queue into the raw log and both views.

use crate::core::config::{HistoryConfig, LogFileConfig};
use crate::core::{ArityAdjustment, HistorySnapshot, Result, Sample};
use crate::history::decimate::LongHistory;
use crate::history::logfile::LogFile;
use crate::history::queue::SampleQueue;
use crate::history::short::ShortHistory;
use crate::worker::Shutdown;
use parking_lot::Mutex;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Decimation state of the long history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LongStats {
    /// Buckets per column
    pub buckets: usize,
    /// Rows per full bucket
    pub denom: u64,
    /// Rows in the newest bucket
    pub count: u64,
}

struct Views {
    long: LongHistory,
    short: ShortHistory,
}

impl Views {
    fn new(capacity: usize, columns: usize) -> Result<Self> {
        Ok(Self {
            long: LongHistory::new(capacity, columns)?,
            short: ShortHistory::new(capacity, columns)?,
        })
    }
}

/// Owner of the sample queue, the raw log and the short and long histories.
///
/// Shared between threads behind an `Arc`: producers call [`enqueue`],
/// the consumer thread runs [`run`], readers take snapshots.
///
/// [`enqueue`]: HistoryStore::enqueue
/// [`run`]: HistoryStore::run
pub struct HistoryStore {
    queue: SampleQueue,
    views: Mutex<Views>,
    capacity: usize,
    columns: usize,
    idle_wait: Duration,
    log_config: LogFileConfig,
    log_path: Mutex<Option<PathBuf>>,
    processed: AtomicU64,
    adjusted: AtomicU64,
}

impl HistoryStore {
    /// Create a store for `history.columns` value columns. The time column is
    /// tracked in addition to those.
    pub fn new(history: &HistoryConfig, log: &LogFileConfig) -> Result<Self> {
        let row_width = history.columns + 1;
        Ok(Self {
            queue: SampleQueue::new(),
            views: Mutex::new(Views::new(history.length, row_width)?),
            capacity: history.length,
            columns: history.columns,
            idle_wait: history.idle_wait,
            log_config: log.clone(),
            log_path: Mutex::new(None),
            processed: AtomicU64::new(0),
            adjusted: AtomicU64::new(0),
        })
    }

    /// Queue a sample for the consumer. Never blocks beyond the queue lock.
    pub fn enqueue(&self, sample: Sample) {
        self.queue.push(sample);
    }

    /// Producer handle onto the queue
    pub fn queue(&self) -> SampleQueue {
        self.queue.clone()
    }

    /// Snapshot of the decimated long history
    pub fn long_history(&self) -> HistorySnapshot {
        let views = self.views.lock();
        HistorySnapshot::from_time_major(views.long.columns().to_vec())
    }

    /// Snapshot of the raw short history
    pub fn short_history(&self) -> HistorySnapshot {
        let views = self.views.lock();
        HistorySnapshot::from_time_major(views.short.to_vecs())
    }

    /// Decimation state of the long history
    pub fn long_stats(&self) -> LongStats {
        let views = self.views.lock();
        LongStats {
            buckets: views.long.len(),
            denom: views.long.denom(),
            count: views.long.count(),
        }
    }

    /// Samples consumed since the store was created
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Samples whose arity had to be truncated or padded
    pub fn adjusted(&self) -> u64 {
        self.adjusted.load(Ordering::Relaxed)
    }

    /// Path of the current run's log file, once the consumer has started
    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_path.lock().clone()
    }

    /// Open the log for a new run: create the file and reset both views.
    pub fn open_log(&self) -> Result<LogFile> {
        let log = LogFile::create(
            &self.log_config.directory,
            &self.log_config.filename_pattern,
            &self.log_config.headings,
            self.log_config.precision,
        )?;
        *self.views.lock() = Views::new(self.capacity, self.columns + 1)?;
        *self.log_path.lock() = Some(log.path().to_path_buf());
        Ok(log)
    }

    /// Consume one sample: conform its arity, log it, fold it into both views.
    pub fn process(&self, log: &mut LogFile, mut sample: Sample) -> Result<()> {
        match sample.conform(self.columns) {
            ArityAdjustment::Exact => {},
            adjustment => {
                self.adjusted.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(?adjustment, columns = self.columns, "conformed sample arity");
            },
        }

        log.append(&sample)?;

        let row = sample.row();
        {
            let mut views = self.views.lock();
            views.short.push(&row)?;
            if let Some(compaction) = views.long.push(&row)? {
                tracing::debug!(
                    denom = compaction.denom,
                    buckets = compaction.buckets,
                    "long history compacted"
                );
            }
        }

        self.processed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Start a run: discard samples queued before it and open the log.
    pub fn prepare(&self) -> Result<LogFile> {
        let stale = self.queue.clear();
        if stale > 0 {
            tracing::info!(discarded = stale, "cleared stale samples from queue");
        }
        self.open_log()
    }

    /// Consumer loop over a prepared log. Returns `Ok` after a stop request,
    /// or the first log write error, which ends the loop.
    ///
    /// Samples already queued when the stop request arrives are still logged
    /// before returning.
    pub fn consume(&self, mut log: LogFile, shutdown: &Shutdown) -> Result<()> {
        while !shutdown.is_triggered() {
            match self.queue.pop() {
                Some(sample) => self.process(&mut log, sample)?,
                None => {
                    if shutdown.wait(self.idle_wait) {
                        break;
                    }
                },
            }
        }

        let pending = self.queue.len();
        for sample in std::iter::from_fn(|| self.queue.pop()).take(pending) {
            self.process(&mut log, sample)?;
        }

        tracing::info!(
            records = log.records(),
            drained = pending,
            "history consumer exiting"
        );
        Ok(())
    }

    /// [`prepare`](HistoryStore::prepare) then [`consume`](HistoryStore::consume).
    pub fn run(&self, shutdown: &Shutdown) -> Result<()> {
        let log = self.prepare()?;
        self.consume(log, shutdown)
    }
}
