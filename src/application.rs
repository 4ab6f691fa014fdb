//! Pipeline wiring: acquirer, history consumer and the two plotters.

use crate::acquisition::{Acquirer, LastReading, SampleSource};
use crate::core::{Clock, Config, HistorySnapshot, Result, SystemClock};
use crate::history::{HistoryStore, LongStats};
use crate::plot::{PlotSnapshot, Plotter, RendererFactory};
use crate::worker::{WorkerHandle, WorkerState};
use parking_lot::Mutex;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// History consumer worker name
pub const CONSUMER: &str = "history";
/// Acquirer worker name
pub const ACQUIRER: &str = "acquirer";
/// Long-history plotter worker name
pub const LONG_PLOT: &str = "plot-long";
/// Short-history plotter worker name
pub const SHORT_PLOT: &str = "plot-short";

/// Name and state of one worker, as reported to the front end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerStatus {
    /// Worker name
    pub name: String,
    /// Current state
    #[serde(flatten)]
    pub state: WorkerState,
}

/// Parts that are moved onto worker threads by [`Pipeline::start`].
struct Pending {
    acquirer: Acquirer,
    long_plot: Plotter,
    short_plot: Plotter,
}

/// Shared context owning every stage of the logger.
///
/// Built once from the configuration; the front end only ever reads through
/// the accessors, which hand out copies or cheap handles.
pub struct Pipeline {
    config: Config,
    store: Arc<HistoryStore>,
    last: LastReading,
    long_plot: PlotSnapshot,
    short_plot: PlotSnapshot,
    pending: Mutex<Option<Pending>>,
    workers: Mutex<Vec<WorkerHandle>>,
    finished: Mutex<Vec<WorkerStatus>>,
}

impl Pipeline {
    /// Build the pipeline around `source`, drawing with renderers from
    /// `renderers`. Uses the system clock.
    pub fn new(
        config: Config,
        source: Box<dyn SampleSource>,
        renderers: RendererFactory,
    ) -> Result<Self> {
        Self::with_clock(config, source, renderers, Arc::new(SystemClock))
    }

    /// Same as [`Pipeline::new`] with an explicit clock.
    pub fn with_clock(
        config: Config,
        source: Box<dyn SampleSource>,
        renderers: RendererFactory,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(HistoryStore::new(&config.history, &config.log)?);

        let acquirer = Acquirer::new(config.acquisition.period, source, clock)
            .with_poll_interval(config.acquisition.poll_interval);
        let last = acquirer.last_reading();

        let long_plot = {
            let store = Arc::clone(&store);
            Plotter::new(
                "Long history",
                config.plot.long_period,
                Box::new(move || store.long_history()),
                renderers(),
            )
        };
        let short_plot = {
            let store = Arc::clone(&store);
            Plotter::new(
                "Short history",
                config.plot.short_period,
                Box::new(move || store.short_history()),
                renderers(),
            )
        };

        Ok(Self {
            long_plot: long_plot.snapshot_handle(),
            short_plot: short_plot.snapshot_handle(),
            pending: Mutex::new(Some(Pending {
                acquirer,
                long_plot,
                short_plot,
            })),
            config,
            store,
            last,
            workers: Mutex::new(Vec::new()),
            finished: Mutex::new(Vec::new()),
        })
    }

    /// Spawn the workers: consumer, then acquirer, then both plotters.
    ///
    /// The log file is created before any worker starts, so a bad log
    /// directory fails here. A pipeline can be started once; later calls are
    /// no-ops.
    pub fn start(&self) -> Result<()> {
        let mut pending = self.pending.lock();
        if pending.is_none() {
            tracing::warn!("pipeline already started");
            return Ok(());
        }

        let log = self.store.prepare()?;
        let Some(Pending {
            acquirer,
            long_plot,
            short_plot,
        }) = pending.take()
        else {
            return Ok(());
        };
        drop(pending);

        let mut workers = self.workers.lock();

        let store = Arc::clone(&self.store);
        workers.push(WorkerHandle::spawn(CONSUMER, move |shutdown| store.consume(log, &shutdown))?);

        let queue = self.store.queue();
        workers.push(WorkerHandle::spawn(ACQUIRER, move |shutdown| {
            acquirer.run(&shutdown, |sample| queue.push(sample))
        })?);

        workers.push(WorkerHandle::spawn(LONG_PLOT, move |shutdown| long_plot.run(&shutdown))?);
        workers.push(WorkerHandle::spawn(SHORT_PLOT, move |shutdown| short_plot.run(&shutdown))?);

        tracing::info!(
            period = ?self.config.acquisition.period,
            history = self.config.history.length,
            columns = self.config.history.columns,
            "pipeline started"
        );
        Ok(())
    }

    /// Stop and join every worker, newest first, and return their final states
    /// in start order.
    ///
    /// Each worker is joined before the next is signalled, so the acquirer is
    /// gone before the consumer drains the queue and nothing it took is lost.
    pub fn stop(&self) -> Vec<WorkerStatus> {
        let handles: Vec<WorkerHandle> = self.workers.lock().drain(..).collect();

        let mut statuses: Vec<WorkerStatus> = handles
            .into_iter()
            .rev()
            .map(|handle| {
                let name = handle.name().to_string();
                let state = handle.stop_and_join();
                WorkerStatus { name, state }
            })
            .collect();
        statuses.reverse();

        tracing::info!(processed = self.store.processed(), "pipeline stopped");
        self.finished.lock().extend(statuses.iter().cloned());
        statuses
    }

    /// Current state of every worker, in start order
    pub fn worker_states(&self) -> Vec<WorkerStatus> {
        let workers = self.workers.lock();
        if workers.is_empty() {
            return self.finished.lock().clone();
        }
        workers
            .iter()
            .map(|handle| WorkerStatus {
                name: handle.name().to_string(),
                state: handle.state(),
            })
            .collect()
    }

    /// Snapshot of the decimated long history
    pub fn long_history(&self) -> HistorySnapshot {
        self.store.long_history()
    }

    /// Snapshot of the raw short history
    pub fn short_history(&self) -> HistorySnapshot {
        self.store.short_history()
    }

    /// Long history decimation state
    pub fn long_stats(&self) -> LongStats {
        self.store.long_stats()
    }

    /// Latest long-history chart
    pub fn long_plot(&self) -> &PlotSnapshot {
        &self.long_plot
    }

    /// Latest short-history chart
    pub fn short_plot(&self) -> &PlotSnapshot {
        &self.short_plot
    }

    /// Most recent reading
    pub fn last_reading(&self) -> &LastReading {
        &self.last
    }

    /// The history store
    pub fn store(&self) -> &Arc<HistoryStore> {
        &self.store
    }

    /// Log file of the current run
    pub fn log_path(&self) -> Option<PathBuf> {
        self.store.log_path()
    }

    /// The configuration the pipeline was built from
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if !self.workers.lock().is_empty() {
            self.stop();
        }
    }
}
