//! Worker threads with cooperative cancellation and observable terminal state.
//!
//! Every periodic worker (acquirer, history consumer, plotters) runs on its
//! own named OS thread and suspends only through [`Shutdown::wait`], so a stop
//! request wakes it immediately instead of at its next poll.

use crate::core::{DaqError, Result};
use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Cancellation signal shared between a worker and its owner.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    inner: Arc<ShutdownInner>,
}

#[derive(Debug, Default)]
struct ShutdownInner {
    triggered: Mutex<bool>,
    cvar: Condvar,
}

impl Shutdown {
    /// Create an untriggered signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation and wake every waiter.
    pub fn trigger(&self) {
        let mut triggered = self.inner.triggered.lock();
        *triggered = true;
        self.inner.cvar.notify_all();
    }

    /// Whether cancellation has been requested.
    pub fn is_triggered(&self) -> bool {
        *self.inner.triggered.lock()
    }

    /// Sleep for up to `timeout`. Returns `true` if cancellation was requested,
    /// in which case it returns as soon as the request arrives.
    ///
    /// A timeout too large to express as an [`Instant`] waits for the trigger
    /// alone.
    pub fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut triggered = self.inner.triggered.lock();
        while !*triggered {
            match deadline {
                Some(deadline) => {
                    if self.inner.cvar.wait_until(&mut triggered, deadline).timed_out() {
                        break;
                    }
                },
                None => self.inner.cvar.wait(&mut triggered),
            }
        }
        *triggered
    }
}

/// Lifecycle state of a worker thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum WorkerState {
    /// Thread is alive
    Running,
    /// Thread returned normally after a stop request
    Stopped,
    /// Thread terminated on an error; it will not be restarted
    Failed {
        /// Error category, e.g. `sample`, `log_write`, `render`
        category: String,
        /// Human readable cause
        cause: String,
    },
}

impl WorkerState {
    /// True for `Stopped` and `Failed`
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkerState::Running)
    }

    /// True for `Failed`
    pub fn is_failed(&self) -> bool {
        matches!(self, WorkerState::Failed { .. })
    }

    fn from_error(err: &DaqError) -> Self {
        WorkerState::Failed {
            category: err.category().to_string(),
            cause: err.to_string(),
        }
    }
}

/// Owner side of a spawned worker.
#[derive(Debug)]
pub struct WorkerHandle {
    name: String,
    shutdown: Shutdown,
    state: Arc<Mutex<WorkerState>>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Spawn `body` on a named thread. The body receives the worker's
    /// cancellation signal; its return value decides the terminal state.
    pub fn spawn<F>(name: impl Into<String>, body: F) -> Result<Self>
    where
        F: FnOnce(Shutdown) -> Result<()> + Send + 'static,
    {
        let name = name.into();
        let shutdown = Shutdown::new();
        let state = Arc::new(Mutex::new(WorkerState::Running));

        let thread = {
            let name = name.clone();
            let shutdown = shutdown.clone();
            let state = Arc::clone(&state);
            std::thread::Builder::new().name(name.clone()).spawn(move || {
                tracing::debug!(worker = %name, "worker started");
                let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| body(shutdown)));
                let terminal = match outcome {
                    Ok(Ok(())) => {
                        tracing::info!(worker = %name, "worker stopped");
                        WorkerState::Stopped
                    },
                    Ok(Err(err)) => {
                        tracing::error!(
                            worker = %name,
                            category = err.category(),
                            "worker terminated: {}",
                            err
                        );
                        WorkerState::from_error(&err)
                    },
                    Err(payload) => {
                        let err = DaqError::WorkerPanicked {
                            name: name.clone(),
                            message: panic_message(payload.as_ref()),
                        };
                        tracing::error!(worker = %name, "{}", err);
                        WorkerState::from_error(&err)
                    },
                };
                *state.lock() = terminal;
            })?
        };

        Ok(Self {
            name,
            shutdown,
            state,
            thread: Some(thread),
        })
    }

    /// Worker name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state; becomes terminal as soon as the thread body returns.
    pub fn state(&self) -> WorkerState {
        self.state.lock().clone()
    }

    /// Request cancellation without waiting.
    pub fn stop(&self) {
        self.shutdown.trigger();
    }

    /// Whether the thread has exited
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the thread to exit and return its terminal state.
    pub fn join(mut self) -> WorkerState {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                // The body's panic is caught inside the thread, so this only
                // fires if recording the state itself panicked.
                *self.state.lock() = WorkerState::Failed {
                    category: "worker".to_string(),
                    cause: format!("worker '{}' could not be joined", self.name),
                };
            }
        }
        self.state()
    }

    /// Request cancellation and wait for the thread to exit.
    pub fn stop_and_join(self) -> WorkerState {
        self.stop();
        self.join()
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.shutdown.trigger();
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
