//! Periodic chart renderer with a shared, reusable output buffer.

use crate::core::{HistorySnapshot, Result};
use crate::plot::{Frame, Renderer};
use crate::worker::Shutdown;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Supplies the history to draw on every refresh.
pub type PlotSource = Box<dyn FnMut() -> HistorySnapshot + Send>;

/// Reader side of a plotter's output buffer.
#[derive(Debug, Clone)]
pub struct PlotSnapshot {
    buffer: Arc<Mutex<Option<Vec<u8>>>>,
    content_type: &'static str,
}

impl PlotSnapshot {
    fn new(content_type: &'static str) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(None)),
            content_type,
        }
    }

    /// Copy of the latest chart, or `None` before the first render
    pub fn get(&self) -> Option<Vec<u8>> {
        self.buffer.lock().clone()
    }

    /// True once a chart has been rendered
    pub fn is_ready(&self) -> bool {
        self.buffer.lock().is_some()
    }

    /// MIME type of the chart bytes
    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    fn replace(&self, rendered: &[u8]) {
        let mut buffer = self.buffer.lock();
        match buffer.as_mut() {
            Some(bytes) => {
                bytes.clear();
                bytes.extend_from_slice(rendered);
            },
            None => *buffer = Some(rendered.to_vec()),
        }
    }
}

/// Redraws one history view every `period`.
pub struct Plotter {
    name: String,
    period: Duration,
    source: PlotSource,
    renderer: Box<dyn Renderer>,
    scratch: Vec<u8>,
    snapshot: PlotSnapshot,
    renders: u64,
}

impl Plotter {
    /// Create a plotter. Nothing is drawn until the first period elapses.
    pub fn new(
        name: impl Into<String>,
        period: Duration,
        source: PlotSource,
        renderer: Box<dyn Renderer>,
    ) -> Self {
        let snapshot = PlotSnapshot::new(renderer.content_type());
        Self {
            name: name.into(),
            period,
            source,
            renderer,
            scratch: Vec::new(),
            snapshot,
            renders: 0,
        }
    }

    /// Handle readers use to fetch the latest chart
    pub fn snapshot_handle(&self) -> PlotSnapshot {
        self.snapshot.clone()
    }

    /// Charts rendered so far
    pub fn renders(&self) -> u64 {
        self.renders
    }

    /// Fetch the history, draw it and publish the result.
    ///
    /// Rendering happens outside the buffer lock; readers only ever see a
    /// complete chart.
    pub fn render_once(&mut self) -> Result<()> {
        let history = (self.source)();
        let points = history.times.len();
        let frame = Frame {
            title: &self.name,
            times: &history.times,
            series: history
                .columns
                .iter()
                .map(|column| &column[..column.len().min(points)])
                .collect(),
        };

        self.scratch.clear();
        self.renderer.render(&frame, &mut self.scratch)?;
        self.snapshot.replace(&self.scratch);
        self.renders += 1;

        tracing::debug!(plot = %self.name, points, bytes = self.scratch.len(), "chart rendered");
        Ok(())
    }

    /// Wait one period, render, repeat until `shutdown` is triggered.
    pub fn run(mut self, shutdown: &Shutdown) -> Result<()> {
        while !shutdown.wait(self.period) {
            self.render_once()?;
        }
        tracing::info!(plot = %self.name, renders = self.renders, "plotter stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DaqError;
    use std::time::Instant;

    /// Records what it was asked to draw.
    struct Recorder {
        seen: Arc<Mutex<Vec<(usize, Vec<usize>)>>>,
    }

    impl Renderer for Recorder {
        fn render(&mut self, frame: &Frame<'_>, out: &mut Vec<u8>) -> Result<()> {
            let lens = frame.series.iter().map(|s| s.len()).collect();
            self.seen.lock().push((frame.times.len(), lens));
            out.extend_from_slice(b"chart");
            Ok(())
        }

        fn content_type(&self) -> &'static str {
            "text/plain"
        }
    }

    struct Broken;

    impl Renderer for Broken {
        fn render(&mut self, _: &Frame<'_>, _: &mut Vec<u8>) -> Result<()> {
            Err(DaqError::render("backend gone"))
        }

        fn content_type(&self) -> &'static str {
            "image/png"
        }
    }

    fn ragged() -> PlotSource {
        Box::new(|| HistorySnapshot {
            times: vec![1.0, 2.0, 3.0],
            columns: vec![vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0]],
        })
    }

    #[test]
    fn test_columns_trimmed_to_time_axis() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Recorder {
            seen: Arc::clone(&seen),
        };
        let mut plotter = Plotter::new("long", Duration::from_secs(1), ragged(), Box::new(recorder));
        let snapshot = plotter.snapshot_handle();
        assert_eq!(snapshot.get(), None);

        plotter.render_once().unwrap();
        assert_eq!(seen.lock().as_slice(), &[(3, vec![3, 2])]);
        assert_eq!(snapshot.get(), Some(b"chart".to_vec()));
        assert_eq!(snapshot.content_type(), "text/plain");
    }

    #[test]
    fn test_buffer_reused_across_renders() {
        let recorder = Recorder {
            seen: Arc::new(Mutex::new(Vec::new())),
        };
        let mut plotter = Plotter::new("short", Duration::from_secs(1), ragged(), Box::new(recorder));
        plotter.render_once().unwrap();
        plotter.render_once().unwrap();
        assert_eq!(plotter.snapshot_handle().get(), Some(b"chart".to_vec()));
        assert_eq!(plotter.renders(), 2);
    }

    #[test]
    fn test_render_error_keeps_previous_chart_out() {
        let mut plotter = Plotter::new("long", Duration::from_secs(1), ragged(), Box::new(Broken));
        let err = plotter.render_once().unwrap_err();
        assert_eq!(err.category(), "render");
        assert!(!plotter.snapshot_handle().is_ready());
    }

    #[test]
    fn test_nothing_before_first_period() {
        let recorder = Recorder {
            seen: Arc::new(Mutex::new(Vec::new())),
        };
        let plotter =
            Plotter::new("long", Duration::from_millis(200), ragged(), Box::new(recorder));
        let snapshot = plotter.snapshot_handle();
        let shutdown = Shutdown::new();
        let worker = {
            let shutdown = shutdown.clone();
            std::thread::spawn(move || plotter.run(&shutdown))
        };

        std::thread::sleep(Duration::from_millis(50));
        assert!(snapshot.get().is_none());

        let deadline = Instant::now() + Duration::from_secs(5);
        while !snapshot.is_ready() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(snapshot.is_ready());

        shutdown.trigger();
        worker.join().unwrap().unwrap();
    }
}
