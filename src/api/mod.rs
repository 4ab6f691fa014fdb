//! Minimal HTTP front end.
//!
//! Read-only views over a running pipeline: a status page, the latest
//! reading, both charts, JSON history snapshots and worker health.

use crate::application::{Pipeline, WorkerStatus};
use crate::core::config::ServerConfig;
use crate::core::{DaqError, HistorySnapshot, Result};
use crate::history::LongStats;
use crate::plot::PlotSnapshot;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// API server state.
#[derive(Clone)]
struct ApiState {
    pipeline: Arc<Pipeline>,
    refresh: Duration,
}

/// Health check response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    processed: u64,
    log_file: Option<String>,
    long_history: LongStats,
    workers: Vec<WorkerStatus>,
}

/// Error response.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: status.as_u16(),
        }),
    )
        .into_response()
}

/// Build the router over `pipeline`. The status page reloads its charts
/// every `refresh`.
pub fn router(pipeline: Arc<Pipeline>, refresh: Duration) -> Router {
    let state = ApiState { pipeline, refresh };

    Router::new()
        .route("/", get(index_handler))
        .route("/current", get(current_handler))
        .route("/long", get(long_plot_handler))
        .route("/short", get(short_plot_handler))
        .route("/history/long", get(long_history_handler))
        .route("/history/short", get(short_history_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Serve the front end until `shutdown` resolves.
pub async fn serve<F>(pipeline: Arc<Pipeline>, config: &ServerConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::new(config.bind_address, config.port);
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| DaqError::network(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Serving charts on http://{}", addr);

    axum::serve(listener, router(pipeline, config.refresh))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| DaqError::network(format!("HTTP server error: {}", e)))
}

/// GET / - Status page with the current reading and both charts
async fn index_handler(State(state): State<ApiState>) -> Html<String> {
    let current = state
        .pipeline
        .last_reading()
        .get()
        .map_or_else(|| "-".to_string(), |sample| format_values(sample.values(), 1));
    let refresh_ms = state.refresh.as_millis();

    Html(format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <title>daqlog</title>
    <script>
      function update() {{
        fetch("current").then(r => r.ok ? r.text() : "-").then(t => {{
          document.getElementById("current").textContent = t;
        }});
        for (const id of ["long", "short"]) {{
          const img = document.getElementById(id);
          img.src = "/" + id + "?" + Date.now();
        }}
      }}
      window.setInterval(update, {refresh_ms});
    </script>
  </head>
  <body>
    <h1>daqlog</h1>
    <h2>Current reading: <span id="current">{current}</span></h2>
    <img id="long" src="/long?" width="45%" />
    <img id="short" src="/short?" width="45%" />
  </body>
</html>
"#
    ))
}

/// GET /current - Latest reading as tab-separated text
async fn current_handler(State(state): State<ApiState>) -> Response {
    match state.pipeline.last_reading().get() {
        Some(sample) => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format_values(sample.values(), 3),
        )
            .into_response(),
        None => error_response(StatusCode::SERVICE_UNAVAILABLE, "No reading yet"),
    }
}

fn format_values(values: &[f64], precision: usize) -> String {
    values
        .iter()
        .map(|v| format!("{:.*}", precision, v))
        .collect::<Vec<_>>()
        .join("\t")
}

fn plot_response(plot: &PlotSnapshot) -> Response {
    match plot.get() {
        Some(bytes) => ([(header::CONTENT_TYPE, plot.content_type())], bytes).into_response(),
        None => error_response(StatusCode::SERVICE_UNAVAILABLE, "Chart not rendered yet"),
    }
}

/// GET /long - Long-history chart
async fn long_plot_handler(State(state): State<ApiState>) -> Response {
    plot_response(state.pipeline.long_plot())
}

/// GET /short - Short-history chart
async fn short_plot_handler(State(state): State<ApiState>) -> Response {
    plot_response(state.pipeline.short_plot())
}

/// GET /history/long - Decimated history as JSON
async fn long_history_handler(State(state): State<ApiState>) -> Json<HistorySnapshot> {
    Json(state.pipeline.long_history())
}

/// GET /history/short - Raw recent history as JSON
async fn short_history_handler(State(state): State<ApiState>) -> Json<HistorySnapshot> {
    Json(state.pipeline.short_history())
}

/// GET /health - Worker states and counters
async fn health_handler(State(state): State<ApiState>) -> Response {
    let workers = state.pipeline.worker_states();
    let failed = workers.iter().any(|w| w.state.is_failed());

    let response = HealthResponse {
        status: if failed { "degraded" } else { "ok" },
        version: env!("CARGO_PKG_VERSION"),
        processed: state.pipeline.store().processed(),
        log_file: state
            .pipeline
            .log_path()
            .map(|path| path.display().to_string()),
        long_history: state.pipeline.long_stats(),
        workers,
    };

    let status = if failed {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (status, Json(response)).into_response()
}
