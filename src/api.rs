//! HTTP front door: routing, content negotiation, and status-code policy.

use std::any::Any;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::signal;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::MonitorConfig;
use crate::models::{DetailedStatus, MetricRecord, StatusSnapshot, SummaryEntry};
use crate::probes::ProbeSet;
use crate::prometheus;
use crate::store;
use crate::summary;

pub struct AppState {
    pub config: MonitorConfig,
    pub probes: ProbeSet,
}

#[derive(Debug, Deserialize)]
struct LogsQuery {
    lines: Option<usize>,
    level: Option<String>,
}

#[derive(Debug, Serialize)]
struct MetricsResponse {
    summary: BTreeMap<String, SummaryEntry>,
    metrics: Vec<MetricRecord>,
}

#[derive(Debug, Serialize)]
struct LogsResponse {
    logs: Vec<String>,
    total_lines: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Response {
    match store::read_status(&state.config.status_file) {
        Some(snapshot) => {
            let code = snapshot.state().http_status();
            (code, Json(snapshot)).into_response()
        }
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(StatusSnapshot::absent()),
        )
            .into_response(),
    }
}

async fn metrics(State(state): State<Arc<AppState>>) -> Json<MetricsResponse> {
    let history = store::read_metrics_history(&state.config.metrics_file);
    Json(MetricsResponse {
        summary: summary::summarize(&history),
        metrics: history,
    })
}

async fn detailed_status(State(state): State<Arc<AppState>>) -> Json<DetailedStatus> {
    Json(state.probes.detailed_status(&state.config).await)
}

async fn logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> Json<LogsResponse> {
    let lines = query.lines.unwrap_or(50);
    let level = query.level.as_deref().filter(|level| !level.is_empty());
    let logs = store::read_log_lines(&state.config.healthcheck_log, lines, level);
    Json(LogsResponse {
        total_lines: logs.len(),
        logs,
    })
}

async fn prometheus_text(State(state): State<Arc<AppState>>) -> Response {
    let snapshot = store::read_status(&state.config.status_file);
    let history = store::read_metrics_history(&state.config.metrics_file);
    let text = prometheus::exposition(snapshot.as_ref(), &history);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        text,
    )
        .into_response()
}

async fn index() -> Html<String> {
    let endpoints = [
        ("/health", "Current health status (JSON)"),
        ("/metrics", "Historical metrics and summary (JSON)"),
        ("/status", "Detailed status information (JSON)"),
        ("/logs?lines=100", "Recent log entries (JSON) - ?lines=N&level=LEVEL"),
        ("/prometheus", "Prometheus-compatible metrics (text)"),
    ];
    let mut body = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<title>vpnpulse monitoring</title>\n\
         <style>\n\
         body { font-family: Arial, sans-serif; margin: 40px; }\n\
         .endpoint { margin: 10px 0; }\n\
         .endpoint a { text-decoration: none; color: #0066cc; }\n\
         .description { color: #666; margin-left: 20px; }\n\
         </style>\n</head>\n<body>\n<h1>vpnpulse monitoring</h1>\n\
         <h2>Available Endpoints:</h2>\n",
    );
    for (path, description) in endpoints {
        body.push_str(&format!(
            "<div class=\"endpoint\"><a href=\"{path}\">{path}</a>\
             <div class=\"description\">{description}</div></div>\n"
        ));
    }
    body.push_str(&format!(
        "<div style=\"margin-top: 30px; color: #888;\">Generated at: {}</div>\n</body>\n</html>\n",
        Utc::now().to_rfc3339()
    ));
    Html(body)
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unhandled internal error".to_string()
    };
    error!(error = %detail, "Request handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": detail })),
    )
        .into_response()
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/status", get(detailed_status))
        .route("/logs", get(logs))
        .route("/prometheus", get(prometheus_text))
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the listening socket and serve until an interrupt arrives. A bind
/// failure is the one fatal startup error.
pub async fn serve(config: MonitorConfig, probes: ProbeSet) -> Result<()> {
    let port = config.port;
    let state = Arc::new(AppState { config, probes });
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind monitoring port {port}"))?;
    info!("Available endpoints: /health, /metrics, /status, /logs, /prometheus");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
