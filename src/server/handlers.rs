/// API request handlers
///
/// Metric handlers share [`metric_response`]; the band decides the status
/// code, a collector failure is always 500.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::any::Any;
use std::collections::BTreeMap;

use super::AppState;
use crate::core::metrics::{run_check, Metric};
use crate::utils::constants::ENDPOINTS;
use crate::utils::{format_timestamp, format_uptime};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusInfo {
    pub status: &'static str,
    pub timestamp: String,
    pub uptime: String,
    pub uptime_seconds: u64,
    pub port: u16,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

/// `{message, error}` body for anything that is not a metric result
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub error: String,
}

pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                message: message.into(),
                error: error.into(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// ============================================================================
// Status Handler
// ============================================================================

pub async fn server_status(State(state): State<AppState>) -> Json<StatusInfo> {
    let uptime = state.started_at.elapsed();

    Json(StatusInfo {
        status: "Server is running",
        timestamp: format_timestamp(chrono::Utc::now()),
        uptime: format_uptime(uptime),
        uptime_seconds: uptime.as_secs(),
        port: state.config.port,
        endpoints: ENDPOINTS.iter().copied().collect(),
    })
}

// ============================================================================
// Metric Handlers
// ============================================================================

pub async fn metric_response(state: &AppState, metric: Metric) -> Response {
    let outcome = run_check(metric, state.runner.as_ref(), &state.config).await;
    (outcome.severity.status_code(), Json(outcome.body)).into_response()
}

pub async fn disk_space(State(state): State<AppState>) -> Response {
    metric_response(&state, Metric::Space).await
}

pub async fn tmp_storage(State(state): State<AppState>) -> Response {
    metric_response(&state, Metric::Tmp).await
}

pub async fn memory_usage(State(state): State<AppState>) -> Response {
    metric_response(&state, Metric::Memory).await
}

pub async fn cpu_usage(State(state): State<AppState>) -> Response {
    metric_response(&state, Metric::Cpu).await
}

pub async fn thread_count(State(state): State<AppState>) -> Response {
    metric_response(&state, Metric::Threads).await
}

// ============================================================================
// Fallbacks
// ============================================================================

pub async fn not_found(uri: axum::http::Uri) -> ApiError {
    ApiError::new(
        StatusCode::NOT_FOUND,
        "Route not found.",
        format!("No endpoint at {}", uri.path()),
    )
}

fn panic_detail(err: Box<dyn Any + Send + 'static>) -> String {
    if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    }
}

fn panic_to_error(err: Box<dyn Any + Send + 'static>, message: &str) -> Response {
    let detail = panic_detail(err);
    tracing::error!(panic = %detail, "handler panicked");

    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, message, detail).into_response()
}

/// Turn a handler panic into a 500 instead of dropping the connection
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    panic_to_error(err, "Internal server error.")
}

/// Same as [`panic_response`], with the status endpoint's own message
pub fn status_panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    panic_to_error(err, "Error retrieving server status.")
}
