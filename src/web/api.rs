//! This module defines the HTTP API endpoints used by the console front end.
use crate::console::Console;
use crate::network::LinkStatus;
use crate::severity::SeverityLevel;
use crate::types::{LogEntry, ToolId};
use crate::view::{UIFilter, ViewMode};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Response structure for the visible log lines.
#[derive(Serialize)]
pub struct EntriesResponse {
    /// How the lines were assembled.
    #[serde(flatten)]
    mode: ViewMode,
    /// The visible lines, oldest first.
    entries: Vec<LogEntry>,
}

/// Response structure for the overall console state.
#[derive(Serialize)]
pub struct StateResponse {
    current_tool: ToolId,
    default_level: SeverityLevel,
    levels_by_tool: BTreeMap<ToolId, SeverityLevel>,
    /// Changes not yet acknowledged by the producer, in wire format.
    pending_changes: String,
    ui_filter: Option<UIFilter>,
    max_entries_per_tool: usize,
    buffered_entries: usize,
    producer: Option<LinkStatus>,
    started_at: chrono::DateTime<chrono::Utc>,
}

/// Request structure for selecting the current tool.
#[derive(Deserialize)]
pub struct CurrentToolRequest {
    tool: String,
}

/// Request structure for changing a level.
#[derive(Deserialize)]
pub struct SetLevelRequest {
    /// One of `quiet`, `error`, `warning`, `info`, `debug`.
    level: String,
}

/// Request structure for changing the per-tool capacity.
#[derive(Deserialize)]
pub struct CapacityRequest {
    max_entries_per_tool: usize,
}

fn parse_level(raw: &str) -> Result<SeverityLevel, (StatusCode, String)> {
    raw.parse()
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid level: {}", e)))
}

fn parse_tool(raw: &str) -> Result<ToolId, (StatusCode, String)> {
    ToolId::parse(raw).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
}

fn saved(result: anyhow::Result<()>) -> axum::response::Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to save settings: {}", e),
        )
            .into_response(),
    }
}

/// Lists the currently visible log lines.
#[axum::debug_handler]
pub async fn get_entries(State(console): State<Arc<Console>>) -> impl IntoResponse {
    let monitor = console.monitor.lock().await;
    Json(EntriesResponse {
        mode: monitor.view_mode(),
        entries: monitor.visible_entries(),
    })
}

/// Error, warning and info counts across all tools.
#[axum::debug_handler]
pub async fn get_counts(State(console): State<Arc<Console>>) -> impl IntoResponse {
    Json(console.monitor.lock().await.counts())
}

/// Alert tallies per thread or caller.
#[axum::debug_handler]
pub async fn get_alerts(State(console): State<Arc<Console>>) -> impl IntoResponse {
    Json(console.monitor.lock().await.per_entity_alerts())
}

/// Summarizes the console and producer link state.
#[axum::debug_handler]
pub async fn get_state(State(console): State<Arc<Console>>) -> impl IntoResponse {
    let producer = console.producer.status().await.ok();
    let monitor = console.monitor.lock().await;
    let config = monitor.config();

    Json(StateResponse {
        current_tool: monitor.current_tool().clone(),
        default_level: config.default_level(),
        levels_by_tool: config.levels_by_tool().clone(),
        pending_changes: monitor.pending_changes().to_string(),
        ui_filter: monitor.ui_filter().cloned(),
        max_entries_per_tool: monitor.buffers().capacity(),
        buffered_entries: monitor.buffers().total_len(),
        producer,
        started_at: console.started_at,
    })
}

/// Selects the tool shown in single-tool mode.
#[axum::debug_handler]
pub async fn set_current_tool(
    State(console): State<Arc<Console>>,
    Json(req): Json<CurrentToolRequest>,
) -> impl IntoResponse {
    let tool = match parse_tool(&req.tool) {
        Ok(tool) => tool,
        Err(rejection) => return rejection.into_response(),
    };
    saved(console.set_current_tool(tool).await)
}

/// Sets the level applied to tools without an override.
#[axum::debug_handler]
pub async fn set_default_level(
    State(console): State<Arc<Console>>,
    Json(req): Json<SetLevelRequest>,
) -> impl IntoResponse {
    let level = match parse_level(&req.level) {
        Ok(level) => level,
        Err(rejection) => return rejection.into_response(),
    };
    saved(console.set_default_level(level).await)
}

/// Sets a tool's override level.
#[axum::debug_handler]
pub async fn set_tool_level(
    State(console): State<Arc<Console>>,
    Path(tool): Path<String>,
    Json(req): Json<SetLevelRequest>,
) -> impl IntoResponse {
    let (tool, level) = match (parse_tool(&tool), parse_level(&req.level)) {
        (Ok(tool), Ok(level)) => (tool, level),
        (Err(rejection), _) | (_, Err(rejection)) => return rejection.into_response(),
    };
    saved(console.set_tool_level(tool, level).await)
}

/// Removes a tool's override so it follows the default.
#[axum::debug_handler]
pub async fn clear_tool_level(
    State(console): State<Arc<Console>>,
    Path(tool): Path<String>,
) -> impl IntoResponse {
    let tool = match parse_tool(&tool) {
        Ok(tool) => tool,
        Err(rejection) => return rejection.into_response(),
    };
    saved(console.clear_tool_level(&tool).await)
}

/// Replaces the cross-tool UI filter.
#[axum::debug_handler]
pub async fn set_filter(
    State(console): State<Arc<Console>>,
    Json(filter): Json<UIFilter>,
) -> impl IntoResponse {
    console.set_ui_filter(Some(filter)).await;
    StatusCode::NO_CONTENT
}

/// Drops the UI filter, returning to single-tool view.
#[axum::debug_handler]
pub async fn clear_filter(State(console): State<Arc<Console>>) -> impl IntoResponse {
    console.set_ui_filter(None).await;
    StatusCode::NO_CONTENT
}

/// Accepts a batch of lines for a tool, for producers that push over HTTP.
#[axum::debug_handler]
pub async fn post_entries(
    State(console): State<Arc<Console>>,
    Path(tool): Path<String>,
    Json(entries): Json<Vec<LogEntry>>,
) -> impl IntoResponse {
    let tool = match parse_tool(&tool) {
        Ok(tool) => tool,
        Err(rejection) => return rejection.into_response(),
    };
    console.receive_entries(&tool, entries).await;
    StatusCode::ACCEPTED.into_response()
}

/// Clears all lines and restarts config synchronization from scratch.
#[axum::debug_handler]
pub async fn reset_session(State(console): State<Arc<Console>>) -> impl IntoResponse {
    console.reset_session().await;
    StatusCode::NO_CONTENT
}

/// Changes how many lines are kept per tool.
#[axum::debug_handler]
pub async fn set_capacity(
    State(console): State<Arc<Console>>,
    Json(req): Json<CapacityRequest>,
) -> impl IntoResponse {
    match console
        .monitor
        .lock()
        .await
        .set_capacity(req.max_entries_per_tool)
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}
