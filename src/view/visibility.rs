//! Decides which buffered lines are currently visible.
//!
//! The result is recomputed from scratch on every read; nothing is cached
//! between calls.
use super::filter::UIFilter;
use crate::config::LevelConfigStore;
use crate::logging::ToolLogBuffers;
use crate::types::{LogEntry, ToolId};
use serde::Serialize;

/// How the view is currently assembled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ViewMode {
    /// One tool's lines, filtered by that tool's effective level.
    SingleTool { tool: ToolId },
    /// Every tool's lines, merged by timestamp and narrowed by the UI filter.
    Aggregate,
}

pub fn view_mode(current_tool: &ToolId, filter: Option<&UIFilter>) -> ViewMode {
    match filter {
        Some(filter) if filter.is_active() => ViewMode::Aggregate,
        _ => ViewMode::SingleTool {
            tool: current_tool.clone(),
        },
    }
}

/// The visible lines, oldest first.
pub fn visible_entries(
    buffers: &ToolLogBuffers,
    config: &LevelConfigStore,
    current_tool: &ToolId,
    filter: Option<&UIFilter>,
) -> Vec<LogEntry> {
    match filter {
        Some(filter) if filter.is_active() => aggregate(buffers, filter),
        _ => {
            let threshold = config.effective_level(current_tool);
            buffers
                .entries(current_tool)
                .filter(|entry| entry.level.passes(threshold))
                .cloned()
                .collect()
        }
    }
}

fn aggregate(buffers: &ToolLogBuffers, filter: &UIFilter) -> Vec<LogEntry> {
    let mut merged: Vec<LogEntry> = buffers
        .iter_tools()
        .flat_map(|(_, entries)| entries.iter())
        .filter(|entry| filter.matches(entry))
        .cloned()
        .collect();
    // Stable, so equal timestamps keep tool order then arrival order.
    merged.sort_by_key(|entry| entry.timestamp);
    merged
}
