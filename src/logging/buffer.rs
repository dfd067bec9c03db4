//! This module provides the bounded per-tool history of received log lines.
//!
//! Every tool keeps its own FIFO window. Eviction only looks at the tool's
//! own window and the configured capacity; which tool the user is looking at
//! and which filters are active never influence what is kept.
use crate::error::{TelemetryError, TelemetryResult};
use crate::types::{LogEntry, ToolId};
use std::collections::{BTreeMap, VecDeque};
use tracing::debug;

/// Default number of lines retained per tool.
pub const DEFAULT_MAX_ENTRIES_PER_TOOL: usize = 5000;

/// A set of ring buffers of log entries, one per tool.
#[derive(Debug, Clone)]
pub struct ToolLogBuffers {
    /// The buffered entries, keyed by tool.
    buffers: BTreeMap<ToolId, VecDeque<LogEntry>>,
    /// The maximum number of entries kept for each tool.
    max_entries_per_tool: usize,
}

impl ToolLogBuffers {
    /// Creates an empty buffer for every known tool.
    ///
    /// # Arguments
    ///
    /// * `max_entries_per_tool` - The capacity of each tool's window.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCapacity` if `max_entries_per_tool` is zero.
    pub fn new(max_entries_per_tool: usize) -> TelemetryResult<Self> {
        if max_entries_per_tool == 0 {
            return Err(TelemetryError::InvalidCapacity(max_entries_per_tool));
        }

        let buffers = ToolId::known()
            .map(|tool| (tool, VecDeque::new()))
            .collect();

        Ok(Self {
            buffers,
            max_entries_per_tool,
        })
    }

    pub fn capacity(&self) -> usize {
        self.max_entries_per_tool
    }

    /// Appends entries to a tool's window, evicting the oldest on overflow.
    ///
    /// Tools that were not known at startup get a window on first use.
    pub fn append(&mut self, tool: &ToolId, entries: Vec<LogEntry>) {
        if entries.is_empty() {
            return;
        }

        let buffer = self.buffers.entry(tool.clone()).or_default();
        buffer.extend(entries);

        let excess = buffer.len().saturating_sub(self.max_entries_per_tool);
        if excess > 0 {
            buffer.drain(..excess);
        }
    }

    pub fn clear(&mut self, tool: &ToolId) {
        if let Some(buffer) = self.buffers.get_mut(tool) {
            buffer.clear();
        }
    }

    pub fn clear_all(&mut self) {
        for buffer in self.buffers.values_mut() {
            buffer.clear();
        }
    }

    /// Changes the per-tool capacity and trims every window to fit.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCapacity` for zero; the previous capacity is kept.
    pub fn set_capacity(&mut self, max_entries_per_tool: usize) -> TelemetryResult<()> {
        if max_entries_per_tool == 0 {
            return Err(TelemetryError::InvalidCapacity(max_entries_per_tool));
        }

        self.max_entries_per_tool = max_entries_per_tool;
        for (tool, buffer) in self.buffers.iter_mut() {
            let excess = buffer.len().saturating_sub(max_entries_per_tool);
            if excess > 0 {
                buffer.drain(..excess);
                debug!("Trimmed {} entries from '{}' after capacity change", excess, tool);
            }
        }

        Ok(())
    }

    /// The entries held for a tool, oldest first.
    pub fn entries(&self, tool: &ToolId) -> impl Iterator<Item = &LogEntry> {
        self.buffers.get(tool).into_iter().flat_map(|buffer| buffer.iter())
    }

    pub fn len(&self, tool: &ToolId) -> usize {
        self.buffers.get(tool).map_or(0, VecDeque::len)
    }

    pub fn total_len(&self) -> usize {
        self.buffers.values().map(VecDeque::len).sum()
    }

    /// Every tool with a window, with its entries.
    pub fn iter_tools(&self) -> impl Iterator<Item = (&ToolId, &VecDeque<LogEntry>)> {
        self.buffers.iter()
    }
}

impl Default for ToolLogBuffers {
    fn default() -> Self {
        Self {
            buffers: ToolId::known().map(|tool| (tool, VecDeque::new())).collect(),
            max_entries_per_tool: DEFAULT_MAX_ENTRIES_PER_TOOL,
        }
    }
}
