//! The single owner of the console state.
//!
//! `LogMonitor` ties the per-tool buffers, the level configuration and the
//! transient UI filter together and exposes the operations the transport and
//! the UI drive. It performs no I/O; callers serialize access to it.
use crate::config::{self, ConfigDiff, LevelConfigStore, LevelSnapshot, PendingSync};
use crate::error::TelemetryResult;
use crate::logging::ToolLogBuffers;
use crate::severity::SeverityLevel;
use crate::types::{LogEntry, ToolId};
use crate::view::{self, AlertCounts, AlertTally, UIFilter, ViewMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Tool shown when nothing else was selected.
pub const DEFAULT_TOOL: &str = "core";

/// The part of the console state that survives restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersistedView {
    pub current_tool: ToolId,
    pub levels_by_tool: BTreeMap<ToolId, SeverityLevel>,
    pub default_level: SeverityLevel,
}

impl Default for PersistedView {
    fn default() -> Self {
        Self {
            current_tool: ToolId::new(DEFAULT_TOOL),
            levels_by_tool: BTreeMap::new(),
            default_level: SeverityLevel::Quiet,
        }
    }
}

impl PersistedView {
    /// Decodes stored settings, falling back to defaults on malformed data.
    ///
    /// Missing fields take their defaults individually.
    pub fn decode(bytes: &[u8]) -> Self {
        match serde_json::from_slice(bytes) {
            Ok(view) => view,
            Err(e) => {
                warn!("Ignoring malformed persisted view settings: {}", e);
                Self::default()
            }
        }
    }
}

pub struct LogMonitor {
    buffers: ToolLogBuffers,
    config: LevelConfigStore,
    current_tool: ToolId,
    /// Transient, never persisted and never sent to the producer.
    ui_filter: Option<UIFilter>,
    /// Bumped on every session reset.
    session_epoch: u64,
}

impl LogMonitor {
    /// Creates a monitor with empty buffers and everything at `Quiet`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCapacity` if `max_entries_per_tool` is zero.
    pub fn new(max_entries_per_tool: usize) -> TelemetryResult<Self> {
        Self::restore(PersistedView::default(), max_entries_per_tool)
    }

    /// Creates a monitor from persisted settings. Nothing counts as
    /// acknowledged by the producer yet.
    pub fn restore(view: PersistedView, max_entries_per_tool: usize) -> TelemetryResult<Self> {
        let config = LevelConfigStore::from_snapshot(LevelSnapshot {
            default_level: view.default_level,
            levels_by_tool: view.levels_by_tool,
        });

        Ok(Self {
            buffers: ToolLogBuffers::new(max_entries_per_tool)?,
            config,
            current_tool: view.current_tool,
            ui_filter: None,
            session_epoch: 0,
        })
    }

    pub fn buffers(&self) -> &ToolLogBuffers {
        &self.buffers
    }

    pub fn config(&self) -> &LevelConfigStore {
        &self.config
    }

    pub fn current_tool(&self) -> &ToolId {
        &self.current_tool
    }

    pub fn ui_filter(&self) -> Option<&UIFilter> {
        self.ui_filter.as_ref()
    }

    /// Identifies the current session; a sync prepared in an earlier
    /// session must not be acknowledged into this one.
    pub fn session_epoch(&self) -> u64 {
        self.session_epoch
    }

    /// Stores lines delivered by the transport. Unknown tools are kept under
    /// their own id.
    pub fn on_entries_received(&mut self, tool: &ToolId, entries: Vec<LogEntry>) {
        if entries.is_empty() {
            return;
        }
        if !tool.is_known() && self.buffers.len(tool) == 0 {
            debug!("Receiving lines for unlisted tool '{}'", tool);
        }
        self.buffers.append(tool, entries);
    }

    pub fn set_current_tool(&mut self, tool: ToolId) {
        debug!("Current tool set to '{}'", tool);
        self.current_tool = tool;
    }

    pub fn set_default_level(&mut self, level: SeverityLevel) {
        debug!("Default level set to {}", level);
        self.config.set_default_level(level);
    }

    pub fn set_tool_level(&mut self, tool: ToolId, level: SeverityLevel) {
        debug!("Level for '{}' set to {}", tool, level);
        self.config.set_tool_level(tool, level);
    }

    pub fn clear_tool_level(&mut self, tool: &ToolId) -> bool {
        self.config.clear_tool_level(tool)
    }

    /// Replaces the UI filter. An inactive filter is stored as none.
    pub fn set_ui_filter(&mut self, filter: Option<UIFilter>) {
        self.ui_filter = filter.filter(UIFilter::is_active);
    }

    pub fn clear_ui_filter(&mut self) {
        self.ui_filter = None;
    }

    pub fn view_mode(&self) -> ViewMode {
        view::view_mode(&self.current_tool, self.ui_filter.as_ref())
    }

    pub fn visible_entries(&self) -> Vec<LogEntry> {
        view::visible_entries(
            &self.buffers,
            &self.config,
            &self.current_tool,
            self.ui_filter.as_ref(),
        )
    }

    pub fn counts(&self) -> AlertCounts {
        view::counts(&self.buffers, &self.config)
    }

    pub fn per_entity_alerts(&self) -> BTreeMap<String, AlertTally> {
        view::per_entity_alerts(&self.buffers)
    }

    /// Every change since the last acknowledgement, escalations or not.
    pub fn pending_changes(&self) -> ConfigDiff {
        config::compute_changes(&self.config)
    }

    pub fn prepare_sync(&self) -> Option<PendingSync> {
        config::prepare_sync(&self.config)
    }

    pub fn acknowledge(&mut self, pending: &PendingSync) {
        self.config.acknowledge(pending);
    }

    pub fn mark_acknowledged(&mut self) {
        self.config.mark_acknowledged();
    }

    /// # Errors
    ///
    /// Returns `InvalidCapacity` for zero; the previous capacity is kept.
    pub fn set_capacity(&mut self, max_entries_per_tool: usize) -> TelemetryResult<()> {
        self.buffers.set_capacity(max_entries_per_tool)?;
        info!("Per-tool capacity set to {}", max_entries_per_tool);
        Ok(())
    }

    /// Forgets what the producer was told, so the next sync announces the
    /// whole configuration. Used when a new producer connects.
    pub fn forget_acknowledgement(&mut self) {
        self.config.reset_acknowledgement();
        self.session_epoch += 1;
    }

    /// Drops all buffered lines and forgets what the producer was told.
    pub fn reset_session(&mut self) {
        self.buffers.clear_all();
        self.forget_acknowledgement();
        info!("Session reset");
    }

    pub fn persisted_view(&self) -> PersistedView {
        PersistedView {
            current_tool: self.current_tool.clone(),
            levels_by_tool: self.config.levels_by_tool().clone(),
            default_level: self.config.default_level(),
        }
    }
}
