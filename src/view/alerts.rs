//! Badge counts derived from the buffers, independent of the current view.
use crate::config::LevelConfigStore;
use crate::logging::ToolLogBuffers;
use crate::severity::SeverityLevel;
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-entity info counts stop here so badges don't churn on chatty threads.
pub const INFO_DISPLAY_CEILING: u32 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertTally {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
}

/// Error, warning and info counts over every tool.
///
/// Each tool's own effective level decides inclusion. Debug lines are never
/// counted, whatever the configuration.
pub fn counts(buffers: &ToolLogBuffers, config: &LevelConfigStore) -> AlertCounts {
    let mut counts = AlertCounts::default();

    for (tool, entries) in buffers.iter_tools() {
        let threshold = config.effective_level(tool);
        for entry in entries.iter().filter(|entry| entry.level.passes(threshold)) {
            match entry.level {
                SeverityLevel::Error => counts.error += 1,
                SeverityLevel::Warning => counts.warning += 1,
                SeverityLevel::Info => counts.info += 1,
                SeverityLevel::Quiet | SeverityLevel::Debug => {}
            }
        }
    }

    counts
}

/// Alert tallies per entity key (`t:<thread>`, `c:<caller>`).
pub fn per_entity_alerts(buffers: &ToolLogBuffers) -> BTreeMap<String, AlertTally> {
    let mut alerts: BTreeMap<String, AlertTally> = BTreeMap::new();

    for (_, entries) in buffers.iter_tools() {
        for entry in entries {
            if !matches!(
                entry.level,
                SeverityLevel::Error | SeverityLevel::Warning | SeverityLevel::Info
            ) {
                continue;
            }

            for key in entry.entity_keys() {
                let tally = alerts.entry(key).or_default();
                match entry.level {
                    SeverityLevel::Error => tally.errors += 1,
                    SeverityLevel::Warning => tally.warnings += 1,
                    _ => tally.info = (tally.info + 1).min(INFO_DISPLAY_CEILING),
                }
            }
        }
    }

    alerts
}
