//! The transient cross-tool filter applied on top of the per-tool levels.
use crate::severity::SeverityLevel;
use crate::types::LogEntry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Narrows the view by severity and/or entity key across every tool.
///
/// This never touches the level configuration and is never sent to the
/// producer or persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UIFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub levels: Option<BTreeSet<SeverityLevel>>,
    #[serde(default, rename = "entityKeys", skip_serializing_if = "Option::is_none")]
    pub entity_keys: Option<BTreeSet<String>>,
}

impl UIFilter {
    pub fn by_levels(levels: impl IntoIterator<Item = SeverityLevel>) -> Self {
        Self {
            levels: Some(levels.into_iter().collect()),
            entity_keys: None,
        }
    }

    pub fn by_entities<S: Into<String>>(keys: impl IntoIterator<Item = S>) -> Self {
        Self {
            levels: None,
            entity_keys: Some(keys.into_iter().map(Into::into).collect()),
        }
    }

    /// Whether the filter narrows anything; an inactive filter means
    /// single-tool view.
    pub fn is_active(&self) -> bool {
        let has_levels = self.levels.as_ref().is_some_and(|set| !set.is_empty());
        let has_keys = self.entity_keys.as_ref().is_some_and(|set| !set.is_empty());
        has_levels || has_keys
    }

    /// Both predicates must hold when both are given. An empty set counts as
    /// not given.
    pub fn matches(&self, entry: &LogEntry) -> bool {
        let level_ok = match &self.levels {
            Some(levels) if !levels.is_empty() => levels.contains(&entry.level),
            _ => true,
        };
        if !level_ok {
            return false;
        }

        match &self.entity_keys {
            Some(keys) if !keys.is_empty() => entry
                .entity_keys()
                .iter()
                .any(|key| keys.contains(key)),
            _ => true,
        }
    }
}
