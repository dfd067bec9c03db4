//! Desired per-tool severity levels and what the producer last acknowledged.
use super::diff::{self, PendingSync};
use crate::severity::SeverityLevel;
use crate::types::ToolId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Target of a level setting: the global default or one tool.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope {
    All,
    Tool(ToolId),
}

impl Scope {
    pub fn parse(name: &str) -> Self {
        if name == ToolId::ALL_SCOPE {
            Scope::All
        } else {
            Scope::Tool(ToolId::new(name))
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::All => f.write_str(ToolId::ALL_SCOPE),
            Scope::Tool(tool) => write!(f, "{}", tool),
        }
    }
}

/// The desired configuration at a point in time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub default_level: SeverityLevel,
    pub levels_by_tool: BTreeMap<ToolId, SeverityLevel>,
}

/// The configuration the producer last confirmed.
///
/// `default_level` is `None` until anything has been delivered.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AckSnapshot {
    pub default_level: Option<SeverityLevel>,
    pub levels_by_tool: BTreeMap<ToolId, SeverityLevel>,
}

impl From<LevelSnapshot> for AckSnapshot {
    fn from(snapshot: LevelSnapshot) -> Self {
        Self {
            default_level: Some(snapshot.default_level),
            levels_by_tool: snapshot.levels_by_tool,
        }
    }
}

/// Per-tool severity overrides on top of a global default.
#[derive(Debug, Clone, Default)]
pub struct LevelConfigStore {
    default_level: SeverityLevel,
    levels_by_tool: BTreeMap<ToolId, SeverityLevel>,
    last_acknowledged: AckSnapshot,
    /// Highest verbosity ever delivered per scope. Reductions are never
    /// sent, so the producer keeps serving up to this level.
    acked_ceiling: BTreeMap<Scope, SeverityLevel>,
}

impl LevelConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from restored settings, with nothing acknowledged yet.
    pub fn from_snapshot(snapshot: LevelSnapshot) -> Self {
        Self {
            default_level: snapshot.default_level,
            levels_by_tool: snapshot.levels_by_tool,
            ..Self::default()
        }
    }

    pub fn default_level(&self) -> SeverityLevel {
        self.default_level
    }

    pub fn levels_by_tool(&self) -> &BTreeMap<ToolId, SeverityLevel> {
        &self.levels_by_tool
    }

    pub fn last_acknowledged(&self) -> &AckSnapshot {
        &self.last_acknowledged
    }

    pub fn set_default_level(&mut self, level: SeverityLevel) {
        self.default_level = level;
    }

    pub fn set_tool_level(&mut self, tool: ToolId, level: SeverityLevel) {
        self.levels_by_tool.insert(tool, level);
    }

    /// Drops a tool's override so it follows the default again.
    ///
    /// Returns `false` if the tool had no override.
    pub fn clear_tool_level(&mut self, tool: &ToolId) -> bool {
        self.levels_by_tool.remove(tool).is_some()
    }

    pub fn effective_level(&self, tool: &ToolId) -> SeverityLevel {
        self.levels_by_tool
            .get(tool)
            .copied()
            .unwrap_or(self.default_level)
    }

    pub fn snapshot(&self) -> LevelSnapshot {
        LevelSnapshot {
            default_level: self.default_level,
            levels_by_tool: self.levels_by_tool.clone(),
        }
    }

    /// Highest level ever delivered for exactly this scope.
    pub fn acknowledged_ceiling(&self, scope: &Scope) -> Option<SeverityLevel> {
        self.acked_ceiling.get(scope).copied()
    }

    /// Tools the producer holds at a delivered override, with that level.
    ///
    /// The producer keeps such a tool at its override even after the
    /// override is removed here, until a new level is delivered for it.
    pub fn pinned_tools(&self) -> impl Iterator<Item = (&ToolId, SeverityLevel)> + '_ {
        self.acked_ceiling.iter().filter_map(|(scope, level)| match scope {
            Scope::Tool(tool) => Some((tool, *level)),
            Scope::All => None,
        })
    }

    /// The most verbose level the producer is known to serve for a scope.
    ///
    /// A tool with a delivered override is bound by that override on the
    /// producer side; other tools follow the delivered default. `None` means
    /// nothing relevant was ever delivered.
    pub fn producer_support(&self, scope: &Scope) -> Option<SeverityLevel> {
        match scope {
            Scope::All => self.acknowledged_ceiling(&Scope::All),
            Scope::Tool(_) => self
                .acknowledged_ceiling(scope)
                .or_else(|| self.acknowledged_ceiling(&Scope::All)),
        }
    }

    /// Records that the producer confirmed a prepared sync.
    ///
    /// The snapshot captured when the sync was prepared becomes the new
    /// baseline, so edits made while the send was in flight still show up in
    /// the next diff.
    pub fn acknowledge(&mut self, pending: &PendingSync) {
        for change in pending.escalations.iter() {
            let ceiling = self
                .acked_ceiling
                .entry(change.scope.clone())
                .or_insert(change.level);
            if change.level > *ceiling {
                *ceiling = change.level;
            }
        }
        self.last_acknowledged = pending.snapshot.clone().into();
    }

    /// Acknowledges the current configuration as a whole.
    pub fn mark_acknowledged(&mut self) {
        let pending = PendingSync {
            snapshot: self.snapshot(),
            changes: diff::compute_changes(self),
            escalations: diff::escalations(self),
        };
        self.acknowledge(&pending);
    }

    /// Forgets everything the producer was told, as after a session reset.
    pub fn reset_acknowledgement(&mut self) {
        self.last_acknowledged = AckSnapshot::default();
        self.acked_ceiling.clear();
    }
}
