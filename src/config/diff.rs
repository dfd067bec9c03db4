//! Computes what has to be told to the producer since its last acknowledgement.
//!
//! The raw diff lists every scope whose level differs from the acknowledged
//! baseline. Only escalations ever go on the wire: a reduction is served by
//! filtering locally, because the producer keeps emitting at the higher level
//! it was last given.
use super::store::{LevelConfigStore, LevelSnapshot, Scope};
use crate::error::TelemetryError;
use crate::severity::SeverityLevel;
use std::fmt;
use std::str::FromStr;

/// Separator between `scope@level` pairs on the wire.
pub const CHANGE_SEPARATOR: char = ':';

/// One `scope@level` setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigChange {
    pub scope: Scope,
    pub level: SeverityLevel,
}

impl ConfigChange {
    pub fn new(scope: Scope, level: SeverityLevel) -> Self {
        Self { scope, level }
    }
}

impl fmt::Display for ConfigChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.scope, self.level)
    }
}

impl FromStr for ConfigChange {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scope, level) = s
            .split_once('@')
            .ok_or_else(|| TelemetryError::InvalidChange(s.to_string()))?;
        if scope.is_empty() {
            return Err(TelemetryError::InvalidChange(s.to_string()));
        }
        Ok(Self::new(Scope::parse(scope), level.parse()?))
    }
}

/// An ordered list of changes: the default scope first, then tools.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigDiff {
    changes: Vec<ConfigChange>,
}

impl ConfigDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigChange> {
        self.changes.iter()
    }

    pub fn contains(&self, scope: &Scope, level: SeverityLevel) -> bool {
        self.changes
            .iter()
            .any(|change| &change.scope == scope && change.level == level)
    }

    fn push(&mut self, change: ConfigChange) {
        self.changes.push(change);
    }
}

impl fmt::Display for ConfigDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, change) in self.changes.iter().enumerate() {
            if index > 0 {
                write!(f, "{}", CHANGE_SEPARATOR)?;
            }
            write!(f, "{}", change)?;
        }
        Ok(())
    }
}

impl FromStr for ConfigDiff {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let changes = s
            .split(CHANGE_SEPARATOR)
            .filter(|part| !part.trim().is_empty())
            .map(|part| part.trim().parse())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { changes })
    }
}

/// A sync prepared against a frozen snapshot of the desired configuration.
#[derive(Debug, Clone)]
pub struct PendingSync {
    /// The configuration the diff was computed from.
    pub snapshot: LevelSnapshot,
    /// Every change relative to the acknowledged baseline.
    pub changes: ConfigDiff,
    /// What the producer must be told about: the escalating part of
    /// `changes`, plus defaults that rose above a tool the producer pins.
    pub escalations: ConfigDiff,
}

impl PendingSync {
    /// Whether anything has to be sent, as opposed to absorbed locally.
    pub fn needs_delivery(&self) -> bool {
        !self.escalations.is_empty()
    }
}

/// Every scope whose level differs from the last acknowledged configuration.
pub fn compute_changes(store: &LevelConfigStore) -> ConfigDiff {
    let acked = store.last_acknowledged();
    let mut diff = ConfigDiff::default();

    if acked.default_level != Some(store.default_level()) {
        diff.push(ConfigChange::new(Scope::All, store.default_level()));
    }

    for (tool, level) in store.levels_by_tool() {
        if acked.levels_by_tool.get(tool) != Some(level) {
            diff.push(ConfigChange::new(Scope::Tool(tool.clone()), *level));
        }
    }

    // A removed override resets the tool to the default on the producer side.
    for tool in acked.levels_by_tool.keys() {
        if !store.levels_by_tool().contains_key(tool) {
            diff.push(ConfigChange::new(
                Scope::Tool(tool.clone()),
                store.default_level(),
            ));
        }
    }

    diff
}

/// Whether a change asks for more than the producer is known to serve.
pub fn is_escalation(store: &LevelConfigStore, change: &ConfigChange) -> bool {
    match store.producer_support(&change.scope) {
        Some(supported) => change.level > supported,
        None => true,
    }
}

/// The changes that must reach the producer.
pub fn escalations(store: &LevelConfigStore) -> ConfigDiff {
    escalations_among(store, &compute_changes(store))
}

/// Escalating entries of `changes`, followed by tools that follow the default
/// here but that the producer still holds below it.
fn escalations_among(store: &LevelConfigStore, changes: &ConfigDiff) -> ConfigDiff {
    let mut diff = ConfigDiff::default();
    for change in changes.iter() {
        if is_escalation(store, change) {
            diff.push(change.clone());
        }
    }

    let default_level = store.default_level();
    for (tool, pinned) in store.pinned_tools() {
        let scope = Scope::Tool(tool.clone());
        if store.levels_by_tool().contains_key(tool)
            || default_level <= pinned
            || diff.iter().any(|change| change.scope == scope)
        {
            continue;
        }
        diff.push(ConfigChange::new(scope, default_level));
    }

    diff
}

/// Freezes the current configuration for a sync; `None` when nothing changed.
pub fn prepare_sync(store: &LevelConfigStore) -> Option<PendingSync> {
    let changes = compute_changes(store);
    let escalations = escalations_among(store, &changes);
    if changes.is_empty() && escalations.is_empty() {
        return None;
    }

    Some(PendingSync {
        snapshot: store.snapshot(),
        changes,
        escalations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolId;

    fn tool(name: &str) -> ToolId {
        ToolId::from(name)
    }

    #[test]
    fn first_sync_lists_default_then_tools() {
        let mut store = LevelConfigStore::new();
        store.set_default_level(SeverityLevel::Info);
        store.set_tool_level(tool("http"), SeverityLevel::Debug);

        let diff = compute_changes(&store);
        assert_eq!(diff.to_string(), "all@info:http@debug");
        assert_eq!(escalations(&store), diff);
    }

    #[test]
    fn untouched_store_still_announces_default_once() {
        let mut store = LevelConfigStore::new();
        assert_eq!(compute_changes(&store).to_string(), "all@quiet");

        store.mark_acknowledged();
        assert!(compute_changes(&store).is_empty());
        assert!(prepare_sync(&store).is_none());
    }

    #[test]
    fn diff_is_repeatable_between_acknowledgements() {
        let mut store = LevelConfigStore::new();
        store.mark_acknowledged();
        store.set_tool_level(tool("mutex"), SeverityLevel::Info);
        store.set_tool_level(tool("codec"), SeverityLevel::Warning);

        let first = compute_changes(&store).to_string();
        let second = compute_changes(&store).to_string();
        assert_eq!(first, "codec@warning:mutex@info");
        assert_eq!(first, second);
    }

    #[test]
    fn removed_override_resets_to_default() {
        let mut store = LevelConfigStore::new();
        store.set_default_level(SeverityLevel::Warning);
        store.set_tool_level(tool("codec"), SeverityLevel::Error);
        store.mark_acknowledged();

        store.clear_tool_level(&tool("codec"));
        let diff = compute_changes(&store);
        assert_eq!(diff.to_string(), "codec@warning");

        // Warning is above the delivered Error override, so it must be sent.
        assert_eq!(escalations(&store), diff);
    }

    #[test]
    fn removed_override_below_delivered_level_stays_local() {
        let mut store = LevelConfigStore::new();
        store.set_default_level(SeverityLevel::Error);
        store.set_tool_level(tool("codec"), SeverityLevel::Debug);
        store.mark_acknowledged();

        store.clear_tool_level(&tool("codec"));
        assert_eq!(compute_changes(&store).to_string(), "codec@error");
        assert!(escalations(&store).is_empty());
    }

    #[test]
    fn reduce_then_restore_does_not_resend() {
        let mut store = LevelConfigStore::new();
        store.set_tool_level(tool("http"), SeverityLevel::Debug);
        store.mark_acknowledged();

        store.set_tool_level(tool("http"), SeverityLevel::Warning);
        let pending = prepare_sync(&store).expect("reduction is a change");
        assert!(!pending.needs_delivery());
        store.acknowledge(&pending);

        store.set_tool_level(tool("http"), SeverityLevel::Debug);
        let pending = prepare_sync(&store).expect("restore is a change");
        assert!(!pending.needs_delivery());
    }

    #[test]
    fn reduce_then_restore_without_absorbing_has_no_change() {
        let mut store = LevelConfigStore::new();
        store.set_tool_level(tool("http"), SeverityLevel::Debug);
        store.mark_acknowledged();

        store.set_tool_level(tool("http"), SeverityLevel::Warning);
        assert!(escalations(&store).is_empty());
        store.set_tool_level(tool("http"), SeverityLevel::Debug);
        assert!(compute_changes(&store).is_empty());
    }

    #[test]
    fn override_above_delivered_default_is_an_escalation() {
        let mut store = LevelConfigStore::new();
        store.set_default_level(SeverityLevel::Warning);
        store.mark_acknowledged();

        store.set_tool_level(tool("core"), SeverityLevel::Error);
        assert!(escalations(&store).is_empty());

        store.set_tool_level(tool("core"), SeverityLevel::Info);
        assert_eq!(escalations(&store).to_string(), "core@info");
    }

    #[test]
    fn acknowledging_prepared_snapshot_keeps_later_edits_pending() {
        let mut store = LevelConfigStore::new();
        store.set_default_level(SeverityLevel::Info);
        let pending = prepare_sync(&store).unwrap();

        store.set_tool_level(tool("storage"), SeverityLevel::Debug);
        store.acknowledge(&pending);

        assert_eq!(compute_changes(&store).to_string(), "storage@debug");
        assert_eq!(escalations(&store).to_string(), "storage@debug");
    }

    #[test]
    fn default_escalation_reaches_tool_with_absorbed_override_removal() {
        let mut store = LevelConfigStore::new();
        store.set_tool_level(tool("codec"), SeverityLevel::Warning);
        let pending = prepare_sync(&store).unwrap();
        assert_eq!(pending.escalations.to_string(), "all@quiet:codec@warning");
        store.acknowledge(&pending);

        store.clear_tool_level(&tool("codec"));
        let pending = prepare_sync(&store).unwrap();
        assert_eq!(pending.changes.to_string(), "codec@quiet");
        assert!(!pending.needs_delivery());
        store.acknowledge(&pending);

        store.set_default_level(SeverityLevel::Debug);
        let pending = prepare_sync(&store).unwrap();
        assert_eq!(pending.escalations.to_string(), "all@debug:codec@debug");
        store.acknowledge(&pending);

        assert_eq!(
            store.acknowledged_ceiling(&Scope::Tool(tool("codec"))),
            Some(SeverityLevel::Debug)
        );
        assert!(prepare_sync(&store).is_none());
    }

    #[test]
    fn default_at_or_below_pinned_tool_stays_local() {
        let mut store = LevelConfigStore::new();
        store.set_tool_level(tool("mutex"), SeverityLevel::Info);
        store.mark_acknowledged();
        store.clear_tool_level(&tool("mutex"));
        store.mark_acknowledged();

        store.set_default_level(SeverityLevel::Info);
        assert_eq!(escalations(&store).to_string(), "all@info");

        store.set_tool_level(tool("mutex"), SeverityLevel::Error);
        store.set_default_level(SeverityLevel::Debug);
        assert_eq!(escalations(&store).to_string(), "all@debug");
    }

    #[test]
    fn parses_wire_format() {
        let diff: ConfigDiff = "all@info:http@debug".parse().unwrap();
        assert_eq!(diff.len(), 2);
        assert!(diff.contains(&Scope::All, SeverityLevel::Info));
        assert!(diff.contains(&Scope::Tool(tool("http")), SeverityLevel::Debug));
        assert!("".parse::<ConfigDiff>().unwrap().is_empty());
        assert!("http".parse::<ConfigDiff>().is_err());
        assert!("http@loud".parse::<ConfigDiff>().is_err());
    }
}
