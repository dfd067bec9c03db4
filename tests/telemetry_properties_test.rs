//! End-to-end properties of the console state: visibility, buffering and the
//! escalation-only config diff.

use log_console::config::Scope;
use log_console::view::{AlertCounts, UIFilter, ViewMode};
use log_console::{LogEntry, LogMonitor, SeverityLevel, ToolId};

fn tool(name: &str) -> ToolId {
    ToolId::from(name)
}

fn one_of_each(tool_name: &str, start: i64) -> Vec<LogEntry> {
    SeverityLevel::ALL
        .iter()
        .enumerate()
        .map(|(i, level)| LogEntry::new(start + i as i64, tool_name, *level, level.as_str()))
        .collect()
}

/// Sends whatever must reach the producer and records it as acknowledged.
/// Returns the wire text, or `None` when nothing had to be sent.
fn deliver(monitor: &mut LogMonitor) -> Option<String> {
    let pending = monitor.prepare_sync()?;
    let sent = pending
        .needs_delivery()
        .then(|| pending.escalations.to_string());
    monitor.acknowledge(&pending);
    sent
}

#[test]
fn test_quiet_threshold_is_exact_match() {
    let mut monitor = LogMonitor::new(100).unwrap();
    monitor.on_entries_received(&tool("codec"), one_of_each("codec", 0));
    monitor.set_current_tool(tool("codec"));

    let visible = monitor.visible_entries();
    assert_eq!(visible.len(), 1);
    assert!(visible.iter().all(|e| e.level == SeverityLevel::Quiet));
}

#[test]
fn test_raising_threshold_only_adds_lines() {
    let mut monitor = LogMonitor::new(100).unwrap();
    monitor.on_entries_received(&tool("http"), one_of_each("http", 0));
    monitor.on_entries_received(&tool("http"), one_of_each("http", 10));
    monitor.set_current_tool(tool("http"));

    let mut previous: Vec<LogEntry> = Vec::new();
    for level in SeverityLevel::ALL {
        monitor.set_tool_level(tool("http"), level);
        let visible = monitor.visible_entries();
        assert!(
            previous.iter().all(|e| visible.contains(e)),
            "lines disappeared when raising to {}",
            level
        );
        assert!(visible.len() >= previous.len());
        previous = visible;
    }
    assert_eq!(previous.len(), 10);
}

#[test]
fn test_history_survives_tool_switches() {
    let mut monitor = LogMonitor::new(100).unwrap();
    monitor.set_default_level(SeverityLevel::Debug);

    let a: Vec<LogEntry> = (0..4)
        .map(|ts| LogEntry::new(ts, "filter", SeverityLevel::Info, format!("a{}", ts)))
        .collect();
    monitor.on_entries_received(&tool("filter"), a.clone());

    monitor.set_current_tool(tool("mutex"));
    monitor.on_entries_received(
        &tool("mutex"),
        (10..13)
            .map(|ts| LogEntry::new(ts, "mutex", SeverityLevel::Info, "b"))
            .collect(),
    );
    assert_eq!(monitor.visible_entries().len(), 3);

    monitor.set_current_tool(tool("filter"));
    assert_eq!(monitor.visible_entries(), a);
}

#[test]
fn test_buffer_keeps_most_recent_lines() {
    let mut monitor = LogMonitor::new(5).unwrap();
    monitor.set_default_level(SeverityLevel::Debug);
    for ts in 0..12 {
        monitor.on_entries_received(
            &tool("core"),
            vec![LogEntry::new(ts, "core", SeverityLevel::Info, "tick")],
        );
    }

    let stamps: Vec<i64> = monitor.visible_entries().iter().map(|e| e.timestamp).collect();
    assert_eq!(stamps, vec![7, 8, 9, 10, 11]);

    monitor.set_capacity(2).unwrap();
    let stamps: Vec<i64> = monitor.visible_entries().iter().map(|e| e.timestamp).collect();
    assert_eq!(stamps, vec![10, 11]);

    assert!(monitor.set_capacity(0).is_err());
    assert_eq!(monitor.buffers().capacity(), 2);
}

#[test]
fn test_reduce_then_restore_is_not_resent() {
    let mut monitor = LogMonitor::new(10).unwrap();
    monitor.set_tool_level(tool("codec"), SeverityLevel::Debug);
    assert_eq!(deliver(&mut monitor).as_deref(), Some("all@quiet:codec@debug"));

    monitor.set_tool_level(tool("codec"), SeverityLevel::Warning);
    assert_eq!(deliver(&mut monitor), None);

    monitor.set_tool_level(tool("codec"), SeverityLevel::Debug);
    assert_eq!(deliver(&mut monitor), None);
    assert!(monitor.pending_changes().is_empty());
    assert_eq!(
        monitor
            .config()
            .acknowledged_ceiling(&Scope::Tool(tool("codec"))),
        Some(SeverityLevel::Debug)
    );
}

#[test]
fn test_first_sync_sends_default_then_overrides() {
    let mut monitor = LogMonitor::new(10).unwrap();
    monitor.set_default_level(SeverityLevel::Info);
    monitor.set_tool_level(tool("http"), SeverityLevel::Debug);

    let diff = monitor.pending_changes();
    assert_eq!(diff.len(), 2);
    assert_eq!(diff.to_string(), "all@info:http@debug");
    assert_eq!(deliver(&mut monitor).as_deref(), Some("all@info:http@debug"));
}

#[test]
fn test_aggregate_view_merges_errors_from_all_tools() {
    let mut monitor = LogMonitor::new(100).unwrap();
    monitor.on_entries_received(&tool("codec"), one_of_each("codec", 0));
    monitor.on_entries_received(&tool("http"), one_of_each("http", 3));
    monitor.set_ui_filter(Some(UIFilter::by_levels([SeverityLevel::Error])));

    assert_eq!(monitor.view_mode(), ViewMode::Aggregate);
    let visible = monitor.visible_entries();
    let seen: Vec<(i64, &str)> = visible
        .iter()
        .map(|e| (e.timestamp, e.tool.as_str()))
        .collect();
    assert_eq!(seen, vec![(1, "codec"), (4, "http")]);
}

#[test]
fn test_counts_never_include_debug() {
    let mut monitor = LogMonitor::new(100).unwrap();
    monitor.set_default_level(SeverityLevel::Debug);
    monitor.on_entries_received(&tool("codec"), one_of_each("codec", 0));
    monitor.on_entries_received(&tool("http"), one_of_each("http", 10));

    assert_eq!(
        monitor.counts(),
        AlertCounts {
            error: 2,
            warning: 2,
            info: 2
        }
    );
}

#[test]
fn test_filter_codec_mutex_scenario() {
    let mut monitor = LogMonitor::new(100).unwrap();
    monitor.set_tool_level(tool("filter"), SeverityLevel::Info);
    monitor.mark_acknowledged();

    monitor.set_current_tool(tool("filter"));
    monitor.on_entries_received(
        &tool("filter"),
        vec![
            LogEntry::new(1, "filter", SeverityLevel::Error, "caps negotiation failed"),
            LogEntry::new(2, "filter", SeverityLevel::Error, "pad not linked"),
        ],
    );
    let original = monitor.visible_entries();
    assert_eq!(original.len(), 2);

    monitor.set_tool_level(tool("codec"), SeverityLevel::Warning);
    monitor.set_tool_level(tool("mutex"), SeverityLevel::Info);
    assert_eq!(monitor.pending_changes().to_string(), "codec@warning:mutex@info");
    assert_eq!(deliver(&mut monitor).as_deref(), Some("codec@warning:mutex@info"));

    monitor.set_current_tool(tool("codec"));
    monitor.set_current_tool(tool("filter"));
    assert_eq!(monitor.visible_entries(), original);
}

#[test]
fn test_unlisted_tool_lines_are_kept() {
    let mut monitor = LogMonitor::new(10).unwrap();
    let custom = tool("vendor-plugin");
    assert!(!custom.is_known());

    monitor.on_entries_received(&custom, vec![LogEntry::new(1, "vendor-plugin", SeverityLevel::Quiet, "x")]);
    monitor.set_current_tool(custom.clone());
    assert_eq!(monitor.visible_entries().len(), 1);
}
