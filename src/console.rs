//! The application-level entry point shared by the HTTP API and the producer
//! socket.
use crate::monitor::LogMonitor;
use crate::network::ProducerHandle;
use crate::severity::SeverityLevel;
use crate::storage::SettingsStore;
use crate::types::{LogEntry, ToolId};
use crate::view::UIFilter;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use tracing::debug;

pub struct Console {
    pub monitor: Arc<Mutex<LogMonitor>>,
    pub settings: Arc<dyn SettingsStore + Send + Sync>,
    pub producer: ProducerHandle,
    pub sync_nudge: Arc<Notify>,
    pub started_at: DateTime<Utc>,
    /// Held from snapshot to write so saves land in mutation order.
    save_lock: Mutex<()>,
}

impl Console {
    pub fn new(
        monitor: Arc<Mutex<LogMonitor>>,
        settings: Arc<dyn SettingsStore + Send + Sync>,
        producer: ProducerHandle,
        sync_nudge: Arc<Notify>,
    ) -> Self {
        Self {
            monitor,
            settings,
            producer,
            sync_nudge,
            started_at: Utc::now(),
            save_lock: Mutex::new(()),
        }
    }

    /// Stores a batch of lines delivered by the producer.
    pub async fn receive_entries(&self, tool: &ToolId, entries: Vec<LogEntry>) {
        let count = entries.len();
        self.monitor.lock().await.on_entries_received(tool, entries);
        debug!("Stored {} lines for '{}'", count, tool);
    }

    /// # Errors
    ///
    /// Returns an error if the view settings cannot be saved.
    pub async fn set_current_tool(&self, tool: ToolId) -> Result<()> {
        self.update_view(|monitor| monitor.set_current_tool(tool)).await
    }

    /// # Errors
    ///
    /// Returns an error if the view settings cannot be saved.
    pub async fn set_default_level(&self, level: SeverityLevel) -> Result<()> {
        self.update_levels(|monitor| monitor.set_default_level(level))
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the view settings cannot be saved.
    pub async fn set_tool_level(&self, tool: ToolId, level: SeverityLevel) -> Result<()> {
        self.update_levels(|monitor| monitor.set_tool_level(tool, level))
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the view settings cannot be saved.
    pub async fn clear_tool_level(&self, tool: &ToolId) -> Result<()> {
        self.update_levels(|monitor| {
            monitor.clear_tool_level(tool);
        })
        .await
    }

    pub async fn set_ui_filter(&self, filter: Option<UIFilter>) {
        self.monitor.lock().await.set_ui_filter(filter);
    }

    /// Prepares for a freshly connected producer, which knows nothing of
    /// earlier config diffs.
    pub async fn producer_connected(&self) {
        self.monitor.lock().await.forget_acknowledgement();
        self.sync_nudge.notify_one();
    }

    /// Clears all lines and makes the next sync re-announce the full config.
    pub async fn reset_session(&self) {
        self.monitor.lock().await.reset_session();
        self.sync_nudge.notify_one();
    }

    /// Applies a level change, persists it and wakes the sync loop.
    async fn update_levels<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut LogMonitor),
    {
        let saved = self.update_view(change).await;
        self.sync_nudge.notify_one();
        saved
    }

    async fn update_view<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut LogMonitor),
    {
        let _saving = self.save_lock.lock().await;
        let view = {
            let mut monitor = self.monitor.lock().await;
            change(&mut monitor);
            monitor.persisted_view()
        };
        self.settings.save_view(&view).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::ProducerLink;
    use crate::storage::SledSettingsStore;
    use std::time::Duration;

    fn test_console() -> (Arc<Console>, Arc<SledSettingsStore>) {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let settings = Arc::new(SledSettingsStore::new(db).unwrap());
        let (link, producer) = ProducerLink::new(Duration::from_secs(1));
        tokio::spawn(link.run());

        let console = Console::new(
            Arc::new(Mutex::new(LogMonitor::new(10).unwrap())),
            settings.clone(),
            producer,
            Arc::new(Notify::new()),
        );
        (Arc::new(console), settings)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_level_changes_are_all_saved() {
        let (console, settings) = test_console();

        let tasks: Vec<_> = ToolId::known()
            .map(|tool| {
                let console = console.clone();
                tokio::spawn(async move {
                    console.set_tool_level(tool, SeverityLevel::Debug).await
                })
            })
            .collect();
        for task in futures::future::join_all(tasks).await {
            task.unwrap().unwrap();
        }

        let saved = settings.load_view().await.unwrap();
        assert_eq!(saved.levels_by_tool.len(), ToolId::known().count());
        assert_eq!(saved, console.monitor.lock().await.persisted_view());
    }

    #[tokio::test]
    async fn ui_filter_is_not_saved() {
        let (console, settings) = test_console();
        console.set_current_tool(ToolId::from("http")).await.unwrap();
        console
            .set_ui_filter(Some(UIFilter::by_levels([SeverityLevel::Error])))
            .await;

        let saved = settings.load_view().await.unwrap();
        assert_eq!(saved.current_tool, ToolId::from("http"));
        assert_eq!(saved, console.monitor.lock().await.persisted_view());
    }
}
