use super::config::ConsoleConfig;
use crate::console::Console;
use crate::monitor::LogMonitor;
use crate::network::ProducerLink;
use crate::storage::{SettingsStore, SledSettingsStore};
use crate::sync::{ConfigSync, RetryPolicy};
use crate::web;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

pub async fn run(config: ConsoleConfig, db: sled::Db, port: u16) -> Result<()> {
    let settings = Arc::new(SledSettingsStore::new(db)?);
    let view = settings.load_view().await?;
    info!(
        "Restored view: tool '{}', default level {}, {} overrides",
        view.current_tool,
        view.default_level,
        view.levels_by_tool.len()
    );

    let monitor = Arc::new(Mutex::new(LogMonitor::restore(
        view,
        config.max_entries_per_tool,
    )?));

    let (producer_link, producer) = ProducerLink::new(config.ack_timeout());
    tokio::spawn(async move {
        if let Err(e) = producer_link.run().await {
            error!("Producer link error: {}", e);
        }
    });

    let config_sync = ConfigSync::new(
        monitor.clone(),
        producer.clone(),
        RetryPolicy::from_settings(&config.retry),
        config.sync_interval(),
    );
    let sync_nudge = config_sync.nudger();
    tokio::spawn(config_sync.run());

    let console = Arc::new(Console::new(monitor, settings, producer, sync_nudge));

    web::start_server(console, port).await
}
