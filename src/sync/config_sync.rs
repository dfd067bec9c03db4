//! Pushes level escalations to the producer and records its acknowledgements.
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, error, info};

use super::retry::RetryPolicy;
use crate::config::ConfigDiff;
use crate::error::TelemetryError;
use crate::monitor::LogMonitor;
use crate::network::ProducerHandle;

/// What a sync pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The producer already has everything.
    UpToDate,
    /// Only reductions changed; they were absorbed without contacting the producer.
    AbsorbedLocally,
    /// The escalations were delivered and acknowledged.
    Delivered(ConfigDiff),
    /// A session reset happened while the diff was in flight; nothing recorded.
    Superseded,
}

pub struct ConfigSync {
    monitor: Arc<Mutex<LogMonitor>>,
    producer: ProducerHandle,
    retry: RetryPolicy,
    nudge: Arc<Notify>,
    pub interval: Duration,
}

impl ConfigSync {
    pub fn new(
        monitor: Arc<Mutex<LogMonitor>>,
        producer: ProducerHandle,
        retry: RetryPolicy,
        interval: Duration,
    ) -> Self {
        Self {
            monitor,
            producer,
            retry,
            nudge: Arc::new(Notify::new()),
            interval,
        }
    }

    /// A notifier that triggers a sync pass ahead of the next tick.
    pub fn nudger(&self) -> Arc<Notify> {
        self.nudge.clone()
    }

    /// Runs one sync pass.
    ///
    /// # Errors
    ///
    /// Returns the send error when the producer could not be reached or
    /// refused the diff. Nothing is acknowledged in that case, so the next
    /// pass sends the same changes again along with anything newer.
    pub async fn sync_once(&self) -> Result<SyncOutcome> {
        let (pending, epoch) = {
            let monitor = self.monitor.lock().await;
            (monitor.prepare_sync(), monitor.session_epoch())
        };

        let Some(pending) = pending else {
            return Ok(SyncOutcome::UpToDate);
        };

        if !pending.needs_delivery() {
            self.monitor.lock().await.acknowledge(&pending);
            debug!("Absorbed local-only changes '{}'", pending.changes);
            return Ok(SyncOutcome::AbsorbedLocally);
        }

        let diff = pending.escalations.clone();
        self.retry
            .retry_with_jitter(
                || self.producer.send_config_diff(&diff),
                |e| {
                    !matches!(
                        e.downcast_ref::<TelemetryError>(),
                        Some(TelemetryError::ProducerUnavailable)
                    )
                },
            )
            .await?;

        let mut monitor = self.monitor.lock().await;
        if monitor.session_epoch() != epoch {
            debug!("Session reset during sync, dropping acknowledgement of '{}'", diff);
            return Ok(SyncOutcome::Superseded);
        }
        monitor.acknowledge(&pending);
        info!("Producer acknowledged config '{}'", diff);
        Ok(SyncOutcome::Delivered(diff))
    }

    /// Runs sync passes on every tick and whenever nudged.
    pub async fn run(self) {
        let mut interval_timer = tokio::time::interval(self.interval);

        info!("Starting config sync with interval {:?}", self.interval);

        loop {
            tokio::select! {
                _ = interval_timer.tick() => {}
                _ = self.nudge.notified() => {}
            }

            match self.sync_once().await {
                Ok(_) => {}
                Err(e) if matches!(
                    e.downcast_ref::<TelemetryError>(),
                    Some(TelemetryError::ProducerUnavailable)
                ) =>
                {
                    debug!("No producer attached, config sync deferred");
                }
                Err(e) => error!("Config sync failed: {}", e),
            }
        }
    }
}
