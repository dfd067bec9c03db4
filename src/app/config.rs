//! Runtime settings read from an optional TOML file and the command line.
use super::args::AppArgs;
use crate::error::TelemetryError;
use crate::logging::DEFAULT_MAX_ENTRIES_PER_TOOL;
use crate::sync::RetrySettings;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub max_entries_per_tool: usize,
    pub sync_interval_secs: u64,
    /// How long a config diff may wait for the producer's answer.
    pub ack_timeout_ms: u64,
    pub retry: RetrySettings,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            max_entries_per_tool: DEFAULT_MAX_ENTRIES_PER_TOOL,
            sync_interval_secs: 5,
            ack_timeout_ms: 3_000,
            retry: RetrySettings::default(),
        }
    }
}

impl ConsoleConfig {
    /// Builds the effective settings: file values first, then CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting values are out of range.
    pub fn resolve(args: &AppArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(max_entries) = args.max_entries {
            config.max_entries_per_tool = max_entries;
        }
        if let Some(secs) = args.sync_interval_secs {
            config.sync_interval_secs = secs;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid config file '{}'", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("failed to parse console config")?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Rejects a zero capacity, interval or timeout, and a retry base delay
    /// above its maximum.
    pub fn validate(&self) -> Result<()> {
        if self.max_entries_per_tool == 0 {
            return Err(TelemetryError::InvalidCapacity(0).into());
        }
        if self.sync_interval_secs == 0 {
            bail!("sync_interval_secs must be at least 1");
        }
        if self.ack_timeout_ms == 0 {
            bail!("ack_timeout_ms must be at least 1");
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            bail!(
                "retry.base_delay_ms ({}) exceeds retry.max_delay_ms ({})",
                self.retry.base_delay_ms,
                self.retry.max_delay_ms
            );
        }
        Ok(())
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }
}
