use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

/// Retry settings as they appear in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self::new(
            settings.max_attempts,
            Duration::from_millis(settings.base_delay_ms),
            Duration::from_millis(settings.max_delay_ms),
        )
    }

    pub fn exponential_backoff(&self, attempt: u32) -> Duration {
        let delay = (self.base_delay.as_millis() as u64).saturating_mul(2_u64.saturating_pow(attempt));
        Duration::from_millis(delay.min(self.max_delay.as_millis() as u64))
    }

    /// Add jitter to prevent thundering herd
    pub fn exponential_backoff_with_jitter(&self, attempt: u32) -> Duration {
        let base_delay = self.exponential_backoff(attempt);
        let jitter_ms = rand::random::<u64>() % (base_delay.as_millis() as u64 / 4 + 1);
        Duration::from_millis(base_delay.as_millis() as u64 + jitter_ms)
    }

    /// Retry with jitter while `is_transient` says the error may clear up.
    pub async fn retry_with_jitter<F, T, Fut, P>(&self, mut op: F, is_transient: P) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
        P: Fn(&anyhow::Error) -> bool,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.max_attempts || !is_transient(&e) {
                        return Err(e);
                    }
                    let delay = self.exponential_backoff_with_jitter(attempt - 1);
                    sleep(delay).await;
                }
            }
        }
    }
}
