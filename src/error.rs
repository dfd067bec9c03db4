//! Error types shared by the telemetry core and the producer link.
use thiserror::Error;

/// Errors surfaced by the log console.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A buffer capacity of zero was requested.
    #[error("invalid buffer capacity {0}: must be at least 1")]
    InvalidCapacity(usize),

    /// A severity name or code that is not part of the scale.
    #[error("unknown severity level '{0}'")]
    UnknownLevel(String),

    /// A tool name that is empty or names the `all` pseudo tool.
    #[error("invalid tool name '{0}'")]
    InvalidTool(String),

    /// A `scope@level` pair that could not be parsed.
    #[error("invalid config change '{0}'")]
    InvalidChange(String),

    /// No producer is attached to receive a config diff.
    #[error("log producer is not attached")]
    ProducerUnavailable,

    /// The producer answered a config diff with a rejection.
    #[error("log producer rejected config: {0}")]
    ProducerRejected(String),

    /// The producer did not acknowledge a config diff in time.
    #[error("log producer did not acknowledge within {0} ms")]
    AckTimeout(u64),

    /// The settings store failed.
    #[error("settings storage error: {0}")]
    Storage(#[from] sled::Error),
}

pub type TelemetryResult<T> = std::result::Result<T, TelemetryError>;
