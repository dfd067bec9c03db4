//! Log telemetry console: buffers log lines from a remote producer, filters
//! them for display and keeps the producer's severity configuration in step
//! with the user's.
pub mod app;
pub mod config;
pub mod console;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod network;
pub mod severity;
pub mod storage;
pub mod sync;
pub mod types;
pub mod view;
pub mod web;

pub use error::{TelemetryError, TelemetryResult};
pub use monitor::LogMonitor;
pub use severity::SeverityLevel;
pub use types::{LogEntry, ToolId};
