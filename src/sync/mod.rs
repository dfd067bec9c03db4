//! This module keeps the producer's level configuration in step with the
//! console's.
pub mod config_sync;
pub mod retry;

pub use config_sync::{ConfigSync, SyncOutcome};
pub use retry::{RetryPolicy, RetrySettings};
