//! Severity configuration: the desired levels, the producer's acknowledged
//! view of them, and the diff between the two.
pub mod diff;
pub mod store;

pub use diff::{
    compute_changes, escalations, prepare_sync, ConfigChange, ConfigDiff, PendingSync,
};
pub use store::{AckSnapshot, LevelConfigStore, LevelSnapshot, Scope};
