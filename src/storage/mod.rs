//! This module defines the storage interfaces and implementations for the
//! console's persisted settings.
pub mod settings;

pub use settings::{SettingsStore, SledSettingsStore};
