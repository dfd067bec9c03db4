//! Read-side of the console: what is visible, and what the badges say.
pub mod alerts;
pub mod filter;
pub mod visibility;

pub use alerts::{counts, per_entity_alerts, AlertCounts, AlertTally, INFO_DISPLAY_CEILING};
pub use filter::UIFilter;
pub use visibility::{view_mode, visible_entries, ViewMode};
