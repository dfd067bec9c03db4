//! This module contains the in-memory history of received log lines.
//!
//! Lines are kept per tool in bounded windows; filtering for display happens
//! on read, in `crate::view`.
pub mod buffer;

pub use buffer::{ToolLogBuffers, DEFAULT_MAX_ENTRIES_PER_TOOL};
