//! This module connects the console to the remote log producer.
//!
//! The `ProducerLink` task owns the producer connection; the rest of the
//! application talks to it through a cloneable `ProducerHandle`.
mod frame;
mod handle;
mod link;
mod message;

pub use frame::{InboundFrame, OutboundFrame};
pub use handle::ProducerHandle;
pub use link::ProducerLink;
pub use message::{LinkStatus, ProducerCommand, ProducerResponse};
