//! This module defines the messages that are sent to and from the `ProducerLink`.
use super::frame::OutboundFrame;
use crate::config::ConfigDiff;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// A response from the `ProducerLink`.
#[derive(Debug)]
pub enum ProducerResponse {
    /// The producer acknowledged the config diff.
    Acknowledged,
    /// The producer refused the config diff.
    Rejected(String),
    /// No producer is attached, or it went away before answering.
    Unavailable,
    /// The current state of the link.
    Status(LinkStatus),
}

/// Snapshot of the link state.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct LinkStatus {
    /// The attached producer connection, if any.
    pub connection: Option<Uuid>,
    /// Config diffs sent but not answered yet.
    pub awaiting_ack: usize,
}

/// A command to be sent to the `ProducerLink`.
#[derive(Debug)]
pub enum ProducerCommand {
    /// A producer connected; frames for it go to `outbound`.
    Attach {
        /// The id of the new connection.
        connection: Uuid,
        /// The channel feeding the connection's socket.
        outbound: mpsc::UnboundedSender<OutboundFrame>,
    },
    /// A producer connection closed.
    Detach {
        /// The id of the closed connection.
        connection: Uuid,
    },
    /// Send a config diff and report the producer's answer.
    SendConfig {
        /// The diff to send.
        diff: ConfigDiff,
        /// The channel to send the response on.
        response: oneshot::Sender<ProducerResponse>,
    },
    /// The producer answered a config diff.
    Answer {
        /// The connection the answer arrived on.
        connection: Uuid,
        /// The diff id being answered; `None` answers the oldest.
        id: Option<u64>,
        /// Whether the diff was applied.
        accepted: bool,
        /// The producer's reason for refusing, if any.
        reason: Option<String>,
    },
    /// Report the link state.
    Status {
        /// The channel to send the response on.
        response: oneshot::Sender<ProducerResponse>,
    },
}
