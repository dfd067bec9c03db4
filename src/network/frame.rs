//! JSON frames exchanged with the log producer over its WebSocket.
use crate::types::{LogEntry, ToolId};
use serde::{Deserialize, Serialize};

/// A frame sent by the producer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    /// A batch of log lines for one tool.
    Entries {
        tool: ToolId,
        entries: Vec<LogEntry>,
    },
    /// The producer applied a config diff.
    Ack {
        #[serde(default)]
        id: Option<u64>,
    },
    /// The producer refused a config diff.
    Nack {
        #[serde(default)]
        id: Option<u64>,
        #[serde(default)]
        reason: Option<String>,
    },
}

/// A frame sent to the producer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// A config diff in `scope@level:scope@level` form.
    Config { id: u64, diff: String },
}
