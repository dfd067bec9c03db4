use crate::error::{TelemetryError, TelemetryResult};
use crate::severity::{self, SeverityLevel};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The diagnostic tools the console knows about up front.
///
/// Buffers exist for these from startup; any other id seen on the wire gets
/// a buffer of its own on first arrival.
pub const KNOWN_TOOLS: [&str; 8] = [
    "core",
    "network",
    "codec",
    "filter",
    "mutex",
    "http",
    "scheduler",
    "storage",
];

/// Identifier of a diagnostic tool.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct ToolId(String);

impl ToolId {
    /// Name of the pseudo tool that stands for the global default.
    pub const ALL_SCOPE: &'static str = "all";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Validates a tool name coming from outside: surrounding whitespace is
    /// dropped, and empty names and the `all` pseudo tool are rejected.
    pub fn parse(name: &str) -> TelemetryResult<Self> {
        let name = name.trim();
        if name.is_empty() || name == Self::ALL_SCOPE {
            return Err(TelemetryError::InvalidTool(name.to_string()));
        }
        Ok(Self::new(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_known(&self) -> bool {
        KNOWN_TOOLS.contains(&self.0.as_str())
    }

    pub fn known() -> impl Iterator<Item = ToolId> {
        KNOWN_TOOLS.iter().map(|name| ToolId::new(*name))
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ToolId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Identifier of the object that emitted a line, either numeric or named.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum CallerId {
    Numeric(i64),
    Named(String),
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallerId::Numeric(id) => write!(f, "{}", id),
            CallerId::Named(name) => f.write_str(name),
        }
    }
}

/// A single log line as received from the producer. Never mutated once stored.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LogEntry {
    pub timestamp: i64,
    pub tool: ToolId,
    #[serde(with = "severity::as_code")]
    pub level: SeverityLevel,
    pub message: String,
    #[serde(default, rename = "threadId", skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<u64>,
    #[serde(default, rename = "callerId", skip_serializing_if = "Option::is_none")]
    pub caller_id: Option<CallerId>,
}

impl LogEntry {
    pub fn new(
        timestamp: i64,
        tool: impl Into<ToolId>,
        level: SeverityLevel,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            tool: tool.into(),
            level,
            message: message.into(),
            thread_id: None,
            caller_id: None,
        }
    }

    pub fn with_thread(mut self, thread_id: u64) -> Self {
        self.thread_id = Some(thread_id);
        self
    }

    pub fn with_caller(mut self, caller_id: CallerId) -> Self {
        self.caller_id = Some(caller_id);
        self
    }

    /// Entity keys this line can be grouped or filtered by: `t:<thread>` and
    /// `c:<caller>`.
    pub fn entity_keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(2);
        if let Some(thread_id) = self.thread_id {
            keys.push(format!("t:{}", thread_id));
        }
        if let Some(caller_id) = &self.caller_id {
            keys.push(format!("c:{}", caller_id));
        }
        keys
    }
}
