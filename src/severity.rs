//! The five-step severity scale shared by the console and the log producer.
use crate::error::TelemetryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a log line, ordered from least to most verbose.
///
/// The declaration order is the rank order, so the derived `Ord` matches
/// `rank()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    #[default]
    Quiet,
    Error,
    Warning,
    Info,
    Debug,
}

impl SeverityLevel {
    /// Every level, in rank order.
    pub const ALL: [SeverityLevel; 5] = [
        SeverityLevel::Quiet,
        SeverityLevel::Error,
        SeverityLevel::Warning,
        SeverityLevel::Info,
        SeverityLevel::Debug,
    ];

    /// Stable integer code, also used on the wire.
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn from_rank(rank: u8) -> Option<Self> {
        Self::ALL.get(rank as usize).copied()
    }

    /// `true` when `self` is no more verbose than `other`.
    pub fn at_most(self, other: SeverityLevel) -> bool {
        self.rank() <= other.rank()
    }

    /// Whether a line at `self` passes a threshold of `threshold`.
    ///
    /// A `Quiet` threshold admits only `Quiet` lines, mirroring how the
    /// producer treats its own quiet setting.
    pub fn passes(self, threshold: SeverityLevel) -> bool {
        match threshold {
            SeverityLevel::Quiet => self == SeverityLevel::Quiet,
            _ => self.at_most(threshold),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SeverityLevel::Quiet => "quiet",
            SeverityLevel::Error => "error",
            SeverityLevel::Warning => "warning",
            SeverityLevel::Info => "info",
            SeverityLevel::Debug => "debug",
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeverityLevel {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quiet" => Ok(SeverityLevel::Quiet),
            "error" => Ok(SeverityLevel::Error),
            "warning" | "warn" => Ok(SeverityLevel::Warning),
            "info" => Ok(SeverityLevel::Info),
            "debug" => Ok(SeverityLevel::Debug),
            _ => Err(TelemetryError::UnknownLevel(s.to_string())),
        }
    }
}

impl TryFrom<u8> for SeverityLevel {
    type Error = TelemetryError;

    fn try_from(rank: u8) -> Result<Self, TelemetryError> {
        Self::from_rank(rank).ok_or_else(|| TelemetryError::UnknownLevel(rank.to_string()))
    }
}

impl From<SeverityLevel> for u8 {
    fn from(level: SeverityLevel) -> Self {
        level.rank()
    }
}

/// Serde adapter for fields carried as the integer code on the wire.
pub mod as_code {
    use super::SeverityLevel;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(level: &SeverityLevel, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(level.rank())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SeverityLevel, D::Error> {
        let code = u8::deserialize(deserializer)?;
        SeverityLevel::try_from(code).map_err(D::Error::custom)
    }
}
