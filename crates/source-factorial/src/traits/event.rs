//! Source event types

use super::state::State;
use super::stream::Record;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An event produced while reading streams
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEvent {
    pub event_type: SourceEventType,

    /// Stream name this event belongs to
    pub stream: String,

    /// Time the connector produced the event
    pub timestamp: DateTime<Utc>,

    /// Record data, full sync state, or a log payload depending on type
    pub data: serde_json::Value,
}

impl SourceEvent {
    /// Create a record event
    pub fn record(stream: impl Into<String>, record: Record) -> Self {
        Self {
            event_type: SourceEventType::Record,
            stream: stream.into(),
            timestamp: Utc::now(),
            data: serde_json::Value::Object(record),
        }
    }

    /// Create a checkpoint event carrying the whole sync state
    pub fn state(stream: impl Into<String>, state: &State) -> Result<Self> {
        Ok(Self {
            event_type: SourceEventType::State,
            stream: stream.into(),
            timestamp: Utc::now(),
            data: serde_json::to_value(state)?,
        })
    }

    /// Create a log event about `stream`
    pub fn log(stream: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            event_type: SourceEventType::Log,
            stream: stream.into(),
            timestamp: Utc::now(),
            data: serde_json::json!({
                "level": level,
                "message": message.into(),
            }),
        }
    }

    pub fn is_record(&self) -> bool {
        self.event_type == SourceEventType::Record
    }

    pub fn is_state(&self) -> bool {
        self.event_type == SourceEventType::State
    }

    /// Decode the state carried by a checkpoint event
    pub fn as_state(&self) -> Option<State> {
        if !self.is_state() {
            return None;
        }
        serde_json::from_value(self.data.clone()).ok()
    }
}

/// Type of source event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceEventType {
    Record,
    State,
    Log,
}

impl SourceEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Record => "record",
            Self::State => "state",
            Self::Log => "log",
        }
    }
}

impl std::fmt::Display for SourceEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Log level for log events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}
