//! Wire messages exchanged with the host
//!
//! Every message is one JSON document on its own line, tagged by `type`:
//!
//! ```json
//! {"type":"RECORD","record":{"stream":"fac","data":{"id":1},"emitted_at":1700000000000}}
//! {"type":"STATE","state":{"data":{"streams":{...}}}}
//! ```

use crate::error::Result;
use crate::traits::{Catalog, CheckResult, ConnectorSpec, LogLevel, SourceEvent, SourceEventType};
use serde::{Deserialize, Serialize};

/// A protocol message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    Spec { spec: ConnectorSpec },
    ConnectionStatus { connection_status: ConnectionStatus },
    Catalog { catalog: Catalog },
    Record { record: RecordMessage },
    State { state: StateMessage },
    Log { log: LogMessage },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMessage {
    pub stream: String,
    pub data: serde_json::Value,
    /// Milliseconds since the Unix epoch
    pub emitted_at: i64,
}

/// Whole sync state, to be persisted by the host as-is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMessage {
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogMessage {
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Succeeded,
    Failed,
}

impl Message {
    pub fn spec(spec: ConnectorSpec) -> Self {
        Self::Spec { spec }
    }

    pub fn catalog(catalog: Catalog) -> Self {
        Self::Catalog { catalog }
    }

    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Self::Log {
            log: LogMessage {
                level,
                message: message.into(),
            },
        }
    }

    /// Serialize as a single line, without the trailing newline
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<&CheckResult> for Message {
    fn from(result: &CheckResult) -> Self {
        Self::ConnectionStatus {
            connection_status: ConnectionStatus {
                status: if result.is_success() {
                    Status::Succeeded
                } else {
                    Status::Failed
                },
                message: result.message.clone(),
            },
        }
    }
}

impl From<SourceEvent> for Message {
    fn from(event: SourceEvent) -> Self {
        match event.event_type {
            SourceEventType::Record => Self::Record {
                record: RecordMessage {
                    stream: event.stream,
                    data: event.data,
                    emitted_at: event.timestamp.timestamp_millis(),
                },
            },
            SourceEventType::State => Self::State {
                state: StateMessage { data: event.data },
            },
            SourceEventType::Log => {
                let level = event
                    .data
                    .get("level")
                    .and_then(|l| serde_json::from_value(l.clone()).ok())
                    .unwrap_or(LogLevel::Info);
                let message = event
                    .data
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or_default()
                    .to_string();
                Self::log(level, message)
            }
        }
    }
}
