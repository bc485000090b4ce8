//! Sync state for incremental reads
//!
//! State maps a stream name to the last cursor value persisted for it. The
//! host supplies it at sync start and persists every `STATE` message the
//! connector emits. A stream's entry is replaced wholesale on each
//! checkpoint, never patched field by field.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-stream cursor state for a whole sync
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    pub streams: BTreeMap<String, StreamState>,
}

impl State {
    /// Create empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for constructing state
    pub fn builder() -> StateBuilder {
        StateBuilder::new()
    }

    /// Get state for a specific stream
    pub fn get_stream(&self, stream_name: &str) -> Option<&StreamState> {
        self.streams.get(stream_name)
    }

    /// Replace the state of one stream
    pub fn set_stream(&mut self, state: StreamState) {
        self.streams.insert(state.stream_name.clone(), state);
    }

    /// Cursor value persisted for a stream
    pub fn cursor_value(&self, stream_name: &str) -> Option<&serde_json::Value> {
        self.streams
            .get(stream_name)
            .and_then(|s| s.cursor_value.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn stream_names(&self) -> impl Iterator<Item = &str> {
        self.streams.keys().map(|s| s.as_str())
    }
}

/// Builder for constructing State
#[derive(Debug, Default)]
pub struct StateBuilder {
    state: State,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stream with cursor
    pub fn stream_cursor(
        mut self,
        stream_name: impl Into<String>,
        cursor_field: impl Into<String>,
        cursor_value: serde_json::Value,
    ) -> Self {
        self.state
            .set_stream(StreamState::new(stream_name).cursor(cursor_field, cursor_value));
        self
    }

    pub fn build(self) -> State {
        self.state
    }
}

/// State for a single stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamState {
    pub stream_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor_field: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor_value: Option<serde_json::Value>,
}

impl StreamState {
    pub fn new(stream_name: impl Into<String>) -> Self {
        Self {
            stream_name: stream_name.into(),
            cursor_field: None,
            cursor_value: None,
        }
    }

    /// Set cursor (builder style)
    pub fn cursor(mut self, field: impl Into<String>, value: serde_json::Value) -> Self {
        self.cursor_field = Some(field.into());
        self.cursor_value = Some(value);
        self
    }

    pub fn cursor_as_str(&self) -> Option<&str> {
        self.cursor_value.as_ref().and_then(|v| v.as_str())
    }
}
