//! Catalog types for describing available streams

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Catalog of the streams a source exposes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub streams: Vec<StreamDescriptor>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stream to the catalog
    pub fn add_stream(mut self, stream: StreamDescriptor) -> Self {
        self.streams.push(stream);
        self
    }

    /// Find a stream by name
    pub fn find_stream(&self, name: &str) -> Option<&StreamDescriptor> {
        self.streams.iter().find(|s| s.name == name)
    }

    /// Stream names in catalog order
    pub fn stream_names(&self) -> impl Iterator<Item = &str> {
        self.streams.iter().map(|s| s.name.as_str())
    }
}

/// Static description of one extractable resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Unique name of the stream (e.g. "employees")
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// JSON Schema of the stream's records
    pub json_schema: serde_json::Value,

    pub supported_sync_modes: Vec<SyncMode>,

    /// Cursor field path for incremental sync
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_cursor_field: Option<Vec<String>>,

    /// Primary key as a list of field paths
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_defined_primary_key: Option<Vec<Vec<String>>>,
}

impl StreamDescriptor {
    /// Create a full-refresh-only stream descriptor
    pub fn new(name: impl Into<String>, json_schema: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            json_schema,
            supported_sync_modes: vec![SyncMode::FullRefresh],
            default_cursor_field: None,
            source_defined_primary_key: None,
        }
    }

    pub fn namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = Some(ns.into());
        self
    }

    pub fn sync_modes(mut self, modes: Vec<SyncMode>) -> Self {
        self.supported_sync_modes = modes;
        self
    }

    /// Declare a top-level cursor field and enable incremental sync
    pub fn cursor_field(mut self, field: impl Into<String>) -> Self {
        self.default_cursor_field = Some(vec![field.into()]);
        if !self.supported_sync_modes.contains(&SyncMode::Incremental) {
            self.supported_sync_modes.push(SyncMode::Incremental);
        }
        self
    }

    /// Declare a single top-level primary key field
    pub fn primary_key(mut self, field: impl Into<String>) -> Self {
        self.source_defined_primary_key = Some(vec![vec![field.into()]]);
        self
    }

    pub fn supports(&self, mode: SyncMode) -> bool {
        self.supported_sync_modes.contains(&mode)
    }

    /// Get fully qualified name
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, self.name),
            None => self.name.clone(),
        }
    }
}

/// Sync mode for a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Re-read all data each sync
    #[default]
    FullRefresh,
    /// Read only data past the persisted cursor
    Incremental,
}

/// The host's selection of streams and sync modes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfiguredCatalog {
    pub streams: Vec<ConfiguredStream>,
}

impl ConfiguredCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select every stream of a catalog with its first supported sync mode
    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self {
            streams: catalog
                .streams
                .iter()
                .map(ConfiguredStream::from_stream)
                .collect(),
        }
    }

    pub fn add_stream(mut self, stream: ConfiguredStream) -> Self {
        self.streams.push(stream);
        self
    }

    pub fn find_stream(&self, name: &str) -> Option<&ConfiguredStream> {
        self.streams.iter().find(|s| s.stream.name == name)
    }
}

/// A stream as configured by the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfiguredStream {
    pub stream: StreamDescriptor,

    #[serde(default)]
    pub sync_mode: SyncMode,

    /// Cursor path chosen by the host; must match the stream's own cursor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor_field: Option<Vec<String>>,
}

impl ConfiguredStream {
    /// Create from a stream with default settings
    pub fn from_stream(stream: &StreamDescriptor) -> Self {
        let sync_mode = stream
            .supported_sync_modes
            .first()
            .copied()
            .unwrap_or_default();

        Self {
            stream: stream.clone(),
            sync_mode,
            cursor_field: stream.default_cursor_field.clone(),
        }
    }

    pub fn sync_mode(mut self, mode: SyncMode) -> Self {
        self.sync_mode = mode;
        self
    }

    pub fn cursor_field(mut self, path: Vec<String>) -> Self {
        self.cursor_field = Some(path);
        self
    }
}
