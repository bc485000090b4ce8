//! Connector specification types

use super::catalog::SyncMode;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Connector specification describing its capabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorSpec {
    /// Connector type identifier (e.g. "source-factorial")
    pub connector_type: String,

    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    /// JSON Schema for the connector's configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_specification: Option<serde_json::Value>,

    pub supported_sync_modes: Vec<SyncMode>,

    pub supports_incremental: bool,
}

impl ConnectorSpec {
    /// Create a builder for fluent construction
    pub fn builder(
        connector_type: impl Into<String>,
        version: impl Into<String>,
    ) -> ConnectorSpecBuilder {
        ConnectorSpecBuilder::new(connector_type, version)
    }
}

/// Builder for ConnectorSpec
#[derive(Debug)]
pub struct ConnectorSpecBuilder {
    spec: ConnectorSpec,
}

impl ConnectorSpecBuilder {
    pub fn new(connector_type: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            spec: ConnectorSpec {
                connector_type: connector_type.into(),
                version: version.into(),
                description: None,
                documentation_url: None,
                license: None,
                connection_specification: None,
                supported_sync_modes: vec![SyncMode::FullRefresh],
                supports_incremental: false,
            },
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.spec.description = Some(desc.into());
        self
    }

    pub fn documentation_url(mut self, url: impl Into<String>) -> Self {
        self.spec.documentation_url = Some(url.into());
        self
    }

    pub fn license(mut self, license: impl Into<String>) -> Self {
        self.spec.license = Some(license.into());
        self
    }

    /// Set the configuration schema from a type implementing JsonSchema
    pub fn config_schema<T: JsonSchema>(mut self) -> Self {
        let schema = schemars::schema_for!(T);
        self.spec.connection_specification = Some(serde_json::to_value(schema).unwrap_or_default());
        self
    }

    /// Enable incremental sync support
    pub fn incremental(mut self, supported: bool) -> Self {
        self.spec.supports_incremental = supported;
        if supported && !self.spec.supported_sync_modes.contains(&SyncMode::Incremental) {
            self.spec.supported_sync_modes.push(SyncMode::Incremental);
        }
        self
    }

    pub fn build(self) -> ConnectorSpec {
        self.spec
    }
}
