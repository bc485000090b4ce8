//! Connector configuration
//!
//! Loaded from a JSON or YAML file. `${VAR}` and `${VAR:-default}`
//! placeholders are expanded from the environment before parsing, so the
//! API key can stay out of the file:
//!
//! ```yaml
//! apikey: ${FACTORIAL_API_KEY}
//! timeout_secs: 60
//! state_checkpoint_interval: 500
//! ```

use crate::error::{ConnectorError, Result};
use crate::streams::STREAM_NAMES;
use crate::types::SensitiveString;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;
use validator::{Validate, ValidationError};

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.factorialhr.com/api/v1/";

static ENV_VAR_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"\$\{([a-zA-Z_][a-zA-Z0-9_]*)(?::-([^}]*))?\}")
        .expect("env var regex pattern is invalid - this is a bug")
});

/// Factorial source configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate, JsonSchema)]
pub struct FactorialConfig {
    /// API key, sent as `Authorization: Bearer <apikey>`
    #[validate(custom(function = "validate_apikey"))]
    pub apikey: SensitiveString,

    /// API root; stream paths are resolved against it
    #[serde(default = "default_base_url")]
    #[validate(url)]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    #[validate(range(min = 1, max = 300))]
    pub timeout_secs: u64,

    /// Emit an employees checkpoint every N records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1))]
    pub state_checkpoint_interval: Option<usize>,

    /// Stream fetched by `check` to verify credentials; `check` only
    /// validates the config when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_check_stream"))]
    pub check_stream: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn validate_apikey(apikey: &SensitiveString) -> std::result::Result<(), ValidationError> {
    if apikey.is_blank() {
        let mut err = ValidationError::new("required");
        err.message = Some("apikey must not be empty".into());
        return Err(err);
    }
    Ok(())
}

fn validate_check_stream(stream: &str) -> std::result::Result<(), ValidationError> {
    if STREAM_NAMES.contains(&stream) {
        return Ok(());
    }
    let mut err = ValidationError::new("unknown_stream");
    let known = STREAM_NAMES.join(", ");
    err.message = Some(format!("check_stream '{stream}' is not one of {known}").into());
    Err(err)
}

impl FactorialConfig {
    /// Config with the given key and defaults for everything else
    pub fn new(apikey: impl Into<SensitiveString>) -> Self {
        Self {
            apikey: apikey.into(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            state_checkpoint_interval: None,
            check_stream: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_state_checkpoint_interval(mut self, interval: usize) -> Self {
        self.state_checkpoint_interval = Some(interval);
        self
    }

    pub fn with_check_stream(mut self, stream: impl Into<String>) -> Self {
        self.check_stream = Some(stream.into());
        self
    }

    /// Parse and validate a JSON value
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let config: Self = serde_json::from_value(value)
            .map_err(|e| ConnectorError::config(format!("invalid config: {e}")))?;
        config.validate_all()?;
        Ok(config)
    }

    /// Parse and validate YAML (or JSON) text, expanding env placeholders
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content);
        let config: Self = serde_yaml::from_str(&expanded)
            .map_err(|e| ConnectorError::config(format!("invalid config: {e}")))?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConnectorError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Run field validation, reporting failures as [`ConnectorError::Config`]
    pub fn validate_all(&self) -> Result<()> {
        self.validate()
            .map_err(|e| ConnectorError::config(e.to_string()))
    }

    /// Base URL with a trailing slash, so relative paths append to it
    pub fn base_url(&self) -> Result<reqwest::Url> {
        let mut raw = self.base_url.clone();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        reqwest::Url::parse(&raw).map_err(|e| {
            ConnectorError::config(format!("invalid base_url '{}': {e}", self.base_url))
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Expand `${VAR}` and `${VAR:-default}`; unset variables without a default
/// become empty strings
pub fn expand_env_vars(content: &str) -> String {
    ENV_VAR_REGEX
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default = caps.get(2).map(|m| m.as_str());
            std::env::var(var_name).unwrap_or_else(|_| default.unwrap_or("").to_string())
        })
        .to_string()
}
