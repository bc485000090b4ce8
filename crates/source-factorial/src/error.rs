//! Error types for source-factorial
//!
//! Every fallible operation in the connector returns [`ConnectorError`].
//! Nothing is retried internally: errors propagate to the host, which owns
//! retry policy.

use thiserror::Error;

/// Result type alias for connector operations
pub type Result<T> = std::result::Result<T, ConnectorError>;

/// Maximum number of characters of a raw payload carried by an error
pub const SNIPPET_MAX_CHARS: usize = 256;

/// Status reported when a request exceeds its timeout
pub const TIMEOUT_STATUS: u16 = 408;

/// Errors that can occur while checking, discovering, or reading streams
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Missing or invalid configuration; raised before any network call
    #[error("configuration error: {0}")]
    Config(String),

    /// Fetching the configured check stream failed
    #[error("connection check failed: {0}")]
    ConnectionCheckFailed(String),

    /// The API answered with a non-success status (or the request timed out)
    #[error("request for stream '{stream}' failed with status {status}: {body}")]
    RequestFailed {
        stream: String,
        status: u16,
        body: String,
    },

    /// A response body could not be interpreted as the stream expects
    #[error("failed to parse response for stream '{stream}': {snippet}")]
    Parse { stream: String, snippet: String },

    /// Transport failure before any HTTP status was received
    #[error("connection error: {0}")]
    Connection(String),

    /// A schema document is internally inconsistent
    #[error("schema error: {0}")]
    Schema(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConnectorError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a request failure from a status and raw body
    pub fn request_failed(stream: impl Into<String>, status: u16, body: &[u8]) -> Self {
        Self::RequestFailed {
            stream: stream.into(),
            status,
            body: snippet(body),
        }
    }

    /// Create a parse error carrying a snippet of the offending payload
    pub fn parse(stream: impl Into<String>, payload: &[u8]) -> Self {
        Self::Parse {
            stream: stream.into(),
            snippet: snippet(payload),
        }
    }

    /// HTTP status for request failures
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this error aborts the sync before any request is made
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Lossy UTF-8 view of a payload, cut to [`SNIPPET_MAX_CHARS`]
pub fn snippet(payload: &[u8]) -> String {
    let text = String::from_utf8_lossy(payload);
    let text = text.trim();
    if text.chars().count() <= SNIPPET_MAX_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(SNIPPET_MAX_CHARS - 3).collect();
    cut.push_str("...");
    cut
}
