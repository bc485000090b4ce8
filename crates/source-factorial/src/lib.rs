//! source-factorial - Factorial HR API source connector
//!
//! Pulls `customers`, `employees`, and `fac` records from the Factorial API
//! and emits them as protocol messages for a data-integration host.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  FactorialSource      spec / check / discover / read     │
//! ├──────────────────────────────────────────────────────────┤
//! │  StreamReader         page loop, timeout, state folding  │
//! ├──────────────────────────────────────────────────────────┤
//! │  Streams              customers, employees, fac          │
//! │  Authenticators       TokenAuthenticator, NoAuth         │
//! │  SchemaRegistry       static JSON Schema per stream      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Library usage
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use source_factorial::prelude::*;
//!
//! let config = FactorialConfig::from_file("config.yaml")?;
//! let source = FactorialSource::new();
//! let catalog = ConfiguredCatalog::from_catalog(&source.discover(&config).await?);
//!
//! let mut events = source.read(&config, &catalog, None).await?;
//! while let Some(event) = events.next().await {
//!     println!("{}", Message::from(event?).to_json_line()?);
//! }
//! ```
//!
//! # CLI usage
//!
//! ```bash
//! source-factorial spec
//! source-factorial check --config config.yaml
//! source-factorial discover --config config.yaml
//! source-factorial read --config config.yaml --catalog catalog.json --state state.json
//! ```

// Schema literals nest deeply enough to exceed the default json! recursion limit
#![recursion_limit = "512"]

// Core contracts (Source, HttpStream, Catalog, State, ...)
pub mod traits;
// Common types (SensitiveString)
pub mod types;
// Error types
pub mod error;

pub mod auth;
pub mod config;
pub mod protocol;
pub mod reader;
pub mod schemas;
pub mod source;
pub mod streams;

// Re-export SensitiveString at crate root for convenience
pub use types::SensitiveString;

pub use auth::{bearer_header, Authenticator, NoAuth, TokenAuthenticator};
pub use config::FactorialConfig;
pub use error::{ConnectorError, Result};
pub use protocol::Message;
pub use reader::{StreamItem, StreamReader};
pub use schemas::{SchemaRegistry, REGISTRY};
pub use source::FactorialSource;
pub use streams::{Customers, Employees, Fac};

pub use traits::{
    compare_cursor, parse_json_array, parse_json_records, Catalog, CheckDetail, CheckResult,
    CheckResultBuilder, ConfiguredCatalog, ConfiguredStream, ConnectorSpec, HttpResponse,
    HttpStream, IncrementalStream, LogLevel, PageToken, Record, RequestContext, Source,
    SourceConfig, SourceEvent, SourceEventType, State, StreamDescriptor, StreamSlice, StreamState,
    SyncMode,
};

// Re-export for connector implementations
pub use async_trait::async_trait;
pub use futures::stream::BoxStream;

/// Everything needed to drive the source or write another stream
pub mod prelude {
    pub use crate::{
        async_trait, Authenticator, BoxStream, Catalog, CheckResult, ConfiguredCatalog,
        ConfiguredStream, ConnectorError, FactorialConfig, FactorialSource, HttpResponse,
        HttpStream, IncrementalStream, Message, Record, RequestContext, Result, SensitiveString,
        Source, SourceEvent, State, StreamDescriptor, StreamState, SyncMode,
    };
}
