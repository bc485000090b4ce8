//! Core connector traits and types
//!
//! - `HttpStream` / `IncrementalStream` - one readable API resource
//! - `Source` - spec, check, discover, and read for a whole connector
//! - `Catalog` / `ConfiguredCatalog` - what can be read and what was selected
//! - `State` - resumable cursors
//! - `SourceEvent` - records, checkpoints, and logs produced by a read

pub mod catalog;
pub mod event;
pub mod source;
pub mod spec;
pub mod state;
pub mod stream;

pub use catalog::{Catalog, ConfiguredCatalog, ConfiguredStream, StreamDescriptor, SyncMode};
pub use event::{LogLevel, SourceEvent, SourceEventType};
pub use source::{CheckDetail, CheckResult, CheckResultBuilder, Source, SourceConfig};
pub use spec::{ConnectorSpec, ConnectorSpecBuilder};
pub use state::{State, StateBuilder, StreamState};
pub use stream::{
    compare_cursor, parse_json_array, parse_json_records, HttpResponse, HttpStream,
    IncrementalStream, PageToken, Record, RequestContext, StreamSlice,
};
