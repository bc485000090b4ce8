//! Factorial source
//!
//! Composes the shared authenticator and the three streams, and implements
//! spec, check, discover, and read on top of [`StreamReader`].

use crate::auth::{Authenticator, NoAuth, TokenAuthenticator};
use crate::config::FactorialConfig;
use crate::error::{ConnectorError, Result};
use crate::protocol::Message;
use crate::reader::{StreamItem, StreamReader};
use crate::schemas::REGISTRY;
use crate::streams::{Customers, Employees, Fac};
use crate::traits::{
    Catalog, CheckDetail, CheckResult, ConfiguredCatalog, ConfiguredStream, ConnectorSpec,
    HttpStream, LogLevel, RequestContext, Source, SourceEvent, State, SyncMode,
};
use crate::types::SensitiveString;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Documentation link advertised in the connector spec
pub const DOCUMENTATION_URL: &str = "https://apidoc.factorialhr.com/";

/// Source connector for the Factorial HR API
#[derive(Debug, Clone, Copy, Default)]
pub struct FactorialSource;

impl FactorialSource {
    pub fn new() -> Self {
        Self
    }

    /// `customers`, `employees`, and `fac`, sharing one bearer authenticator
    pub fn streams(config: &FactorialConfig) -> Result<Vec<Arc<dyn HttpStream>>> {
        if config.apikey.is_blank() {
            return Err(ConnectorError::config("apikey is required"));
        }
        let authenticator: Arc<dyn Authenticator> =
            Arc::new(TokenAuthenticator::new(config.apikey.clone()));
        Ok(build_streams(
            authenticator,
            config.apikey.clone(),
            config.state_checkpoint_interval,
        ))
    }

    /// Catalog of every stream; the same value on every call
    pub fn discover_catalog() -> Catalog {
        build_streams(Arc::new(NoAuth), SensitiveString::new(""), None)
            .iter()
            .fold(Catalog::new(), |catalog, stream| {
                catalog.add_stream(stream.descriptor())
            })
    }

    /// The catalog wrapped in its protocol envelope
    pub fn read_catalog() -> Message {
        Message::catalog(Self::discover_catalog())
    }

    /// Record schema of a stream
    pub fn schema_for(stream: &str) -> Option<&'static Value> {
        REGISTRY.get(stream)
    }

    /// Fetch the first page of `stream_name` to prove the key is accepted
    async fn fetch_first_page(config: &FactorialConfig, stream_name: &str) -> Result<()> {
        let stream = Self::streams(config)?
            .into_iter()
            .find(|s| s.name() == stream_name)
            .ok_or_else(|| ConnectorError::config(format!("unknown stream '{stream_name}'")))?;
        let reader = StreamReader::from_config(config)?;
        let response = reader.fetch(stream.as_ref(), &RequestContext::default()).await?;
        stream.parse_response(&response)?;
        Ok(())
    }
}

fn build_streams(
    authenticator: Arc<dyn Authenticator>,
    apikey: SensitiveString,
    state_checkpoint_interval: Option<usize>,
) -> Vec<Arc<dyn HttpStream>> {
    vec![
        Arc::new(Customers::new(authenticator.clone())),
        Arc::new(
            Employees::new(authenticator.clone())
                .with_state_checkpoint_interval(state_checkpoint_interval),
        ),
        Arc::new(Fac::new(authenticator, apikey)),
    ]
}

#[async_trait]
impl Source for FactorialSource {
    type Config = FactorialConfig;

    fn spec() -> ConnectorSpec {
        ConnectorSpec::builder("source-factorial", env!("CARGO_PKG_VERSION"))
            .description("Extract customers, employees, and HR records from the Factorial API")
            .documentation_url(DOCUMENTATION_URL)
            .license("MIT OR Apache-2.0")
            .config_schema::<FactorialConfig>()
            .incremental(true)
            .build()
    }

    async fn check(&self, config: &Self::Config) -> Result<CheckResult> {
        if let Err(e) = config.validate_all() {
            warn!("Connection check failed: {}", e);
            return Ok(CheckResult::builder()
                .check_failed("config", e.to_string())
                .build());
        }
        let builder = CheckResult::builder().check_passed("config");

        let Some(stream_name) = config.check_stream.as_deref() else {
            return Ok(builder.build());
        };

        info!("Checking stream '{}' at {}", stream_name, config.base_url);
        let started = Instant::now();
        let outcome = Self::fetch_first_page(config, stream_name).await;

        let detail = match outcome {
            Ok(()) => CheckDetail::passed("stream"),
            Err(e) => {
                warn!("Connection check failed: {}", e);
                let reason = ConnectorError::ConnectionCheckFailed(e.to_string());
                CheckDetail::failed("stream", reason.to_string())
            }
        };
        Ok(builder.check(detail.with_duration(started.elapsed())).build())
    }

    async fn discover(&self, _config: &Self::Config) -> Result<Catalog> {
        Ok(Self::discover_catalog())
    }

    async fn read(
        &self,
        config: &Self::Config,
        catalog: &ConfiguredCatalog,
        state: Option<State>,
    ) -> Result<BoxStream<'static, Result<SourceEvent>>> {
        config.validate_all()?;
        let streams = Self::streams(config)?;

        let mut selected = Vec::with_capacity(catalog.streams.len());
        for configured in &catalog.streams {
            let name = configured.stream.name.as_str();
            let stream = streams
                .iter()
                .find(|s| s.name() == name)
                .cloned()
                .ok_or_else(|| ConnectorError::config(format!("unknown stream '{name}'")))?;
            check_sync_mode(stream.as_ref(), configured)?;
            selected.push((stream, configured.sync_mode));
        }

        let reader = StreamReader::from_config(config)?;
        let mut state = state.unwrap_or_default();

        info!(
            "Reading {} streams from {}",
            selected.len(),
            reader.base_url()
        );

        Ok(Box::pin(async_stream::try_stream! {
            for (stream, sync_mode) in selected {
                let name = stream.name().to_string();
                let message = format!("Reading stream '{name}' ({sync_mode:?})");
                yield SourceEvent::log(&name, LogLevel::Info, message);

                let stream_state = state.get_stream(&name).cloned();
                let mut items = reader.read_stream(stream, sync_mode, stream_state);
                let mut records = 0usize;
                while let Some(item) = items.next().await {
                    match item? {
                        StreamItem::Record(record) => {
                            records += 1;
                            yield SourceEvent::record(&name, record);
                        }
                        StreamItem::Checkpoint(stream_state) => {
                            state.set_stream(stream_state);
                            yield SourceEvent::state(&name, &state)?;
                        }
                    }
                }

                let message = format!("Finished stream '{name}': {records} records");
                yield SourceEvent::log(&name, LogLevel::Info, message);
            }
        }))
    }
}

/// Reject a configured stream whose sync mode or cursor the stream cannot honor
fn check_sync_mode(stream: &dyn HttpStream, configured: &ConfiguredStream) -> Result<()> {
    let name = stream.name();
    let incremental = stream.incremental();
    if configured.sync_mode == SyncMode::Incremental && incremental.is_none() {
        return Err(ConnectorError::config(format!(
            "stream '{name}' does not support incremental sync"
        )));
    }
    let (Some(requested), Some(inc)) = (&configured.cursor_field, incremental) else {
        return Ok(());
    };
    let matches = requested.len() == 1 && requested[0] == inc.cursor_field();
    if configured.sync_mode == SyncMode::Incremental && !matches {
        return Err(ConnectorError::config(format!(
            "stream '{name}' is cursored on '{}', not '{}'",
            inc.cursor_field(),
            requested.join(".")
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streams_in_order() {
        let streams = FactorialSource::streams(&FactorialConfig::new("abc")).unwrap();
        let names: Vec<_> = streams.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["customers", "employees", "fac"]);
    }

    #[test]
    fn test_streams_without_key_is_config_error() {
        let err = FactorialSource::streams(&FactorialConfig::new("")).err().unwrap();
        assert!(err.is_config());
    }

    #[test]
    fn test_streams_share_bearer_auth() {
        let streams = FactorialSource::streams(&FactorialConfig::new("abc")).unwrap();
        for stream in &streams {
            let headers = stream.authenticator().auth_headers().unwrap();
            assert_eq!(headers.get("authorization").unwrap(), "Bearer abc");
        }
    }

    #[test]
    fn test_checkpoint_interval_reaches_employees() {
        let config = FactorialConfig::new("abc").with_state_checkpoint_interval(25);
        let streams = FactorialSource::streams(&config).unwrap();
        let employees = streams.iter().find(|s| s.name() == "employees").unwrap();
        assert_eq!(
            employees.incremental().unwrap().state_checkpoint_interval(),
            Some(25)
        );
    }

    #[test]
    fn test_discover_is_deterministic() {
        let first = serde_json::to_string(&FactorialSource::discover_catalog()).unwrap();
        let second = serde_json::to_string(&FactorialSource::discover_catalog()).unwrap();
        assert_eq!(first, second);

        let catalog = FactorialSource::discover_catalog();
        assert_eq!(
            catalog.stream_names().collect::<Vec<_>>(),
            ["customers", "employees", "fac"]
        );
        assert!(catalog.find_stream("employees").unwrap().supports(SyncMode::Incremental));
        assert!(!catalog.find_stream("fac").unwrap().supports(SyncMode::Incremental));
    }

    #[test]
    fn test_read_catalog_envelope() {
        let value = serde_json::to_value(FactorialSource::read_catalog()).unwrap();
        assert_eq!(value["type"], "CATALOG");
        assert_eq!(value["catalog"]["streams"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_schema_for() {
        let schema = FactorialSource::schema_for("fac").unwrap();
        assert_eq!(schema["type"], "object");
        assert!(FactorialSource::schema_for("payroll").is_none());
    }

    #[test]
    fn test_spec() {
        let spec = FactorialSource::spec();
        assert_eq!(spec.connector_type, "source-factorial");
        assert!(spec.supports_incremental);
        let schema = spec.connection_specification.unwrap();
        assert!(schema["properties"]["apikey"].is_object());
        assert!(schema["required"]
            .as_array()
            .unwrap()
            .contains(&Value::String("apikey".into())));
    }

    #[tokio::test]
    async fn test_check_without_check_stream_succeeds_silently() {
        let result = FactorialSource::new()
            .check(&FactorialConfig::new("abc"))
            .await
            .unwrap();
        assert_eq!(result.as_tuple(), (true, None));
    }

    #[tokio::test]
    async fn test_check_invalid_config_fails() {
        let result = FactorialSource::new()
            .check(&FactorialConfig::new("abc").with_timeout_secs(0))
            .await
            .unwrap();
        assert!(!result.is_success());
        assert_eq!(result.failed_checks().count(), 1);
    }

    #[tokio::test]
    async fn test_read_unknown_stream_fails_before_requests() {
        let catalog = ConfiguredCatalog::new().add_stream(ConfiguredStream::from_stream(
            &crate::traits::StreamDescriptor::new("payroll", serde_json::json!({})),
        ));
        let err = FactorialSource::new()
            .read(&FactorialConfig::new("abc"), &catalog, None)
            .await
            .err()
            .unwrap();
        assert!(err.is_config());
    }

    #[tokio::test]
    async fn test_read_incremental_on_full_refresh_stream_rejected() {
        let catalog = FactorialSource::discover_catalog();
        let fac = ConfiguredStream::from_stream(catalog.find_stream("fac").unwrap())
            .sync_mode(SyncMode::Incremental);
        let err = FactorialSource::new()
            .read(
                &FactorialConfig::new("abc"),
                &ConfiguredCatalog::new().add_stream(fac),
                None,
            )
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("incremental"));
    }

    fn employees(cursor: &[&str]) -> ConfiguredCatalog {
        let catalog = FactorialSource::discover_catalog();
        let employees = ConfiguredStream::from_stream(catalog.find_stream("employees").unwrap())
            .sync_mode(SyncMode::Incremental)
            .cursor_field(cursor.iter().map(|s| s.to_string()).collect());
        ConfiguredCatalog::new().add_stream(employees)
    }

    #[tokio::test]
    async fn test_read_rejects_foreign_cursor_field() {
        let err = FactorialSource::new()
            .read(&FactorialConfig::new("abc"), &employees(&["updated_at"]), None)
            .await
            .err()
            .unwrap();
        assert!(err.is_config());
        assert!(err.to_string().contains("start_date"));
        assert!(err.to_string().contains("updated_at"));
    }

    #[tokio::test]
    async fn test_read_accepts_own_cursor_field() {
        let read = FactorialSource::new()
            .read(&FactorialConfig::new("abc"), &employees(&["start_date"]), None)
            .await;
        assert!(read.is_ok());
    }

    #[test]
    fn test_full_refresh_ignores_cursor_field() {
        let streams = FactorialSource::streams(&FactorialConfig::new("abc")).unwrap();
        let employees = streams.iter().find(|s| s.name() == "employees").unwrap();
        let configured = ConfiguredStream::from_stream(&employees.descriptor())
            .cursor_field(vec!["updated_at".to_string()]);
        assert!(check_sync_mode(employees.as_ref(), &configured).is_ok());
    }
}
