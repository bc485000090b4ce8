//! Page loop for a single stream
//!
//! [`StreamReader`] owns the HTTP client. For each slice of a stream it
//! builds a request from the stream's hooks, sends it with the configured
//! timeout, parses the page into records, and asks the stream for the next
//! page token until there is none. Incremental reads fold the cursor over
//! every record and emit checkpoints.
//!
//! Requests are strictly sequential. The first failure ends the stream;
//! items already yielded stay valid.

use crate::config::FactorialConfig;
use crate::error::{ConnectorError, Result, TIMEOUT_STATUS};
use crate::traits::{
    compare_cursor, HttpResponse, HttpStream, IncrementalStream, PageToken, Record,
    RequestContext, StreamState, SyncMode,
};
use futures::stream::BoxStream;
use reqwest::Url;
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// One item produced while reading a stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem {
    Record(Record),
    /// Replacement state for the stream being read
    Checkpoint(StreamState),
}

/// Executes requests against the API root
#[derive(Debug, Clone)]
pub struct StreamReader {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl StreamReader {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("source-factorial/", env!("CARGO_PKG_VERSION")))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| {
                ConnectorError::connection(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn from_config(config: &FactorialConfig) -> Result<Self> {
        Self::new(config.base_url()?, config.timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send one page request and return the response if it is a 2xx.
    ///
    /// Headers come from the stream's authenticator first; the stream's own
    /// headers are applied on top and replace same-named ones.
    pub async fn fetch(
        &self,
        stream: &dyn HttpStream,
        ctx: &RequestContext<'_>,
    ) -> Result<HttpResponse> {
        let name = stream.name();
        let path = stream.path(ctx);
        let url = self.base_url.join(&path).map_err(|e| {
            ConnectorError::config(format!("invalid path '{path}' for stream '{name}': {e}"))
        })?;

        let mut headers = stream.authenticator().auth_headers()?;
        headers.extend(stream.request_headers(ctx)?);
        let params = stream.request_params(ctx);

        debug!("GET {} (stream '{}', {} params)", url, name, params.len());

        let response = self
            .client
            .get(url)
            .headers(headers)
            .query(&params)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| transport_error(name, e))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(name, e))?;

        HttpResponse {
            status,
            headers,
            body: body.to_vec(),
        }
        .error_for_status(name)
    }

    /// Read every slice and page of `stream`.
    ///
    /// With [`SyncMode::Incremental`] on a stream that supports it, records
    /// whose cursor is older than `state`'s cursor are skipped, a checkpoint
    /// is emitted every `state_checkpoint_interval` records, and a final
    /// checkpoint closes the stream. Other reads emit records only.
    pub fn read_stream(
        &self,
        stream: Arc<dyn HttpStream>,
        sync_mode: SyncMode,
        state: Option<StreamState>,
    ) -> BoxStream<'static, Result<StreamItem>> {
        let reader = self.clone();

        Box::pin(async_stream::try_stream! {
            let name = stream.name().to_string();
            let incremental = match sync_mode {
                SyncMode::Incremental => stream.incremental(),
                SyncMode::FullRefresh => None,
            };
            let start_cursor = incremental
                .and(state.as_ref())
                .and_then(|s| s.cursor_value.clone());
            let checkpoint_interval = incremental.and_then(|inc| inc.state_checkpoint_interval());
            let mut cursor = start_cursor.clone();
            let mut emitted = 0usize;
            let mut skipped = 0usize;
            let mut since_checkpoint = 0usize;

            info!(
                "Reading stream '{}' ({:?}, starting cursor: {:?})",
                name, sync_mode, start_cursor
            );

            for slice in stream.stream_slices(state.as_ref()) {
                let mut page_token: Option<PageToken> = None;
                let mut page = 0usize;
                loop {
                    let ctx = RequestContext {
                        state: state.as_ref(),
                        slice: slice.as_ref(),
                        page_token: page_token.as_ref(),
                    };
                    let response = reader.fetch(stream.as_ref(), &ctx).await?;
                    let records = stream.parse_response(&response)?;
                    page += 1;
                    debug!(
                        "Stream '{}' page {}: status {}, {} records",
                        name, page, response.status, records.len()
                    );

                    for record in records {
                        if let Some(inc) = incremental {
                            if is_older(&record, inc.cursor_field(), start_cursor.as_ref()) {
                                skipped += 1;
                                continue;
                            }
                            cursor = inc.get_updated_state(cursor.as_ref(), &record);
                        }
                        emitted += 1;
                        yield StreamItem::Record(record);

                        if let Some(interval) = checkpoint_interval {
                            since_checkpoint += 1;
                            if since_checkpoint >= interval {
                                since_checkpoint = 0;
                                let state = checkpoint(&name, incremental, &cursor);
                                yield StreamItem::Checkpoint(state);
                            }
                        }
                    }

                    page_token = stream.next_page_token(&response);
                    if page_token.is_none() {
                        break;
                    }
                }
            }

            if incremental.is_some() {
                yield StreamItem::Checkpoint(checkpoint(&name, incremental, &cursor));
            }

            info!(
                "Finished stream '{}': {} records emitted, {} skipped",
                name, emitted, skipped
            );
        })
    }
}

fn checkpoint(
    stream: &str,
    incremental: Option<&dyn IncrementalStream>,
    cursor: &Option<serde_json::Value>,
) -> StreamState {
    StreamState {
        stream_name: stream.to_string(),
        cursor_field: incremental.map(|inc| inc.cursor_field().to_string()),
        cursor_value: cursor.clone(),
    }
}

/// True when the record carries a cursor strictly below the starting one
fn is_older(record: &Record, cursor_field: &str, start: Option<&serde_json::Value>) -> bool {
    match (record.get(cursor_field).filter(|v| !v.is_null()), start) {
        (Some(value), Some(start)) => compare_cursor(value, start) == Ordering::Less,
        _ => false,
    }
}

fn transport_error(stream: &str, err: reqwest::Error) -> ConnectorError {
    if err.is_timeout() {
        ConnectorError::request_failed(stream, TIMEOUT_STATUS, b"request timed out")
    } else {
        ConnectorError::connection(format!("request for stream '{stream}' failed: {err}"))
    }
}
