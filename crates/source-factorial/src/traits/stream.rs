//! HTTP stream contracts
//!
//! [`HttpStream`] is the minimal capability set of a paginated, read-only
//! resource reachable over HTTP: where it lives, what to send, how to turn a
//! response page into records, and whether another page follows.
//! [`IncrementalStream`] adds a cursor so reads can resume from persisted
//! state instead of re-reading everything.
//!
//! Streams never perform I/O themselves. The [`StreamReader`] drives the page
//! loop and hands every hook the current [`RequestContext`].
//!
//! [`StreamReader`]: crate::reader::StreamReader

use super::catalog::StreamDescriptor;
use super::state::StreamState;
use crate::auth::Authenticator;
use crate::error::{ConnectorError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::cmp::Ordering;

/// One record: an open JSON object
pub type Record = serde_json::Map<String, Value>;

/// Continuation marker produced from one page and consumed by the next request
pub type PageToken = serde_json::Map<String, Value>;

/// Optional partition of a single stream read
pub type StreamSlice = serde_json::Map<String, Value>;

/// Inputs available to every request builder hook
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestContext<'a> {
    pub state: Option<&'a StreamState>,
    pub slice: Option<&'a StreamSlice>,
    pub page_token: Option<&'a PageToken>,
}

/// A fully received HTTP response
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True when the body is absent or only whitespace
    pub fn is_empty(&self) -> bool {
        self.body.iter().all(|b| b.is_ascii_whitespace())
    }

    /// Turn a non-2xx response into [`ConnectorError::RequestFailed`]
    pub fn error_for_status(self, stream: &str) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ConnectorError::request_failed(stream, self.status, &self.body))
        }
    }

    /// Decode the body as JSON, reporting failures as parse errors
    pub fn json(&self, stream: &str) -> Result<Value> {
        serde_json::from_slice(&self.body).map_err(|_| ConnectorError::parse(stream, &self.body))
    }
}

/// A readable resource of the API
pub trait HttpStream: Send + Sync {
    /// Stream name as exposed in the catalog
    fn name(&self) -> &str;

    /// Primary key field, if records are keyed
    fn primary_key(&self) -> Option<&str>;

    /// Authenticator injecting credentials into every request
    fn authenticator(&self) -> &dyn Authenticator;

    /// Catalog entry for this stream
    fn descriptor(&self) -> StreamDescriptor;

    /// Resource path relative to the API base URL
    fn path(&self, ctx: &RequestContext<'_>) -> String;

    /// Query parameters for one page request
    fn request_params(&self, _ctx: &RequestContext<'_>) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Extra headers; these win over the authenticator's headers
    fn request_headers(&self, _ctx: &RequestContext<'_>) -> Result<HeaderMap> {
        Ok(HeaderMap::new())
    }

    /// The API does not paginate, so no page ever has a successor
    fn next_page_token(&self, _response: &HttpResponse) -> Option<PageToken> {
        None
    }

    /// Records contained in one response page.
    ///
    /// Concrete streams override this; the default yields one empty record
    /// per non-empty page and nothing for an empty body.
    fn parse_response(&self, response: &HttpResponse) -> Result<Vec<Record>> {
        if response.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Record::new()])
    }

    /// Partitions of one read; a single unpartitioned slice by default
    fn stream_slices(&self, _state: Option<&StreamState>) -> Vec<Option<StreamSlice>> {
        vec![None]
    }

    /// Incremental capability, for streams that track a cursor
    fn incremental(&self) -> Option<&dyn IncrementalStream> {
        None
    }
}

/// A stream that can resume from a persisted cursor
pub trait IncrementalStream: HttpStream {
    /// Record field tracking extraction progress
    fn cursor_field(&self) -> &str;

    /// Emit a checkpoint every N records; `None` checkpoints only at the end
    fn state_checkpoint_interval(&self) -> Option<usize> {
        None
    }

    /// Cursor value to persist after seeing `latest`.
    ///
    /// Returns the larger of `current` and the record's cursor value, so the
    /// result never regresses. Records without a usable cursor value leave
    /// `current` untouched.
    fn get_updated_state(&self, current: Option<&Value>, latest: &Record) -> Option<Value> {
        let candidate = latest.get(self.cursor_field()).filter(|v| !v.is_null());
        match (current, candidate) {
            (Some(current), Some(candidate)) => {
                if compare_cursor(candidate, current) == Ordering::Greater {
                    Some(candidate.clone())
                } else {
                    Some(current.clone())
                }
            }
            (None, Some(candidate)) => Some(candidate.clone()),
            (current, None) => current.cloned(),
        }
    }
}

/// Order two cursor values.
///
/// Numbers compare numerically. Strings compare as instants when both parse
/// as a timestamp or date, and lexicographically when neither does; an
/// instant always sorts after free text, which keeps the order total. Values
/// of different JSON kinds are treated as equal so the persisted cursor is
/// kept.
pub fn compare_cursor(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => {
            match (a.as_i64(), b.as_i64()) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => a
                    .as_f64()
                    .zip(b.as_f64())
                    .and_then(|(a, b)| a.partial_cmp(&b))
                    .unwrap_or(Ordering::Equal),
            }
        }
        (Value::String(a), Value::String(b)) => match (parse_instant(a), parse_instant(b)) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => a.cmp(b),
        },
        _ => Ordering::Equal,
    }
}

/// RFC 3339, offset-less `YYYY-MM-DDTHH:MM:SS[.f]` (taken as UTC), or a bare
/// date at midnight UTC
fn parse_instant(value: &str) -> Option<NaiveDateTime> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.naive_utc());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ts);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse a body that must be a JSON array of objects, one record per element
pub fn parse_json_array(stream: &str, response: &HttpResponse) -> Result<Vec<Record>> {
    if response.is_empty() {
        return Ok(Vec::new());
    }
    match response.json(stream)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(record) => Ok(record),
                _ => Err(ConnectorError::parse(stream, &response.body)),
            })
            .collect(),
        _ => Err(ConnectorError::parse(stream, &response.body)),
    }
}

/// Parse a body that is either a JSON array of objects or a single object
pub fn parse_json_records(stream: &str, response: &HttpResponse) -> Result<Vec<Record>> {
    if response.is_empty() {
        return Ok(Vec::new());
    }
    match response.json(stream)? {
        Value::Object(record) => Ok(vec![record]),
        Value::Array(_) => parse_json_array(stream, response),
        _ => Err(ConnectorError::parse(stream, &response.body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::NoAuth;
    use serde_json::json;

    struct Placeholder;

    impl HttpStream for Placeholder {
        fn name(&self) -> &str {
            "placeholder"
        }

        fn primary_key(&self) -> Option<&str> {
            None
        }

        fn authenticator(&self) -> &dyn Authenticator {
            &NoAuth
        }

        fn descriptor(&self) -> StreamDescriptor {
            StreamDescriptor::new("placeholder", json!({}))
        }

        fn path(&self, _ctx: &RequestContext<'_>) -> String {
            "placeholder".to_string()
        }
    }

    struct Dated;

    impl HttpStream for Dated {
        fn name(&self) -> &str {
            "dated"
        }

        fn primary_key(&self) -> Option<&str> {
            Some("id")
        }

        fn authenticator(&self) -> &dyn Authenticator {
            &NoAuth
        }

        fn descriptor(&self) -> StreamDescriptor {
            StreamDescriptor::new("dated", json!({})).cursor_field("start_date")
        }

        fn path(&self, _ctx: &RequestContext<'_>) -> String {
            "dated".to_string()
        }

        fn incremental(&self) -> Option<&dyn IncrementalStream> {
            Some(self)
        }
    }

    impl IncrementalStream for Dated {
        fn cursor_field(&self) -> &str {
            "start_date"
        }
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_default_hooks() {
        let stream = Placeholder;
        let ctx = RequestContext::default();
        assert!(stream.request_params(&ctx).is_empty());
        assert!(stream.request_headers(&ctx).unwrap().is_empty());
        assert!(stream.next_page_token(&HttpResponse::new(200, "[1]")).is_none());
        assert_eq!(stream.stream_slices(None), vec![None]);
        assert!(stream.incremental().is_none());
    }

    #[test]
    fn test_default_parse_response() {
        let stream = Placeholder;
        assert!(stream.parse_response(&HttpResponse::new(200, "")).unwrap().is_empty());
        assert!(stream.parse_response(&HttpResponse::new(200, " \n")).unwrap().is_empty());

        let records = stream.parse_response(&HttpResponse::new(200, "{}")).unwrap();
        assert_eq!(records, vec![Record::new()]);
    }

    #[test]
    fn test_error_for_status() {
        let ok = HttpResponse::new(204, "").error_for_status("fac");
        assert!(ok.is_ok());

        let err = HttpResponse::new(401, "denied").error_for_status("fac").unwrap_err();
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn test_parse_json_array() {
        let response = HttpResponse::new(200, r#"[{"id":1},{"id":2}]"#);
        let records = parse_json_array("fac", &response).unwrap();
        assert_eq!(records, vec![record(json!({"id": 1})), record(json!({"id": 2}))]);

        let err = parse_json_array("fac", &HttpResponse::new(200, r#"{"id":1}"#)).unwrap_err();
        assert!(matches!(err, ConnectorError::Parse { .. }));

        let err = parse_json_array("fac", &HttpResponse::new(200, "[1, 2]")).unwrap_err();
        assert!(matches!(err, ConnectorError::Parse { .. }));
    }

    #[test]
    fn test_parse_json_records_accepts_object() {
        let response = HttpResponse::new(200, r#"{"customer_id":7}"#);
        let records = parse_json_records("customers", &response).unwrap();
        assert_eq!(records, vec![record(json!({"customer_id": 7}))]);

        let err = parse_json_records("customers", &HttpResponse::new(200, "\"text\"")).unwrap_err();
        assert!(matches!(err, ConnectorError::Parse { .. }));
    }

    #[test]
    fn test_malformed_body_names_stream() {
        let response = HttpResponse::new(200, "<html>oops");
        let err = parse_json_records("customers", &response).unwrap_err();
        match err {
            ConnectorError::Parse { stream, snippet } => {
                assert_eq!(stream, "customers");
                assert_eq!(snippet, "<html>oops");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_compare_cursor() {
        assert_eq!(compare_cursor(&json!(10), &json!(9)), Ordering::Greater);
        assert_eq!(compare_cursor(&json!(1.5), &json!(2)), Ordering::Less);
        assert_eq!(
            compare_cursor(&json!("2024-02-01"), &json!("2024-01-31")),
            Ordering::Greater
        );
        assert_eq!(
            compare_cursor(&json!("2024-01-01T10:00:00+02:00"), &json!("2024-01-01T09:00:00Z")),
            Ordering::Less
        );
        assert_eq!(
            compare_cursor(&json!("2024-01-02"), &json!("2024-01-01T23:00:00Z")),
            Ordering::Greater
        );
        assert_eq!(compare_cursor(&json!("b"), &json!("a")), Ordering::Greater);
        assert_eq!(compare_cursor(&json!("a"), &json!(1)), Ordering::Equal);
    }

    #[test]
    fn test_compare_cursor_offsetless_timestamp_is_utc() {
        assert_eq!(
            compare_cursor(&json!("2024-01-01T07:00:00"), &json!("2024-01-01T06:00:00Z")),
            Ordering::Greater
        );
        assert_eq!(
            compare_cursor(&json!("2024-01-01T07:00:00.500"), &json!("2024-01-01T07:00:00Z")),
            Ordering::Greater
        );
        assert_eq!(
            compare_cursor(&json!("2024-01-01T00:00:00"), &json!("2024-01-01")),
            Ordering::Equal
        );
    }

    #[test]
    fn test_compare_cursor_instant_sorts_after_text() {
        assert_eq!(compare_cursor(&json!("2024-01-01"), &json!("zzz")), Ordering::Greater);
        assert_eq!(compare_cursor(&json!("pending"), &json!("2024-01-01")), Ordering::Less);
    }

    #[test]
    fn test_get_updated_state_never_drops_below_start_with_mixed_formats() {
        let stream = Dated;
        let start = json!("2024-01-01T07:00:00");
        let mut current = Some(start.clone());
        for value in ["2024-01-01T10:00:00+05:00", "2024-01-01T06:00:00Z", "not-a-date"] {
            let latest = record(json!({ "start_date": value }));
            current = stream.get_updated_state(current.as_ref(), &latest);
            let cursor = current.as_ref().unwrap();
            assert_ne!(compare_cursor(cursor, &start), Ordering::Less, "{cursor}");
        }
        assert_eq!(current, Some(start));
    }

    #[test]
    fn test_get_updated_state_takes_max() {
        let stream = Dated;
        let state = stream.get_updated_state(None, &record(json!({"start_date": "2024-01-01"})));
        assert_eq!(state, Some(json!("2024-01-01")));

        let state = stream.get_updated_state(
            state.as_ref(),
            &record(json!({"start_date": "2024-03-01"})),
        );
        assert_eq!(state, Some(json!("2024-03-01")));

        let state = stream.get_updated_state(
            state.as_ref(),
            &record(json!({"start_date": "2023-12-31"})),
        );
        assert_eq!(state, Some(json!("2024-03-01")));
    }

    #[test]
    fn test_get_updated_state_ignores_missing_cursor() {
        let stream = Dated;
        let current = json!("2024-01-01");
        assert_eq!(
            stream.get_updated_state(Some(&current), &record(json!({"id": 1}))),
            Some(current.clone())
        );
        assert_eq!(
            stream.get_updated_state(Some(&current), &record(json!({"start_date": null}))),
            Some(current)
        );
        assert_eq!(stream.get_updated_state(None, &record(json!({"id": 1}))), None);
    }

    #[test]
    fn test_get_updated_state_is_monotonic() {
        let stream = Dated;
        let dates = [
            "2024-05-01", "2023-01-01", "2024-05-02", "2024-01-15", "2025-01-01", "2024-12-31",
        ];
        let mut current: Option<Value> = None;
        for date in dates {
            let latest = record(json!({ "start_date": date }));
            let next = stream.get_updated_state(current.as_ref(), &latest);
            if let (Some(prev), Some(next)) = (&current, &next) {
                assert_ne!(compare_cursor(next, prev), Ordering::Less);
            }
            current = next;
        }
        assert_eq!(current, Some(json!("2025-01-01")));
    }
}
