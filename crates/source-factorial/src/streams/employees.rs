//! `employees` stream: incremental on `start_date`, keyed by `employee_id`

use crate::auth::Authenticator;
use crate::error::Result;
use crate::schemas::REGISTRY;
use crate::traits::{
    parse_json_records, HttpResponse, HttpStream, IncrementalStream, Record, RequestContext,
    StreamDescriptor,
};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Employees {
    authenticator: Arc<dyn Authenticator>,
    state_checkpoint_interval: Option<usize>,
}

impl Employees {
    pub const NAME: &'static str = "employees";
    pub const PRIMARY_KEY: &'static str = "employee_id";
    pub const CURSOR_FIELD: &'static str = "start_date";

    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            authenticator,
            state_checkpoint_interval: None,
        }
    }

    /// Checkpoint every `interval` records instead of only at the end
    pub fn with_state_checkpoint_interval(mut self, interval: Option<usize>) -> Self {
        self.state_checkpoint_interval = interval.filter(|n| *n > 0);
        self
    }
}

impl HttpStream for Employees {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn primary_key(&self) -> Option<&str> {
        Some(Self::PRIMARY_KEY)
    }

    fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    fn descriptor(&self) -> StreamDescriptor {
        let schema = REGISTRY.get(Self::NAME).cloned().unwrap_or_else(|| json!({}));
        StreamDescriptor::new(Self::NAME, schema)
            .primary_key(Self::PRIMARY_KEY)
            .cursor_field(Self::CURSOR_FIELD)
    }

    fn path(&self, _ctx: &RequestContext<'_>) -> String {
        "employees".to_string()
    }

    fn parse_response(&self, response: &HttpResponse) -> Result<Vec<Record>> {
        parse_json_records(Self::NAME, response)
    }

    fn incremental(&self) -> Option<&dyn IncrementalStream> {
        Some(self)
    }
}

impl IncrementalStream for Employees {
    fn cursor_field(&self) -> &str {
        Self::CURSOR_FIELD
    }

    fn state_checkpoint_interval(&self) -> Option<usize> {
        self.state_checkpoint_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::NoAuth;
    use crate::traits::SyncMode;

    fn stream() -> Employees {
        Employees::new(Arc::new(NoAuth))
    }

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_descriptor_is_incremental() {
        let descriptor = stream().descriptor();
        assert_eq!(descriptor.name, "employees");
        assert_eq!(
            descriptor.supported_sync_modes,
            vec![SyncMode::FullRefresh, SyncMode::Incremental]
        );
        assert_eq!(
            descriptor.default_cursor_field,
            Some(vec!["start_date".to_string()])
        );
    }

    #[test]
    fn test_incremental_capability() {
        let stream = stream();
        let incremental = stream.incremental().unwrap();
        assert_eq!(incremental.cursor_field(), "start_date");
        assert_eq!(incremental.state_checkpoint_interval(), None);

        let stream = stream.with_state_checkpoint_interval(Some(100));
        assert_eq!(stream.state_checkpoint_interval(), Some(100));

        let stream = stream.with_state_checkpoint_interval(Some(0));
        assert_eq!(stream.state_checkpoint_interval(), None);
    }

    #[test]
    fn test_updated_state_never_regresses() {
        let stream = stream();
        let current = json!("2024-06-01");
        let older = record(json!({"employee_id": 1, "start_date": "2020-01-01"}));
        let newer = record(json!({"employee_id": 2, "start_date": "2024-07-15"}));

        assert_eq!(stream.get_updated_state(Some(&current), &older), Some(current.clone()));
        assert_eq!(
            stream.get_updated_state(Some(&current), &newer),
            Some(json!("2024-07-15"))
        );
    }

    #[test]
    fn test_parse_response() {
        let stream = stream();
        assert!(stream.parse_response(&HttpResponse::new(200, "")).unwrap().is_empty());

        let body = r#"[{"employee_id":1,"start_date":"2021-03-01"}]"#;
        let records = stream.parse_response(&HttpResponse::new(200, body)).unwrap();
        assert_eq!(records, vec![record(json!({"employee_id": 1, "start_date": "2021-03-01"}))]);
    }
}
