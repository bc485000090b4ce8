//! `customers` stream: full refresh, keyed by `customer_id`

use crate::auth::Authenticator;
use crate::error::Result;
use crate::schemas::REGISTRY;
use crate::traits::{
    parse_json_records, HttpResponse, HttpStream, Record, RequestContext, StreamDescriptor,
};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Customers {
    authenticator: Arc<dyn Authenticator>,
}

impl Customers {
    pub const NAME: &'static str = "customers";
    pub const PRIMARY_KEY: &'static str = "customer_id";

    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self { authenticator }
    }
}

impl HttpStream for Customers {
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
        StreamDescriptor::new(Self::NAME, schema).primary_key(Self::PRIMARY_KEY)
    }

    fn path(&self, _ctx: &RequestContext<'_>) -> String {
        "customers".to_string()
    }

    fn parse_response(&self, response: &HttpResponse) -> Result<Vec<Record>> {
        parse_json_records(Self::NAME, response)
    }
}
