//! `fac` stream: the employee listing, full refresh, no primary key.
//!
//! Unlike the other streams, `fac` builds its own `Authorization` header
//! from the key it was constructed with. The header is sent on top of the
//! shared authenticator's headers and replaces any value they set.

use crate::auth::{bearer_header, Authenticator};
use crate::error::Result;
use crate::schemas::REGISTRY;
use crate::traits::{
    parse_json_array, HttpResponse, HttpStream, Record, RequestContext, StreamDescriptor,
};
use crate::types::SensitiveString;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Fac {
    authenticator: Arc<dyn Authenticator>,
    apikey: SensitiveString,
}

impl Fac {
    pub const NAME: &'static str = "fac";

    pub fn new(authenticator: Arc<dyn Authenticator>, apikey: SensitiveString) -> Self {
        Self {
            authenticator,
            apikey,
        }
    }
}

impl HttpStream for Fac {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn primary_key(&self) -> Option<&str> {
        None
    }

    fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    fn descriptor(&self) -> StreamDescriptor {
        let schema = REGISTRY.get(Self::NAME).cloned().unwrap_or_else(|| json!({}));
        StreamDescriptor::new(Self::NAME, schema)
    }

    fn path(&self, _ctx: &RequestContext<'_>) -> String {
        "fac".to_string()
    }

    fn request_headers(&self, _ctx: &RequestContext<'_>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer_header(&self.apikey)?);
        Ok(headers)
    }

    fn parse_response(&self, response: &HttpResponse) -> Result<Vec<Record>> {
        parse_json_array(Self::NAME, response)
    }
}
