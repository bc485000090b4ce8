//! Request authentication
//!
//! One authenticator is built from the config and shared by every stream
//! through an `Arc`. It is read-only after construction.

use crate::error::{ConnectorError, Result};
use crate::types::SensitiveString;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::fmt;

/// Produces the headers that authenticate a request
pub trait Authenticator: Send + Sync + fmt::Debug {
    fn auth_headers(&self) -> Result<HeaderMap>;
}

/// Sends `Authorization: Bearer <token>`
#[derive(Debug, Clone)]
pub struct TokenAuthenticator {
    token: SensitiveString,
}

impl TokenAuthenticator {
    pub fn new(token: SensitiveString) -> Self {
        Self { token }
    }
}

impl Authenticator for TokenAuthenticator {
    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer_header(&self.token)?);
        Ok(headers)
    }
}

/// Adds nothing to requests
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl Authenticator for NoAuth {
    fn auth_headers(&self) -> Result<HeaderMap> {
        Ok(HeaderMap::new())
    }
}

/// `Bearer <token>` header value, marked sensitive
pub fn bearer_header(token: &SensitiveString) -> Result<HeaderValue> {
    sensitive_header(&format!("Bearer {}", token.expose_secret()))
}

fn sensitive_header(value: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(value).map_err(|_| {
        ConnectorError::config("token contains characters not allowed in an HTTP header")
    })?;
    value.set_sensitive(true);
    Ok(value)
}
