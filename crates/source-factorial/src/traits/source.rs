//! Source connector trait
//!
//! A source answers four questions for its host: what it is (`spec`),
//! whether it can reach the API (`check`), which streams it exposes
//! (`discover`), and what those streams currently contain (`read`).

use super::catalog::{Catalog, ConfiguredCatalog};
use super::event::SourceEvent;
use super::spec::ConnectorSpec;
use super::state::State;
use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use validator::Validate;

/// Trait for source connector configuration
pub trait SourceConfig: DeserializeOwned + Validate + JsonSchema + Send + Sync {}

impl<T> SourceConfig for T where T: DeserializeOwned + Validate + JsonSchema + Send + Sync {}

/// Named step of a connection check and how it went
#[derive(Debug, Clone, PartialEq)]
pub struct CheckDetail {
    /// `config` or `stream`
    pub name: String,
    /// Failure reason; `None` when the step passed
    pub error: Option<String>,
    pub duration: Option<Duration>,
}

impl CheckDetail {
    pub fn passed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            error: None,
            duration: None,
        }
    }

    pub fn failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::passed(name)
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn is_passed(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of [`Source::check`]: `(success, message)` plus the steps behind it
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub success: bool,
    /// Why the check failed; always `None` on success
    pub message: Option<String>,
    pub checks: Vec<CheckDetail>,
}

impl CheckResult {
    pub fn success() -> Self {
        Self::from(Vec::new())
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            checks: Vec::new(),
        }
    }

    pub fn builder() -> CheckResultBuilder {
        CheckResultBuilder::default()
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// `(ok, error)` pair as reported to the host
    pub fn as_tuple(&self) -> (bool, Option<&str>) {
        (self.success, self.message.as_deref())
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = &CheckDetail> {
        self.checks.iter().filter(|c| !c.is_passed())
    }
}

/// Fails when any step failed; the message joins the failure reasons
impl From<Vec<CheckDetail>> for CheckResult {
    fn from(checks: Vec<CheckDetail>) -> Self {
        let reasons: Vec<&str> = checks.iter().filter_map(|c| c.error.as_deref()).collect();
        let message = (!reasons.is_empty()).then(|| reasons.join("; "));
        Self {
            success: message.is_none(),
            message,
            checks,
        }
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            None if self.success => write!(f, "check ok")?,
            None => write!(f, "check failed")?,
            Some(msg) => write!(f, "check failed: {msg}")?,
        }
        for check in &self.checks {
            let mark = if check.is_passed() { "ok" } else { "failed" };
            write!(f, "\n  [{mark}] {}", check.name)?;
            if let Some(duration) = check.duration {
                write!(f, " in {}ms", duration.as_millis())?;
            }
        }
        Ok(())
    }
}

/// Collects check steps in order
#[derive(Debug, Default)]
pub struct CheckResultBuilder {
    checks: Vec<CheckDetail>,
}

impl CheckResultBuilder {
    pub fn check(mut self, detail: CheckDetail) -> Self {
        self.checks.push(detail);
        self
    }

    pub fn check_passed(self, name: impl Into<String>) -> Self {
        self.check(CheckDetail::passed(name))
    }

    pub fn check_failed(self, name: impl Into<String>, reason: impl Into<String>) -> Self {
        self.check(CheckDetail::failed(name, reason))
    }

    pub fn build(self) -> CheckResult {
        CheckResult::from(self.checks)
    }
}

/// Trait for source connectors
#[async_trait]
pub trait Source: Send + Sync {
    type Config: SourceConfig;

    /// Connector specification, including the configuration schema
    fn spec() -> ConnectorSpec;

    /// Check configuration and connectivity.
    ///
    /// Connectivity failures are reported as a failed [`CheckResult`], not as `Err`.
    async fn check(&self, config: &Self::Config) -> Result<CheckResult>;

    /// Catalog of every stream the source exposes
    async fn discover(&self, config: &Self::Config) -> Result<Catalog>;

    /// Read the configured streams one after another.
    ///
    /// `state` is the last state the host persisted, if any.
    async fn read(
        &self,
        config: &Self::Config,
        catalog: &ConfiguredCatalog,
        state: Option<State>,
    ) -> Result<BoxStream<'static, Result<SourceEvent>>>;
}
