//! Response records.

use crate::request::{Method, Request};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Outcome of a completed transport call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub method: Method,
    pub target: String,
    pub status: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// `None` when no body could be read.
    #[serde(default)]
    pub body: Option<String>,
    #[serde(with = "crate::request::millis")]
    pub elapsed: Duration,
}

impl Response {
    /// Creates an empty-bodied response for `request` with the given status.
    pub fn new(request: &Request, status: u16) -> Self {
        Self {
            method: request.method(),
            target: request.target().to_string(),
            status,
            headers: BTreeMap::new(),
            body: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Returns true for a 2xx status.
    pub fn ok(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}
