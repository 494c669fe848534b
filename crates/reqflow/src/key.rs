//! Cache key derivation.

use crate::error::Error;
use crate::request::{Body, Method, Request};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Which parts of a request identify its cached response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CacheKeyMode {
    /// Method and target only, e.g. `GET https://api.example.com/users`.
    #[default]
    MethodAndTarget,
    /// Method, target, headers and body.
    FullRequest,
}

/// Key under which a response is cached.
///
/// Equality and hashing use only the fingerprint. The key also keeps the
/// request it was derived from so a stale entry can be revalidated by
/// replaying it.
#[derive(Clone, Debug)]
pub struct RequestKey {
    fingerprint: String,
    request: Arc<Request>,
}

#[derive(Serialize)]
struct Fingerprint<'a> {
    method: Method,
    target: &'a str,
    headers: &'a BTreeMap<String, String>,
    body: Option<&'a Body>,
}

impl RequestKey {
    pub(crate) fn derive(mode: CacheKeyMode, request: &Request) -> Result<Self, Error> {
        let fingerprint = match mode {
            CacheKeyMode::MethodAndTarget => format!("{} {}", request.method(), request.target()),
            CacheKeyMode::FullRequest => serde_json::to_string(&Fingerprint {
                method: request.method(),
                target: request.target(),
                headers: request.headers(),
                body: request.body(),
            })
            .map_err(|e| Error::InvalidRequest(format!("cannot derive cache key: {e}")))?,
        };

        Ok(Self {
            fingerprint,
            request: Arc::new(request.clone()),
        })
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// The request this key was derived from.
    pub fn request(&self) -> &Request {
        &self.request
    }
}

impl PartialEq for RequestKey {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint
    }
}

impl Eq for RequestKey {}

impl Hash for RequestKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fingerprint.hash(state);
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fingerprint)
    }
}
