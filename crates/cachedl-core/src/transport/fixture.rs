//! Deterministic in-memory transport for tests and offline use.
//!
//! Resolves fixed URIs to fixed bytes; everything else fails with
//! `TransportError::NotFound`. Counts calls per URI so callers can assert
//! whether the network path was taken.

use super::{RequestOptions, Transport};
use crate::error::TransportError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use url::Url;

/// Content served for a registered URI.
#[derive(Debug, Clone, PartialEq)]
pub enum FixtureBody {
    Text(String),
    Bytes(Vec<u8>),
    /// Encoded as UTF-8 JSON when served.
    Json(serde_json::Value),
}

impl FixtureBody {
    fn into_bytes(self) -> Vec<u8> {
        match self {
            FixtureBody::Text(s) => s.into_bytes(),
            FixtureBody::Bytes(b) => b,
            FixtureBody::Json(v) => v.to_string().into_bytes(),
        }
    }
}

impl From<&str> for FixtureBody {
    fn from(s: &str) -> Self {
        FixtureBody::Text(s.to_string())
    }
}

impl From<String> for FixtureBody {
    fn from(s: String) -> Self {
        FixtureBody::Text(s)
    }
}

impl From<Vec<u8>> for FixtureBody {
    fn from(b: Vec<u8>) -> Self {
        FixtureBody::Bytes(b)
    }
}

impl From<serde_json::Value> for FixtureBody {
    fn from(v: serde_json::Value) -> Self {
        FixtureBody::Json(v)
    }
}

#[derive(Debug, Clone)]
enum Entry {
    Body(Vec<u8>),
    Unavailable,
}

#[derive(Debug, Default)]
pub struct FixtureTransport {
    entries: Mutex<HashMap<String, Entry>>,
    calls: Mutex<HashMap<String, usize>>,
}

/// Same normalization `Url` applies, so `https://host` and `https://host/` match.
fn key(uri: &str) -> String {
    Url::parse(uri)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| uri.to_string())
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl FixtureTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of `insert`.
    pub fn with(self, uri: &str, body: impl Into<FixtureBody>) -> Self {
        self.insert(uri, body);
        self
    }

    pub fn insert(&self, uri: &str, body: impl Into<FixtureBody>) {
        lock(&self.entries).insert(key(uri), Entry::Body(body.into().into_bytes()));
    }

    /// Unregisters `uri`; later GETs fail with `NotFound`.
    pub fn remove(&self, uri: &str) {
        lock(&self.entries).remove(&key(uri));
    }

    /// Simulates an outage: later GETs of `uri` fail with `Unavailable`.
    pub fn fail(&self, uri: &str) {
        lock(&self.entries).insert(key(uri), Entry::Unavailable);
    }

    /// Number of GETs issued for `uri`, successful or not.
    pub fn calls(&self, uri: &str) -> usize {
        lock(&self.calls).get(&key(uri)).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        lock(&self.calls).values().sum()
    }
}

#[async_trait]
impl Transport for FixtureTransport {
    async fn get(&self, uri: &Url, _options: &RequestOptions) -> Result<Vec<u8>, TransportError> {
        let k = uri.to_string();
        *lock(&self.calls).entry(k.clone()).or_insert(0) += 1;
        let entry = lock(&self.entries).get(&k).cloned();
        match entry {
            Some(Entry::Body(bytes)) => Ok(bytes),
            Some(Entry::Unavailable) => Err(TransportError::Unavailable { uri: k }),
            None => Err(TransportError::NotFound { uri: k }),
        }
    }
}
