//! Per-request transport options: custom headers and a timeout.

use std::collections::BTreeMap;
use std::time::Duration;

/// A header value: one string, or several sent as repeated header lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Single(String),
    Many(Vec<String>),
}

impl HeaderValue {
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            HeaderValue::Single(v) => std::slice::from_ref(v),
            HeaderValue::Many(vs) => vs,
        };
        slice.iter().map(String::as_str)
    }

    fn push(&mut self, value: String) {
        match self {
            HeaderValue::Single(first) => {
                *self = HeaderValue::Many(vec![std::mem::take(first), value]);
            }
            HeaderValue::Many(vs) => vs.push(value),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(v: &str) -> Self {
        HeaderValue::Single(v.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(v: String) -> Self {
        HeaderValue::Single(v)
    }
}

impl From<Vec<String>> for HeaderValue {
    fn from(vs: Vec<String>) -> Self {
        HeaderValue::Many(vs)
    }
}

/// Options passed to `Transport::get`.
///
/// The timeout bounds only the transport fetch, never checksum resolution or
/// cache file I/O.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub headers: BTreeMap<String, HeaderValue>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header. Adding an existing name appends another value.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.headers.get_mut(&name) {
            Some(existing) => existing.push(value),
            None => {
                self.headers.insert(name, HeaderValue::Single(value));
            }
        }
        self
    }

    /// Sets all values of a header at once, replacing any previous ones.
    pub fn header_values(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout_ms(self, ms: u64) -> Self {
        self.timeout(Duration::from_millis(ms))
    }

    /// Header lines in `Name: value` form, one per value.
    pub fn header_lines(&self) -> Vec<String> {
        self.headers
            .iter()
            .flat_map(|(name, value)| {
                value
                    .values()
                    .map(move |v| format!("{}: {}", name.trim(), v.trim()))
            })
            .collect()
    }
}
