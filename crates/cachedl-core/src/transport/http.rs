//! Network transport backed by libcurl.
//!
//! Dispatches on the URI scheme: `http` and `https` run a curl GET on the
//! blocking pool, anything else is rejected before touching the network.

use super::{RequestOptions, Transport};
use crate::config::CachedlConfig;
use crate::error::TransportError;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_MAX_REDIRECTIONS: u32 = 10;

#[derive(Debug, Clone)]
pub struct CurlTransport {
    connect_timeout: Duration,
    max_redirections: u32,
    user_agent: Option<String>,
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_redirections: DEFAULT_MAX_REDIRECTIONS,
            user_agent: None,
        }
    }
}

impl CurlTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(cfg: &CachedlConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            max_redirections: cfg.max_redirections,
            user_agent: cfg.user_agent.clone(),
        }
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Blocking GET. Runs in the current thread; `get` wraps it in `spawn_blocking`.
    fn get_blocking(&self, uri: &Url, options: &RequestOptions) -> Result<Vec<u8>, TransportError> {
        let mut body = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(uri.as_str())?;
        easy.follow_location(true)?;
        easy.max_redirections(self.max_redirections)?;
        easy.connect_timeout(self.connect_timeout)?;
        if let Some(timeout) = options.timeout {
            easy.timeout(timeout)?;
        }
        if let Some(ua) = &self.user_agent {
            easy.useragent(ua)?;
        }

        let lines = options.header_lines();
        if !lines.is_empty() {
            let mut list = curl::easy::List::new();
            for line in &lines {
                list.append(line)?;
            }
            easy.http_headers(list)?;
        }

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform().map_err(|e| classify(uri, e))?;
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(TransportError::Status {
                code,
                uri: uri.to_string(),
            });
        }
        tracing::debug!(uri = %uri, bytes = body.len(), "GET complete");
        Ok(body)
    }
}

#[async_trait]
impl Transport for CurlTransport {
    async fn get(&self, uri: &Url, options: &RequestOptions) -> Result<Vec<u8>, TransportError> {
        match uri.scheme() {
            "http" | "https" => {
                let this = self.clone();
                let uri = uri.clone();
                let options = options.clone();
                tokio::task::spawn_blocking(move || this.get_blocking(&uri, &options)).await?
            }
            other => Err(TransportError::UnsupportedScheme {
                scheme: other.to_string(),
                uri: uri.to_string(),
            }),
        }
    }
}

/// Sort a curl failure into timeout, connection, or other.
fn classify(uri: &Url, e: curl::Error) -> TransportError {
    if e.is_operation_timedout() {
        return TransportError::Timeout {
            uri: uri.to_string(),
        };
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return TransportError::Connection {
            uri: uri.to_string(),
            source: e,
        };
    }
    TransportError::Curl(e)
}
