//! Low-level transport: a single GET that yields the whole body or fails.
//!
//! The downloader only depends on the `Transport` trait. `CurlTransport` talks
//! to the network; `FixtureTransport` serves fixed bytes for deterministic
//! tests.

mod fixture;
mod http;
mod options;

pub use fixture::{FixtureBody, FixtureTransport};
pub use http::CurlTransport;
pub use options::{HeaderValue, RequestOptions};

use crate::error::TransportError;
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `uri` and return the full response body.
    ///
    /// Fails on a non-2xx status, a connection failure, or a timeout.
    async fn get(&self, uri: &Url, options: &RequestOptions) -> Result<Vec<u8>, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn get(&self, uri: &Url, options: &RequestOptions) -> Result<Vec<u8>, TransportError> {
        (**self).get(uri, options).await
    }
}
