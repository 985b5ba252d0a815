//! Error kinds raised inside the download pipeline.
//!
//! `Downloader` never hands these to its callers: every one of them is logged
//! and absorbed at the point it happens. They are public so custom transports
//! and codecs can produce them.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure of a single low-level GET.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Response arrived but the status was not 2xx.
    #[error("GET {uri} returned HTTP {code}")]
    Status { code: u32, uri: String },
    /// The per-request timeout elapsed.
    #[error("GET {uri} timed out")]
    Timeout { uri: String },
    /// Could not connect, resolve, send or receive.
    #[error("connection to {uri} failed: {source}")]
    Connection {
        uri: String,
        #[source]
        source: curl::Error,
    },
    /// Fixture transport has nothing registered for this URI.
    #[error("no fixture registered for {uri}")]
    NotFound { uri: String },
    /// Fixture transport was told to fail this URI (simulated outage).
    #[error("{uri} is unavailable")]
    Unavailable { uri: String },
    #[error("unsupported URI scheme '{scheme}' in {uri}")]
    UnsupportedScheme { scheme: String, uri: String },
    #[error("curl: {0}")]
    Curl(#[from] curl::Error),
    #[error("transfer task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Failure reading or writing a cache artifact.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The file is absent. Kept apart from other I/O errors because a missing
    /// payload behind a matching marker triggers marker cleanup.
    #[error("cache file {} does not exist", .path.display())]
    NotFound { path: PathBuf },
    #[error("cache I/O on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CacheError {
    pub(crate) fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            CacheError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            CacheError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound { .. })
    }
}

/// Failure inside a caller-supplied transformer, serializer or deserializer.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("codec: {0}")]
    Codec(#[from] io::Error),
    #[error("{0}")]
    Custom(String),
}

impl TransformError {
    pub fn custom(msg: impl Into<String>) -> Self {
        TransformError::Custom(msg.into())
    }
}

/// A cache policy that cannot map to two distinct files.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// The marker would be the payload file itself.
    #[error("checksum extension must not be empty")]
    EmptyExtension,
    /// The marker would land in a different directory than the payload.
    #[error("checksum extension {0:?} must not contain a path separator or NUL")]
    InvalidExtension(String),
}

/// Any failure along one step of a download.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl DownloadError {
    /// True only when a cache file was absent (not for a transport 404).
    pub fn is_not_found(&self) -> bool {
        matches!(self, DownloadError::Cache(e) if e.is_not_found())
    }
}
