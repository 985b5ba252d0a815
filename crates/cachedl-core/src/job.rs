//! Job descriptors: what to fetch, where to cache it, how to decode it.

use crate::error::PolicyError;
use crate::transform::{ByteCodec, ChecksumText, GzipDecode, GzipEncode, Transformer};
use crate::transport::RequestOptions;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Marker suffix used when a cache policy does not set one.
pub const DEFAULT_CHECKSUM_EXTENSION: &str = ".cache";

/// Fetches the checksum of the current remote state.
///
/// Has no id and no cache policy of its own, so checksum resolution can never
/// recurse into another cached download.
#[derive(Clone)]
pub struct ChecksumJob {
    pub uri: Url,
    pub options: RequestOptions,
    pub transformer: Arc<dyn Transformer<String>>,
}

impl ChecksumJob {
    /// Checksum job reading the body as trimmed UTF-8 text.
    pub fn new(uri: Url) -> Self {
        Self {
            uri,
            options: RequestOptions::default(),
            transformer: Arc::new(ChecksumText),
        }
    }

    pub fn with_transformer(mut self, transformer: impl Transformer<String> + 'static) -> Self {
        self.transformer = Arc::new(transformer);
        self
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

impl fmt::Debug for ChecksumJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChecksumJob")
            .field("uri", &self.uri.as_str())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// A marker suffix must be non-empty and stay inside the payload's directory,
/// so the marker is always a different file next to the payload.
pub fn validate_extension(ext: &str) -> Result<(), PolicyError> {
    if ext.is_empty() {
        return Err(PolicyError::EmptyExtension);
    }
    if ext.contains(['/', '\\', '\0']) {
        return Err(PolicyError::InvalidExtension(ext.to_string()));
    }
    Ok(())
}

/// Caching policy: checksum source, marker suffix, and on-disk codecs.
///
/// `serializer` runs on fresh bytes before they are stored; `deserializer`
/// runs on bytes read back from the cache. `None` means identity.
#[derive(Clone)]
pub struct CachePolicy {
    pub checksum_job: ChecksumJob,
    pub checksum_extension: String,
    pub serializer: Option<Arc<dyn ByteCodec>>,
    pub deserializer: Option<Arc<dyn ByteCodec>>,
}

impl CachePolicy {
    pub fn new(checksum_job: ChecksumJob) -> Self {
        Self {
            checksum_job,
            checksum_extension: DEFAULT_CHECKSUM_EXTENSION.to_string(),
            serializer: None,
            deserializer: None,
        }
    }

    /// Marker suffix; see [`validate_extension`].
    pub fn with_extension(mut self, ext: impl Into<String>) -> Result<Self, PolicyError> {
        let ext = ext.into();
        validate_extension(&ext)?;
        self.checksum_extension = ext;
        Ok(self)
    }

    pub fn with_serializer(mut self, codec: impl ByteCodec + 'static) -> Self {
        self.serializer = Some(Arc::new(codec));
        self
    }

    pub fn with_deserializer(mut self, codec: impl ByteCodec + 'static) -> Self {
        self.deserializer = Some(Arc::new(codec));
        self
    }

    /// Store payloads gzip-compressed.
    pub fn gzip(self) -> Self {
        self.with_serializer(GzipEncode::default())
            .with_deserializer(GzipDecode)
    }
}

impl fmt::Debug for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachePolicy")
            .field("checksum_job", &self.checksum_job)
            .field("checksum_extension", &self.checksum_extension)
            .field("serializer", &self.serializer.is_some())
            .field("deserializer", &self.deserializer.is_some())
            .finish()
    }
}

/// One fetch producing a value of type `R`.
pub struct Job<R> {
    /// Cache key; `/` builds a hierarchy under the cache root.
    pub id: String,
    pub uri: Url,
    pub cache: Option<CachePolicy>,
    pub transformer: Arc<dyn Transformer<R>>,
    pub options: RequestOptions,
}

impl<R> Job<R> {
    pub fn new(
        id: impl Into<String>,
        uri: Url,
        transformer: impl Transformer<R> + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            uri,
            cache: None,
            transformer: Arc::new(transformer),
            options: RequestOptions::default(),
        }
    }

    pub fn with_cache(mut self, policy: CachePolicy) -> Self {
        self.cache = Some(policy);
        self
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

impl<R> Clone for Job<R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            uri: self.uri.clone(),
            cache: self.cache.clone(),
            transformer: Arc::clone(&self.transformer),
            options: self.options.clone(),
        }
    }
}

impl<R> fmt::Debug for Job<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("uri", &self.uri.as_str())
            .field("cache", &self.cache)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
