//! Cache-validated downloader.
//!
//! Runs a `Job` against a `Transport` and a `CacheStore`:
//!
//! 1. no cache policy: plain fetch + transform;
//! 2. resolve the remote checksum through the job's checksum job (failure
//!    means "unknown", never fatal);
//! 3. marker equal to the checksum: serve the cached payload, skip the fetch;
//! 4. otherwise fetch, write marker and payload best-effort, return;
//! 5. fetch failed: serve whatever payload is cached, regardless of freshness.
//!
//! Every error is logged and absorbed; the only outcomes are `Some(value)` or
//! `None`. Concurrent downloads of the same id are not coordinated.

use crate::cache::{CachePaths, CacheStore};
use crate::error::{DownloadError, TransformError};
use crate::job::{validate_extension, CachePolicy, ChecksumJob, Job};
use crate::transform::Transformer;
use crate::transport::{RequestOptions, Transport};
use std::borrow::Cow;
use std::path::PathBuf;
use url::Url;

/// What a call actually used, for callers that want more than the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadOut {
    /// Payload cache path (set whenever the job has a cache policy).
    pub cache_path: Option<PathBuf>,
    /// Remote checksum resolved for this call, if any.
    pub checksum: Option<String>,
}

pub struct Downloader<T> {
    transport: T,
    store: CacheStore,
}

impl<T: Transport> Downloader<T> {
    pub fn new(transport: T, store: CacheStore) -> Self {
        Self { transport, store }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Runs `job`; `None` when neither the network nor the cache produced a value.
    pub async fn download<R>(&self, job: &Job<R>) -> Option<R> {
        let mut out = DownloadOut::default();
        self.download_with(job, &mut out).await
    }

    /// Like `download`, also reporting the cache path and checksum used in `out`.
    pub async fn download_with<R>(&self, job: &Job<R>, out: &mut DownloadOut) -> Option<R> {
        let Some(policy) = job.cache.as_ref() else {
            return self.download_uncached(job).await;
        };
        if let Err(e) = validate_extension(&policy.checksum_extension) {
            tracing::error!(id = %job.id, error = %e, "unusable cache policy; downloading without cache");
            return self.download_uncached(job).await;
        }

        let paths = self.store.paths(&job.id, &policy.checksum_extension);
        out.cache_path = Some(paths.payload.clone());

        let checksum = self.resolve_checksum(&job.id, &policy.checksum_job).await;
        out.checksum = checksum.clone();

        if let Some(checksum) = checksum.as_deref() {
            if let Some(value) = self.try_cache_hit(job, policy, &paths, checksum).await {
                return Some(value);
            }
        }

        match self.transport.get(&job.uri, &job.options).await {
            Ok(bytes) => {
                self.write_cache(&job.id, policy, &paths, checksum.as_deref(), &bytes)
                    .await;
                match job.transformer.transform(&bytes) {
                    Ok(value) => {
                        tracing::info!(
                            id = %job.id,
                            uri = %job.uri,
                            path = %paths.payload.display(),
                            "downloaded and cached"
                        );
                        return Some(value);
                    }
                    Err(e) => {
                        tracing::error!(
                            id = %job.id,
                            uri = %job.uri,
                            error = %e,
                            "transform of downloaded payload failed"
                        );
                    }
                }
            }
            Err(e) => {
                tracing::error!(id = %job.id, uri = %job.uri, error = %e, "download failed");
            }
        }

        self.stale_fallback(job, policy, &paths).await
    }

    async fn download_uncached<R>(&self, job: &Job<R>) -> Option<R> {
        match self
            .fetch(&job.uri, &job.options, job.transformer.as_ref())
            .await
        {
            Ok(value) => {
                tracing::info!(id = %job.id, uri = %job.uri, "downloaded");
                Some(value)
            }
            Err(e) => {
                tracing::error!(id = %job.id, uri = %job.uri, error = %e, "download failed");
                None
            }
        }
    }

    /// Uncached GET + transform. Shared by plain jobs and checksum jobs.
    async fn fetch<R>(
        &self,
        uri: &Url,
        options: &RequestOptions,
        transformer: &dyn Transformer<R>,
    ) -> Result<R, DownloadError> {
        let bytes = self.transport.get(uri, options).await?;
        Ok(transformer.transform(&bytes)?)
    }

    /// Current remote checksum, or `None` when it cannot be determined.
    async fn resolve_checksum(&self, id: &str, job: &ChecksumJob) -> Option<String> {
        match self.fetch(&job.uri, &job.options, job.transformer.as_ref()).await {
            Ok(checksum) if checksum.is_empty() => {
                tracing::warn!(id, uri = %job.uri, "remote checksum is empty; treating as unknown");
                None
            }
            Ok(checksum) => {
                tracing::debug!(id, uri = %job.uri, checksum = %checksum, "remote checksum");
                Some(checksum)
            }
            Err(e) => {
                tracing::error!(
                    id,
                    uri = %job.uri,
                    error = %e,
                    "checksum lookup failed; continuing without checksum"
                );
                None
            }
        }
    }

    /// Cached payload → deserializer → transformer.
    async fn read_cached<R>(
        &self,
        job: &Job<R>,
        policy: &CachePolicy,
        paths: &CachePaths,
    ) -> Result<R, DownloadError> {
        let stored = self.store.read(&paths.payload).await?;
        let bytes = match &policy.deserializer {
            Some(codec) => codec.apply(&stored)?,
            None => stored,
        };
        Ok(job.transformer.transform(&bytes)?)
    }

    /// Serves the cached payload when the marker equals `checksum`.
    async fn try_cache_hit<R>(
        &self,
        job: &Job<R>,
        policy: &CachePolicy,
        paths: &CachePaths,
        checksum: &str,
    ) -> Option<R> {
        match self.store.read_checksum(&paths.checksum).await {
            Ok(marker) if marker == checksum => {}
            Ok(marker) => {
                tracing::debug!(id = %job.id, cached = %marker, remote = %checksum, "checksum changed");
                return None;
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!(id = %job.id, path = %paths.checksum.display(), "no checksum marker");
                return None;
            }
            Err(e) => {
                tracing::error!(
                    id = %job.id,
                    path = %paths.checksum.display(),
                    error = %e,
                    "reading checksum marker failed"
                );
                return None;
            }
        }

        match self.read_cached(job, policy, paths).await {
            Ok(value) => {
                tracing::info!(
                    id = %job.id,
                    path = %paths.payload.display(),
                    checksum,
                    "cache hit; download skipped"
                );
                Some(value)
            }
            Err(e) => {
                tracing::error!(
                    id = %job.id,
                    path = %paths.payload.display(),
                    error = %e,
                    "reading cached payload failed"
                );
                if e.is_not_found() {
                    self.remove_marker(&job.id, paths).await;
                }
                None
            }
        }
    }

    /// Best-effort marker + payload write. Failures are logged only.
    async fn write_cache(
        &self,
        id: &str,
        policy: &CachePolicy,
        paths: &CachePaths,
        checksum: Option<&str>,
        bytes: &[u8],
    ) {
        match checksum {
            Some(checksum) => {
                if let Err(e) = self.store.write_checksum(&paths.checksum, checksum).await {
                    tracing::error!(
                        id,
                        path = %paths.checksum.display(),
                        error = %e,
                        "writing checksum marker failed"
                    );
                }
            }
            // The old marker described the payload about to be replaced.
            None => self.remove_marker(id, paths).await,
        }

        let serialized: Result<Cow<'_, [u8]>, TransformError> = match &policy.serializer {
            Some(codec) => codec.apply(bytes).map(Cow::Owned),
            None => Ok(Cow::Borrowed(bytes)),
        };
        match serialized {
            Ok(data) => {
                if let Err(e) = self.store.write(&paths.payload, &data).await {
                    tracing::error!(
                        id,
                        path = %paths.payload.display(),
                        error = %e,
                        "writing cached payload failed"
                    );
                }
            }
            Err(e) => {
                tracing::error!(id, error = %e, "serializing payload for cache failed");
            }
        }
    }

    async fn remove_marker(&self, id: &str, paths: &CachePaths) {
        match self.store.remove(&paths.checksum).await {
            Ok(()) => {
                tracing::debug!(id, path = %paths.checksum.display(), "removed stale checksum marker");
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                tracing::error!(
                    id,
                    path = %paths.checksum.display(),
                    error = %e,
                    "removing stale checksum marker failed"
                );
            }
        }
    }

    /// Last resort after a failed fetch: any cached payload, fresh or not.
    async fn stale_fallback<R>(
        &self,
        job: &Job<R>,
        policy: &CachePolicy,
        paths: &CachePaths,
    ) -> Option<R> {
        match self.read_cached(job, policy, paths).await {
            Ok(value) => {
                tracing::warn!(
                    id = %job.id,
                    uri = %job.uri,
                    path = %paths.payload.display(),
                    "download failed; using stale cached payload"
                );
                Some(value)
            }
            Err(e) => {
                tracing::error!(
                    id = %job.id,
                    path = %paths.payload.display(),
                    error = %e,
                    "no usable cached payload"
                );
                None
            }
        }
    }
}
