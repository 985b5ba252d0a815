//! `cachedl get <uri>...` – fetch payloads, optionally through the checksum cache.

use anyhow::{bail, Context, Result};
use cachedl_core::config::CachedlConfig;
use cachedl_core::transform::RawBytes;
use cachedl_core::{
    CachePolicy, CacheStore, ChecksumJob, CurlTransport, Downloader, Job, RequestOptions,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use url::Url;

/// Arguments of `cachedl get`, as parsed by clap.
#[derive(Debug, Clone)]
pub struct GetRequest {
    pub uris: Vec<String>,
    pub id: Option<String>,
    pub checksum_uri: Option<String>,
    pub checksum_ext: Option<String>,
    pub headers: Vec<String>,
    pub timeout_ms: Option<u64>,
    pub gzip: bool,
    pub output: Option<PathBuf>,
}

/// Splits a `Name: value` header argument.
pub(crate) fn parse_header(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .with_context(|| format!("header must be 'Name: value', got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("header name is empty in {raw:?}");
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn parse_uri(raw: &str) -> Result<Url> {
    Url::parse(raw).with_context(|| format!("invalid URI: {raw}"))
}

fn request_options(cfg: &CachedlConfig, req: &GetRequest) -> Result<RequestOptions> {
    let mut options = RequestOptions::new();
    for raw in &req.headers {
        let (name, value) = parse_header(raw)?;
        options = options.header(name, value);
    }
    if let Some(ms) = req.timeout_ms.or(cfg.timeout_ms) {
        options = options.timeout_ms(ms);
    }
    Ok(options)
}

fn build_jobs(cfg: &CachedlConfig, req: &GetRequest) -> Result<Vec<Job<Vec<u8>>>> {
    if req.output.is_some() && req.uris.len() > 1 {
        bail!("--output can only be used with a single URI");
    }
    if req.id.is_some() && req.uris.len() > 1 {
        bail!("--id can only be used with a single URI");
    }

    let options = request_options(cfg, req)?;
    let mut jobs = Vec::with_capacity(req.uris.len());
    for raw in &req.uris {
        let uri = parse_uri(raw)?;
        let id = req.id.clone().unwrap_or_else(|| raw.clone());
        let mut job = Job::new(id, uri, RawBytes).with_options(options.clone());
        if let Some(checksum_raw) = &req.checksum_uri {
            let checksum_job =
                ChecksumJob::new(parse_uri(checksum_raw)?).with_options(options.clone());
            let ext = req
                .checksum_ext
                .clone()
                .unwrap_or_else(|| cfg.checksum_extension.clone());
            let mut policy = CachePolicy::new(checksum_job).with_extension(ext)?;
            if req.gzip {
                policy = policy.gzip();
            }
            job = job.with_cache(policy);
        }
        jobs.push(job);
    }
    Ok(jobs)
}

pub async fn run_get(cfg: &CachedlConfig, store: CacheStore, req: GetRequest) -> Result<()> {
    let jobs = build_jobs(cfg, &req)?;
    let downloader = Arc::new(Downloader::new(CurlTransport::from_config(cfg), store));

    let mut set = JoinSet::new();
    for (index, job) in jobs.into_iter().enumerate() {
        let downloader = Arc::clone(&downloader);
        set.spawn(async move {
            let body = downloader.download(&job).await;
            (index, job.uri, body)
        });
    }

    let mut results = Vec::with_capacity(req.uris.len());
    while let Some(joined) = set.join_next().await {
        results.push(joined.context("download task panicked")?);
    }
    results.sort_by_key(|(index, _, _)| *index);

    let mut failed = Vec::new();
    let mut bodies = Vec::new();
    for (_, uri, body) in results {
        match body {
            Some(bytes) => bodies.push(bytes),
            None => failed.push(uri.to_string()),
        }
    }

    match &req.output {
        Some(path) => {
            if let Some(bytes) = bodies.first() {
                tokio::fs::write(path, bytes)
                    .await
                    .with_context(|| format!("write {}", path.display()))?;
                tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote output");
            }
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            for bytes in &bodies {
                lock.write_all(bytes).context("write to stdout")?;
            }
            lock.flush().context("flush stdout")?;
        }
    }

    if !failed.is_empty() {
        bail!("no data for: {}", failed.join(", "));
    }
    Ok(())
}
