//! Integration test: full checksum-then-payload flow over real HTTP.
//!
//! Starts a local server with a payload route and a checksum route, then
//! drives `Downloader<CurlTransport>` through first fetch, cache hit,
//! checksum outage and stale fallback.

mod common;

use cachedl_core::transform::{Json, Utf8Text};
use cachedl_core::{CachePolicy, CacheStore, ChecksumJob, CurlTransport, DownloadOut, Downloader, Job};
use common::http_server::{self, Route, TestServer};
use serde::Deserialize;
use tempfile::tempdir;
use url::Url;

#[derive(Debug, Deserialize, PartialEq)]
struct Manifest {
    version: String,
    files: Vec<String>,
}

fn manifest_job(server: &TestServer) -> Job<Manifest> {
    Job::new(
        "manifests/latest.json",
        Url::parse(&server.url("/latest.json")).unwrap(),
        Json::<Manifest>::new(),
    )
    .with_cache(CachePolicy::new(ChecksumJob::new(
        Url::parse(&server.url("/latest.json.sha1")).unwrap(),
    )))
}

#[tokio::test]
async fn versioned_document_is_cached_until_marker_changes() {
    let server = http_server::start();
    server.set("/latest.json", Route::ok(r#"{"version":"1","files":["a"]}"#));
    server.set("/latest.json.sha1", Route::ok("sha-1\n"));

    let cache_dir = tempdir().unwrap();
    let dl = Downloader::new(CurlTransport::new(), CacheStore::new(cache_dir.path()));
    let job = manifest_job(&server);

    let mut out = DownloadOut::default();
    let first = dl.download_with(&job, &mut out).await.expect("first download");
    assert_eq!(first.version, "1");
    assert_eq!(out.checksum.as_deref(), Some("sha-1"));
    let payload_path = out.cache_path.clone().expect("cache path");
    assert!(payload_path.starts_with(cache_dir.path()));
    assert!(payload_path.exists());

    // Same marker: served from disk even though the origin now errors.
    server.set("/latest.json", Route::status(500));
    let second = dl.download(&job).await.expect("cache hit");
    assert_eq!(second, first);
    assert_eq!(server.requests_for("/latest.json").len(), 1);

    // New marker: payload is fetched again.
    server.set("/latest.json", Route::ok(r#"{"version":"2","files":["a","b"]}"#));
    server.set("/latest.json.sha1", Route::ok("sha-2\n"));
    let third = dl.download(&job).await.expect("refetch");
    assert_eq!(third.version, "2");
    assert_eq!(server.requests_for("/latest.json").len(), 2);
}

#[tokio::test]
async fn origin_outage_serves_stale_copy() {
    let server = http_server::start();
    server.set("/latest.json", Route::ok(r#"{"version":"1","files":[]}"#));
    server.set("/latest.json.sha1", Route::ok("sha-1"));

    let cache_dir = tempdir().unwrap();
    let dl = Downloader::new(CurlTransport::new(), CacheStore::new(cache_dir.path()));
    let job = manifest_job(&server);
    dl.download(&job).await.expect("prime cache");

    server.set("/latest.json.sha1", Route::status(503));
    server.set("/latest.json", Route::status(503));
    let stale = dl.download(&job).await.expect("stale fallback");
    assert_eq!(stale.version, "1");
}

#[tokio::test]
async fn checksum_outage_with_live_origin_fetches_fresh_data() {
    let server = http_server::start();
    server.set("/notes.txt", Route::ok("fresh notes"));
    server.set("/notes.txt.md5", Route::status(503));

    let cache_dir = tempdir().unwrap();
    let dl = Downloader::new(CurlTransport::new(), CacheStore::new(cache_dir.path()));
    let job = Job::new(
        "notes.txt",
        Url::parse(&server.url("/notes.txt")).unwrap(),
        Utf8Text,
    )
    .with_cache(
        CachePolicy::new(ChecksumJob::new(
            Url::parse(&server.url("/notes.txt.md5")).unwrap(),
        ))
        .with_extension(".md5")
        .unwrap(),
    );

    let mut out = DownloadOut::default();
    assert_eq!(
        dl.download_with(&job, &mut out).await.as_deref(),
        Some("fresh notes")
    );
    assert!(out.checksum.is_none());
    assert!(cache_dir.path().join("notes.txt").exists());
    assert!(!cache_dir.path().join("notes.txt.md5").exists());
}

#[tokio::test]
async fn nothing_cached_and_origin_down_is_none() {
    let server = http_server::start();
    server.set("/latest.json.sha1", Route::ok("sha-1"));

    let cache_dir = tempdir().unwrap();
    let dl = Downloader::new(CurlTransport::new(), CacheStore::new(cache_dir.path()));
    assert!(dl.download(&manifest_job(&server)).await.is_none());
}
