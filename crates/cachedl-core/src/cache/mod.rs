//! Filesystem cache store.
//!
//! Each job id maps to two independent files under the cache root: the
//! payload at `<root>/<id>` and the checksum marker at `<root>/<id><ext>`.
//! Every write stages its bytes in a uniquely named hidden `.part` file next
//! to the target and renames it into place. There is no locking; concurrent
//! writers to the same id race and the last rename wins.

mod key;

pub use key::key_path;

use crate::error::CacheError;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Suffix of the staging files written before the atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Payload and marker locations for one job id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePaths {
    pub payload: PathBuf,
    pub checksum: PathBuf,
}

#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

/// Appends `suffix` to the file name (`a/b.json` + `.cache` → `a/b.json.cache`).
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut o = path.as_os_str().to_owned();
    o.push(suffix);
    PathBuf::from(o)
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic payload/marker paths for `id`.
    pub fn paths(&self, id: &str, checksum_extension: &str) -> CachePaths {
        let payload = self.root.join(key_path(id));
        let checksum = with_suffix(&payload, checksum_extension);
        CachePaths { payload, checksum }
    }

    pub async fn read(&self, path: &Path) -> Result<Vec<u8>, CacheError> {
        tokio::fs::read(path)
            .await
            .map_err(|e| CacheError::from_io(path, e))
    }

    /// Writes `bytes` to `path` through a unique temp file + rename, creating
    /// parent dirs.
    pub async fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
        let target = path.to_path_buf();
        let data = bytes.to_vec();
        tokio::task::spawn_blocking(move || write_atomic(&target, &data))
            .await
            .map_err(|e| CacheError::from_io(path, io::Error::other(e)))?
    }

    pub async fn remove(&self, path: &Path) -> Result<(), CacheError> {
        tokio::fs::remove_file(path)
            .await
            .map_err(|e| CacheError::from_io(path, e))
    }

    /// Reads a checksum marker, stripping the single trailing newline.
    pub async fn read_checksum(&self, path: &Path) -> Result<String, CacheError> {
        let bytes = self.read(path).await?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(text.strip_suffix('\n').unwrap_or(&text).to_string())
    }

    /// Writes `checksum` followed by one newline.
    pub async fn write_checksum(&self, path: &Path, checksum: &str) -> Result<(), CacheError> {
        let mut line = String::with_capacity(checksum.len() + 1);
        line.push_str(checksum);
        line.push('\n');
        self.write(path, line.as_bytes()).await
    }
}

/// `.<file name>.` so staging files are hidden and named after their target.
fn temp_prefix(path: &Path) -> OsString {
    let mut prefix = OsString::from(".");
    if let Some(name) = path.file_name() {
        prefix.push(name);
    }
    prefix.push(".");
    prefix
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| CacheError::from_io(parent, e))?;

    let prefix = temp_prefix(path);
    let mut temp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(parent)
        .map_err(|e| CacheError::from_io(parent, e))?;
    let temp_path = temp.path().to_path_buf();
    temp.write_all(bytes)
        .and_then(|()| temp.flush())
        .map_err(|e| CacheError::from_io(&temp_path, e))?;
    // A failed persist drops the temp file, which deletes it.
    temp.persist(path)
        .map_err(|e| CacheError::from_io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_id_and_extension() {
        let store = CacheStore::new("/var/cache/cachedl");
        let p = store.paths("versions/manifest.json", ".cache");
        assert_eq!(p.payload, Path::new("/var/cache/cachedl/versions/manifest.json"));
        assert_eq!(p.checksum, Path::new("/var/cache/cachedl/versions/manifest.json.cache"));
    }

    #[tokio::test]
    async fn write_creates_parents_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let p = store.paths("a/b/c", ".sum");

        store.write(&p.payload, b"payload").await.unwrap();
        assert_eq!(store.read(&p.payload).await.unwrap(), b"payload");
        let leftovers: Vec<_> = std::fs::read_dir(p.payload.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .filter(|n| n.to_string_lossy().ends_with(TEMP_SUFFIX))
            .collect();
        assert!(leftovers.is_empty(), "{leftovers:?}");
    }

    #[tokio::test]
    async fn marker_named_like_a_staging_file_survives_payload_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let p = store.paths("x", TEMP_SUFFIX);

        store.write_checksum(&p.checksum, "v1").await.unwrap();
        store.write(&p.payload, b"payload").await.unwrap();
        assert_eq!(store.read_checksum(&p.checksum).await.unwrap(), "v1");
        assert_eq!(store.read(&p.payload).await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn concurrent_writes_to_one_path_both_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let p = store.paths("shared", ".cache");
        let big_a = vec![b'a'; 1 << 20];
        let big_b = vec![b'b'; 1 << 20];

        let (ra, rb) = tokio::join!(store.write(&p.payload, &big_a), store.write(&p.payload, &big_b));
        ra.unwrap();
        rb.unwrap();
        let stored = store.read(&p.payload).await.unwrap();
        assert!(stored == big_a || stored == big_b);
    }

    #[tokio::test]
    async fn write_over_a_directory_fails_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let p = store.paths("blocked", ".cache");
        std::fs::create_dir_all(p.payload.join("inner")).unwrap();

        let err = store.write(&p.payload, b"data").await.unwrap_err();
        assert!(!err.is_not_found());
        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .ends_with(TEMP_SUFFIX)
            })
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn checksum_marker_has_trailing_newline_on_disk_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let p = store.paths("x", ".cache");

        store.write_checksum(&p.checksum, "abc").await.unwrap();
        assert_eq!(std::fs::read(&p.checksum).unwrap(), b"abc\n");
        assert_eq!(store.read_checksum(&p.checksum).await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn missing_files_are_reported_as_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let p = store.paths("nothing-here", ".cache");

        assert!(store.read(&p.payload).await.unwrap_err().is_not_found());
        assert!(store.read_checksum(&p.checksum).await.unwrap_err().is_not_found());
        assert!(store.remove(&p.checksum).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn reading_a_directory_is_an_io_error_not_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let p = store.paths("x", ".cache");
        std::fs::create_dir_all(&p.checksum).unwrap();

        let err = store.read_checksum(&p.checksum).await.unwrap_err();
        assert!(!err.is_not_found());
    }
}
