//! `cachedl clear <id>` – remove the payload and checksum marker for an id.

use anyhow::Result;
use cachedl_core::job::validate_extension;
use cachedl_core::CacheStore;

pub async fn run_clear(store: &CacheStore, id: &str, checksum_ext: &str) -> Result<()> {
    validate_extension(checksum_ext)?;
    let paths = store.paths(id, checksum_ext);
    let mut removed = 0;
    for path in [&paths.payload, &paths.checksum] {
        match store.remove(path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "removed cache file");
                removed += 1;
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }
    }
    if removed == 0 {
        println!("Nothing cached for {id}");
    } else {
        println!("Cleared {id}");
    }
    Ok(())
}
