//! `cachedl inspect <id>` – show what the cache holds for an id.

use anyhow::Result;
use cachedl_core::checksum::sha256_file;
use cachedl_core::job::validate_extension;
use cachedl_core::CacheStore;

pub async fn run_inspect(store: &CacheStore, id: &str, checksum_ext: &str) -> Result<()> {
    validate_extension(checksum_ext)?;
    let paths = store.paths(id, checksum_ext);
    println!("id:       {id}");
    println!("payload:  {}", paths.payload.display());
    println!("marker:   {}", paths.checksum.display());

    match tokio::fs::metadata(&paths.payload).await {
        Ok(meta) if meta.is_file() => {
            println!("size:     {}", meta.len());
            println!("sha256:   {}", sha256_file(&paths.payload).await?);
        }
        Ok(_) => println!("size:     - (not a regular file)"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => println!("size:     - (not cached)"),
        Err(e) => return Err(e.into()),
    }

    match store.read_checksum(&paths.checksum).await {
        Ok(checksum) => println!("checksum: {checksum}"),
        Err(e) if e.is_not_found() => println!("checksum: - (no marker)"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
