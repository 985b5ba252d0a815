//! `cachedl path` – print the cache root.

use cachedl_core::CacheStore;

pub fn run_path(store: &CacheStore) {
    println!("{}", store.root().display());
}
