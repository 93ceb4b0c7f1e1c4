use crate::cache::{
    decode_record,
    CacheError,
    CacheRepository,
    FacetCache,
    CACHE_KEY,
};

use parking_lot::Mutex;
use std::{
    path::Path,
    sync::Arc,
};
use tracing::debug;

const FACET_CACHE_TREE: &str = "facet_cache";

/// Persists the facet cache as one JSON value in a sled tree.
#[derive(Clone)]
pub struct SledCacheRepository {
    tree: Arc<Mutex<sled::Tree>>,
}

impl std::fmt::Debug for SledCacheRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledCacheRepository").finish_non_exhaustive()
    }
}

impl SledCacheRepository {
    pub fn new(tree: sled::Tree) -> Self {
        Self {
            tree: Arc::new(Mutex::new(tree)),
        }
    }

    /// Opens (or creates) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let db: sled::Db = sled::Config::new().path(path.as_ref()).open()?;
        Ok(Self::new(db.open_tree(FACET_CACHE_TREE)?))
    }

    /// Creates a repository without persistence.
    pub fn new_ephemeral() -> Result<Self, CacheError> {
        let db: sled::Db = sled::Config::tmp()?.open()?;
        Ok(Self::new(db.open_tree(FACET_CACHE_TREE)?))
    }
}

impl CacheRepository for SledCacheRepository {
    fn read(&self) -> FacetCache {
        match self.tree.lock().get(CACHE_KEY) {
            Ok(stored) => decode_record(stored.as_deref()),
            Err(err) => {
                tracing::error!(
                    target: "diamond-inspector::cache",
                    ?err,
                    "Failed to read facet cache, starting empty"
                );
                FacetCache::default()
            }
        }
    }

    fn write(&self, cache: &FacetCache) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(cache)?;
        let len = bytes.len();
        let tree = self.tree.lock();
        tree.insert(CACHE_KEY, bytes)?;
        tree.flush()?;
        debug!(target: "diamond-inspector::cache", len, "Wrote facet cache");
        Ok(())
    }
}
