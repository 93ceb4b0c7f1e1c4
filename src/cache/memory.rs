use crate::cache::{
    decode_record,
    CacheError,
    CacheRepository,
    FacetCache,
};

use parking_lot::Mutex;
use std::sync::atomic::{
    AtomicUsize,
    Ordering,
};

/// Keeps the serialized record in memory.
///
/// Useful for ephemeral runs and tests. The record goes through the same JSON
/// encoding as the durable repository, so serialization problems surface here too.
#[derive(Debug, Default)]
pub struct MemoryCacheRepository {
    stored: Mutex<Option<Vec<u8>>>,
    writes: AtomicUsize,
}

impl MemoryCacheRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository that already holds `cache`.
    pub fn with_record(cache: &FacetCache) -> Result<Self, CacheError> {
        let repository = Self::new();
        *repository.stored.lock() = Some(serde_json::to_vec(cache)?);
        Ok(repository)
    }

    /// Creates a repository holding raw bytes, e.g. a corrupted record.
    pub fn with_raw(bytes: impl Into<Vec<u8>>) -> Self {
        let repository = Self::new();
        *repository.stored.lock() = Some(bytes.into());
        repository
    }

    /// Number of successful writes since creation.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }
}

impl CacheRepository for MemoryCacheRepository {
    fn read(&self) -> FacetCache {
        decode_record(self.stored.lock().as_deref())
    }

    fn write(&self, cache: &FacetCache) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(cache)?;
        *self.stored.lock() = Some(bytes);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
