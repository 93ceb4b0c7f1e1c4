mod entry;
pub use entry::{
    unix_now,
    CacheEntry,
    MaxAge,
    Provenance,
    RefreshFallbacks,
    StalenessPolicy,
    UNKNOWN_CONTRACT,
};

mod memory;
pub use memory::MemoryCacheRepository;

mod session;
pub use session::CacheSession;

mod sled_repository;
pub use sled_repository::SledCacheRepository;

use crate::{
    abi::Abi,
    primitives::{
        Address,
        MethodClassification,
    },
};

use serde::{
    Deserialize,
    Serialize,
};

use std::{
    collections::BTreeMap,
    sync::Arc,
};

/// Key the serialized [`FacetCache`] is stored under.
pub const CACHE_KEY: &str = "facetCache";

#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    #[error("Sled error")]
    SledError(#[from] std::io::Error),
    #[error("Cache serialization error")]
    SerdeError(#[from] serde_json::Error),
}

/// Everything resolved about the facets of a diamond, keyed by facet address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetCache {
    #[serde(default)]
    pub contract_names: BTreeMap<Address, CacheEntry<String>>,
    #[serde(default)]
    pub method_names: BTreeMap<Address, CacheEntry<MethodClassification>>,
    #[serde(default)]
    pub abis: BTreeMap<Address, CacheEntry<Abi>>,
}

impl FacetCache {
    pub fn is_empty(&self) -> bool {
        self.contract_names.is_empty() && self.method_names.is_empty() && self.abis.is_empty()
    }
}

/// Durable storage for a single [`FacetCache`] record.
///
/// There is no partial update: callers mutate the record in memory and write
/// the whole record back. Concurrent writers are last-write-wins.
pub trait CacheRepository: Send + Sync {
    /// Reads the stored record. Returns an empty record when nothing is stored
    /// or the stored value cannot be parsed.
    fn read(&self) -> FacetCache;

    /// Replaces the stored record with `cache`.
    fn write(&self, cache: &FacetCache) -> Result<(), CacheError>;
}

impl<R: CacheRepository + ?Sized> CacheRepository for Arc<R> {
    fn read(&self) -> FacetCache {
        (**self).read()
    }

    fn write(&self, cache: &FacetCache) -> Result<(), CacheError> {
        (**self).write(cache)
    }
}

/// Decodes a stored record, falling back to an empty one.
fn decode_record(bytes: Option<&[u8]>) -> FacetCache {
    let Some(bytes) = bytes else {
        return FacetCache::default();
    };

    serde_json::from_slice(bytes).unwrap_or_else(|err| {
        tracing::warn!(
            target: "diamond-inspector::cache",
            %err,
            "Stored facet cache is unreadable, starting empty"
        );
        FacetCache::default()
    })
}
