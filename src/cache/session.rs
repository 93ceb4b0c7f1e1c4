use crate::cache::{
    CacheRepository,
    FacetCache,
    RefreshFallbacks,
    StalenessPolicy,
};

use tracing::error;

/// The in-memory facet cache of one orchestration run.
///
/// The record is read once when the session is loaded and written back through
/// the repository after every mutation. A failed write is logged and leaves the
/// in-memory record updated, so only persistence of that change is lost.
#[derive(Debug)]
pub struct CacheSession<R> {
    repository: R,
    record: FacetCache,
    policy: Box<dyn StalenessPolicy>,
}

impl<R: CacheRepository> CacheSession<R> {
    /// Reads the current record from `repository`.
    pub fn load(repository: R) -> Self {
        let record = repository.read();
        Self {
            repository,
            record,
            policy: Box::new(RefreshFallbacks),
        }
    }

    pub fn with_policy(mut self, policy: Box<dyn StalenessPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn record(&self) -> &FacetCache {
        &self.record
    }

    pub fn policy(&self) -> &dyn StalenessPolicy {
        self.policy.as_ref()
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Applies `mutate` to the record and persists the result.
    pub fn update(&mut self, mutate: impl FnOnce(&mut FacetCache)) {
        mutate(&mut self.record);
        if let Err(err) = self.repository.write(&self.record) {
            error!(
                target: "diamond-inspector::cache",
                ?err,
                "Failed to persist facet cache"
            );
        }
    }

    pub fn into_record(self) -> FacetCache {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::{
            CacheEntry,
            MaxAge,
            MemoryCacheRepository,
        },
        test_utils::random_address,
    };
    use std::{
        sync::Arc,
        time::Duration,
    };

    #[test]
    fn test_update_writes_through() {
        let repository = Arc::new(MemoryCacheRepository::new());
        let mut session = CacheSession::load(repository.clone());
        let address = random_address();

        session.update(|cache| {
            cache
                .contract_names
                .insert(address, CacheEntry::resolved("DiamondLoupeFacet".into()));
        });

        assert_eq!(repository.write_count(), 1);
        assert_eq!(&repository.read(), session.record());
    }

    #[test]
    fn test_load_reads_existing_record() {
        let address = random_address();
        let mut cache = FacetCache::default();
        cache
            .contract_names
            .insert(address, CacheEntry::resolved("OwnershipFacet".into()));

        let session = CacheSession::load(MemoryCacheRepository::with_record(&cache).unwrap());
        assert_eq!(session.record(), &cache);
        assert_eq!(session.repository().write_count(), 0);
    }

    #[test]
    fn test_policy_override() {
        let session = CacheSession::load(MemoryCacheRepository::new())
            .with_policy(Box::new(MaxAge(Duration::from_secs(10))));
        let entry = CacheEntry {
            value: (),
            resolved_at: 0,
            provenance: crate::cache::Provenance::Explorer,
        };
        assert!(entry.is_stale(session.policy(), 11));
    }
}
