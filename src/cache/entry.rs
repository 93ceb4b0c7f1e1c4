use serde::{
    Deserialize,
    Serialize,
};

use std::{
    fmt::Debug,
    time::{
        Duration,
        SystemTime,
        UNIX_EPOCH,
    },
};

/// Placeholder name older deployments wrote into the cache when a lookup
/// failed. Always treated as stale.
pub const UNKNOWN_CONTRACT: &str = "Unknown Contract";

/// Where a cached value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Resolved from the block explorer.
    Explorer,
    /// Synthesized locally after resolution failed.
    Fallback,
}

/// A cached value with the time it was resolved, in seconds since the unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    pub value: T,
    pub resolved_at: u64,
    pub provenance: Provenance,
}

impl<T> CacheEntry<T> {
    pub fn resolved(value: T) -> Self {
        Self {
            value,
            resolved_at: unix_now(),
            provenance: Provenance::Explorer,
        }
    }

    pub fn fallback(value: T) -> Self {
        Self {
            value,
            resolved_at: unix_now(),
            provenance: Provenance::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.provenance == Provenance::Fallback
    }

    pub fn is_stale(&self, policy: &dyn StalenessPolicy, now: u64) -> bool {
        policy.is_stale(self.provenance, self.resolved_at, now)
    }
}

/// Decides whether a cache entry must be resolved again.
pub trait StalenessPolicy: Debug + Send + Sync {
    fn is_stale(&self, provenance: Provenance, resolved_at: u64, now: u64) -> bool;
}

/// Explorer-resolved entries are kept forever, fallbacks are retried on every run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshFallbacks;

impl StalenessPolicy for RefreshFallbacks {
    fn is_stale(&self, provenance: Provenance, _resolved_at: u64, _now: u64) -> bool {
        provenance == Provenance::Fallback
    }
}

/// Like [`RefreshFallbacks`], but explorer entries also expire after `max_age`.
#[derive(Debug, Clone, Copy)]
pub struct MaxAge(pub Duration);

impl StalenessPolicy for MaxAge {
    fn is_stale(&self, provenance: Provenance, resolved_at: u64, now: u64) -> bool {
        provenance == Provenance::Fallback
            || now.saturating_sub(resolved_at) > self.0.as_secs()
    }
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_fallbacks() {
        let policy = RefreshFallbacks;
        let resolved = CacheEntry::resolved("DiamondCutFacet".to_string());
        let fallback = CacheEntry::fallback("0x1234…abcd".to_string());

        assert!(!resolved.is_stale(&policy, u64::MAX));
        assert!(fallback.is_stale(&policy, fallback.resolved_at));
        assert!(fallback.is_fallback());
    }

    #[test]
    fn test_max_age() {
        let policy = MaxAge(Duration::from_secs(60));
        let entry = CacheEntry {
            value: (),
            resolved_at: 1_000,
            provenance: Provenance::Explorer,
        };

        assert!(!entry.is_stale(&policy, 1_000));
        assert!(!entry.is_stale(&policy, 1_060));
        assert!(entry.is_stale(&policy, 1_061));
        // Clock skew must not make entries stale.
        assert!(!entry.is_stale(&policy, 10));

        let fallback = CacheEntry {
            provenance: Provenance::Fallback,
            ..entry
        };
        assert!(fallback.is_stale(&policy, 1_000));
    }

    #[test]
    fn test_entry_serialization() {
        let entry = CacheEntry {
            value: "OwnershipFacet".to_string(),
            resolved_at: 1_700_000_000,
            provenance: Provenance::Explorer,
        };
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            serde_json::json!({
                "value": "OwnershipFacet",
                "resolvedAt": 1_700_000_000u64,
                "provenance": "explorer"
            })
        );
    }
}
