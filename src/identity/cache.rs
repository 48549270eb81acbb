/// Verification cache stores
use crate::{
    error::GateResult,
    identity::{AgentIdentity, CachedVerification},
    metrics,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Storage seam for verification outcomes
///
/// Implementations own the TTL discipline: `get` must not return entries
/// older than the configured TTL.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Look up a cached outcome, including cached negatives.
    async fn get(&self, did: &str) -> GateResult<Option<CachedVerification>>;

    /// Record a verification outcome (`None` = explicit negative).
    async fn put(&self, did: &str, identity: Option<AgentIdentity>) -> GateResult<()>;

    /// Drop a cached outcome, forcing re-verification on next lookup.
    async fn invalidate(&self, did: &str) -> GateResult<()>;

    /// Remove expired entries, returning how many were dropped.
    async fn sweep_expired(&self) -> GateResult<usize>;
}

/// Bounded in-memory verification cache
///
/// Entries expire after the TTL and are dropped on lookup, by the
/// periodic sweep, and when making room for new entries. When the store
/// is full and nothing has expired, the oldest outcome is evicted.
pub struct MemoryIdentityStore {
    entries: RwLock<HashMap<String, CachedVerification>>,
    ttl: Duration,
    capacity: usize,
}

impl MemoryIdentityStore {
    /// Create a new in-memory store
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            capacity,
        }
    }

    /// Number of entries currently held (fresh or not yet swept)
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn get(&self, did: &str) -> GateResult<Option<CachedVerification>> {
        {
            let entries = self.entries.read().await;
            match entries.get(did) {
                None => return Ok(None),
                Some(entry) if Utc::now() - entry.cached_at < self.ttl => {
                    return Ok(Some(entry.clone()))
                }
                Some(_) => {}
            }
        }

        // Entry expired: drop it so the map does not hold stale outcomes.
        // Re-check under the write lock; a concurrent put may have
        // refreshed the entry, in which case this lookup stays a miss.
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(did) {
            if Utc::now() - entry.cached_at >= self.ttl {
                entries.remove(did);
                metrics::CACHE_ENTRIES.set(entries.len() as i64);
            }
        }

        Ok(None)
    }

    async fn put(&self, did: &str, identity: Option<AgentIdentity>) -> GateResult<()> {
        let mut entries = self.entries.write().await;

        if !entries.contains_key(did) && entries.len() >= self.capacity {
            // Make room: sweep expired entries first, then evict the
            // oldest outcome.
            let now = Utc::now();
            entries.retain(|_, entry| now - entry.cached_at < self.ttl);

            if entries.len() >= self.capacity {
                if let Some(oldest) = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.cached_at)
                    .map(|(did, _)| did.clone())
                {
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            did.to_string(),
            CachedVerification {
                identity,
                cached_at: Utc::now(),
            },
        );
        metrics::CACHE_ENTRIES.set(entries.len() as i64);

        Ok(())
    }

    async fn invalidate(&self, did: &str) -> GateResult<()> {
        let mut entries = self.entries.write().await;
        entries.remove(did);
        metrics::CACHE_ENTRIES.set(entries.len() as i64);

        Ok(())
    }

    async fn sweep_expired(&self) -> GateResult<usize> {
        let mut entries = self.entries.write().await;
        let before = entries.len();

        let now = Utc::now();
        entries.retain(|_, entry| now - entry.cached_at < self.ttl);
        metrics::CACHE_ENTRIES.set(entries.len() as i64);

        Ok(before - entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_identity(did: &str, reputation: f64) -> AgentIdentity {
        AgentIdentity {
            verified: true,
            did: did.to_string(),
            name: "Test Agent".to_string(),
            reputation,
            tasks_completed: 12,
            registered_at: "2025-01-15T00:00:00Z".to_string(),
            flags: 0,
            verification_url: format!("https://id.example/verify/{}", did),
        }
    }

    #[tokio::test]
    async fn put_and_get_positive_outcome() {
        let store = MemoryIdentityStore::new(Duration::minutes(5), 16);

        store
            .put("did:agent:a", Some(test_identity("did:agent:a", 4.5)))
            .await
            .unwrap();

        let cached = store.get("did:agent:a").await.unwrap();
        let identity = cached.unwrap().identity.unwrap();
        assert_eq!(identity.did, "did:agent:a");
        assert_eq!(identity.reputation, 4.5);
    }

    #[tokio::test]
    async fn negative_outcome_is_cached_distinctly_from_absence() {
        let store = MemoryIdentityStore::new(Duration::minutes(5), 16);

        store.put("did:agent:denied", None).await.unwrap();

        // Cached negative: an entry exists, its identity is None
        let cached = store.get("did:agent:denied").await.unwrap();
        assert!(cached.unwrap().identity.is_none());

        // Never-seen DID: no entry at all
        assert!(store.get("did:agent:unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_entries_are_dropped_on_lookup() {
        let store = MemoryIdentityStore::new(Duration::seconds(0), 16);

        store
            .put("did:agent:a", Some(test_identity("did:agent:a", 4.5)))
            .await
            .unwrap();

        assert!(store.get("did:agent:a").await.unwrap().is_none());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn invalidate_forces_miss() {
        let store = MemoryIdentityStore::new(Duration::minutes(5), 16);

        store
            .put("did:agent:a", Some(test_identity("did:agent:a", 4.5)))
            .await
            .unwrap();
        store.invalidate("did:agent:a").await.unwrap();

        assert!(store.get("did:agent:a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn capacity_bound_evicts_oldest() {
        let store = MemoryIdentityStore::new(Duration::minutes(5), 2);

        store
            .put("did:agent:a", Some(test_identity("did:agent:a", 1.0)))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store
            .put("did:agent:b", Some(test_identity("did:agent:b", 2.0)))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store
            .put("did:agent:c", Some(test_identity("did:agent:c", 3.0)))
            .await
            .unwrap();

        assert_eq!(store.len().await, 2);
        // Oldest entry was evicted to make room
        assert!(store.get("did:agent:a").await.unwrap().is_none());
        assert!(store.get("did:agent:b").await.unwrap().is_some());
        assert!(store.get("did:agent:c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn refreshing_an_existing_key_does_not_evict() {
        let store = MemoryIdentityStore::new(Duration::minutes(5), 2);

        store.put("did:agent:a", None).await.unwrap();
        store.put("did:agent:b", None).await.unwrap();
        store
            .put("did:agent:a", Some(test_identity("did:agent:a", 4.0)))
            .await
            .unwrap();

        assert_eq!(store.len().await, 2);
        assert!(store.get("did:agent:b").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn sweep_reports_dropped_count() {
        let store = MemoryIdentityStore::new(Duration::seconds(0), 16);

        store.put("did:agent:a", None).await.unwrap();
        store.put("did:agent:b", None).await.unwrap();

        let swept = store.sweep_expired().await.unwrap();
        assert_eq!(swept, 2);
        assert_eq!(store.len().await, 0);
    }
}
