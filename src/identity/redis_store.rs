/// Redis-backed verification cache
///
/// Lets multiple gate processes share one verification cache. Entry
/// expiry is delegated to Redis key TTLs, so the periodic sweep is a
/// no-op for this store.
use crate::{
    error::{GateError, GateResult},
    identity::{AgentIdentity, CachedVerification, IdentityStore},
};
use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::{error, info, warn};

/// Key prefix for all gate cache entries
const KEY_PREFIX: &str = "agent-gate:verify:";

/// Redis verification store
#[derive(Clone)]
pub struct RedisIdentityStore {
    connection: ConnectionManager,
    ttl_secs: u64,
}

impl RedisIdentityStore {
    /// Connect to Redis and create the store
    pub async fn new(redis_url: &str, ttl_secs: u64) -> GateResult<Self> {
        info!("Connecting to Redis at {}", redis_url);

        let client = Client::open(redis_url).map_err(|e| {
            error!("Failed to create Redis client: {}", e);
            GateError::Cache(format!("Redis client creation failed: {}", e))
        })?;

        let connection = ConnectionManager::new(client).await.map_err(|e| {
            error!("Failed to connect to Redis: {}", e);
            GateError::Cache(format!("Redis connection failed: {}", e))
        })?;

        Ok(Self {
            connection,
            ttl_secs,
        })
    }

    fn build_key(&self, did: &str) -> String {
        format!("{}{}", KEY_PREFIX, did)
    }

    /// Ping Redis to check the connection
    pub async fn ping(&self) -> GateResult<()> {
        let mut conn = self.connection.clone();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| GateError::Cache(format!("Redis ping failed: {}", e)))?;

        if pong != "PONG" {
            return Err(GateError::Cache(
                "Unexpected Redis PING response".to_string(),
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl IdentityStore for RedisIdentityStore {
    async fn get(&self, did: &str) -> GateResult<Option<CachedVerification>> {
        let key = self.build_key(did);

        let mut conn = self.connection.clone();
        let result: Option<String> = conn.get(&key).await.map_err(|e| {
            warn!("Redis GET failed for {}: {}", key, e);
            GateError::Cache(format!("Cache get failed: {}", e))
        })?;

        match result {
            Some(json) => match serde_json::from_str(&json) {
                Ok(entry) => Ok(Some(entry)),
                Err(e) => {
                    warn!("Dropping corrupted cache entry for {}: {}", did, e);
                    let _ = self.invalidate(did).await;
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn put(&self, did: &str, identity: Option<AgentIdentity>) -> GateResult<()> {
        let key = self.build_key(did);
        let entry = CachedVerification {
            identity,
            cached_at: Utc::now(),
        };

        let json = serde_json::to_string(&entry)
            .map_err(|e| GateError::Cache(format!("Cache serialization failed: {}", e)))?;

        let mut conn = self.connection.clone();
        let _: () = conn.set_ex(&key, json, self.ttl_secs).await.map_err(|e| {
            warn!("Redis SET failed for {}: {}", key, e);
            GateError::Cache(format!("Cache set failed: {}", e))
        })?;

        Ok(())
    }

    async fn invalidate(&self, did: &str) -> GateResult<()> {
        let key = self.build_key(did);

        let mut conn = self.connection.clone();
        let _: () = conn.del(&key).await.map_err(|e| {
            warn!("Redis DELETE failed for {}: {}", key, e);
            GateError::Cache(format!("Cache delete failed: {}", e))
        })?;

        Ok(())
    }

    async fn sweep_expired(&self) -> GateResult<usize> {
        // Redis expires keys on its own
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_keys_are_prefixed() {
        let key = format!("{}{}", KEY_PREFIX, "did:agent:abc");
        assert_eq!(key, "agent-gate:verify:did:agent:abc");
    }

    #[test]
    fn cached_entries_round_trip_as_json() {
        let entry = CachedVerification {
            identity: None,
            cached_at: Utc::now(),
        };

        let json = serde_json::to_string(&entry).unwrap();
        let decoded: CachedVerification = serde_json::from_str(&json).unwrap();
        assert!(decoded.identity.is_none());
    }
}
