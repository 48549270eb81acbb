/// Agent Identity Verification
///
/// Verifies caller-supplied agent DIDs against a remote identity service
/// and caches the outcomes behind a pluggable store.

pub mod cache;
pub mod redis_store;
pub mod verifier;

pub use cache::{IdentityStore, MemoryIdentityStore};
pub use redis_store::RedisIdentityStore;
pub use verifier::AgentVerifier;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Verified agent identity data, deserialized verbatim from the
/// verification service response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentIdentity {
    pub verified: bool,
    pub did: String,
    pub name: String,
    pub reputation: f64,
    pub tasks_completed: u64,
    pub registered_at: String,
    pub flags: u64,
    pub verification_url: String,
}

/// Cached verification outcome
///
/// `identity: None` is a cached negative: the service explicitly declined
/// to verify this DID within the TTL window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedVerification {
    pub identity: Option<AgentIdentity>,
    pub cached_at: DateTime<Utc>,
}
