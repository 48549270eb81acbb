/// Agent Verifier - cache-backed remote identity verification
use crate::{
    config::GateConfig,
    error::{GateError, GateResult},
    identity::{AgentIdentity, IdentityStore},
    metrics,
    rate_limit::OutboundLimiter,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Outcome of one remote verification attempt
enum RemoteOutcome {
    /// Service vouched for the DID
    Verified(AgentIdentity),
    /// Service explicitly declined to verify the DID
    Denied,
    /// Transport failure, non-success status, or undecodable body
    Unavailable,
}

/// Main verifier - combines the injected cache store with remote lookups
pub struct AgentVerifier {
    store: Arc<dyn IdentityStore>,
    http_client: reqwest::Client,
    config: Arc<GateConfig>,
    limiter: Option<OutboundLimiter>,
    // Per-DID gates coalescing concurrent cache misses
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AgentVerifier {
    /// Create a new verifier over the given store
    pub fn new(config: Arc<GateConfig>, store: Arc<dyn IdentityStore>) -> GateResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.verify.user_agent.clone())
            .timeout(Duration::from_secs(config.verify.request_timeout_secs))
            .build()
            .map_err(|e| GateError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let limiter = if config.outbound.enabled {
            Some(OutboundLimiter::new(&config.outbound))
        } else {
            None
        };

        Ok(Self {
            store,
            http_client,
            config,
            limiter,
            inflight: Mutex::new(HashMap::new()),
        })
    }

    /// Verify an agent DID against the remote identity service
    ///
    /// Cached outcomes, including explicit negatives, are returned without
    /// a remote call while fresh. An explicit `verified: false` response
    /// is cached for the full TTL; transport failures and non-success
    /// statuses are NOT cached, so a transient outage never pins a denial
    /// past the next request. All failures collapse to `None`.
    pub async fn verify(&self, did: &str) -> Option<AgentIdentity> {
        if let Some(cached) = self.check_store(did).await {
            metrics::CACHE_HITS_TOTAL.inc();
            return cached;
        }
        metrics::CACHE_MISSES_TOTAL.inc();

        // Single-flight: the first caller for a DID performs the remote
        // call, concurrent callers wait on its gate and re-read the cache.
        let gate = {
            let mut inflight = self.inflight.lock().await;
            inflight
                .entry(did.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let guard = gate.lock().await;

        if let Some(cached) = self.check_store(did).await {
            metrics::CACHE_HITS_TOTAL.inc();
            drop(guard);
            self.release_gate(did).await;
            return cached;
        }

        let resolved = match self.fetch_remote(did).await {
            RemoteOutcome::Verified(identity) => {
                metrics::VERIFICATIONS_TOTAL
                    .with_label_values(&["verified"])
                    .inc();
                self.store_outcome(did, Some(identity.clone())).await;
                Some(identity)
            }
            RemoteOutcome::Denied => {
                metrics::VERIFICATIONS_TOTAL
                    .with_label_values(&["denied"])
                    .inc();
                self.store_outcome(did, None).await;
                None
            }
            RemoteOutcome::Unavailable => {
                metrics::VERIFICATIONS_TOTAL
                    .with_label_values(&["unavailable"])
                    .inc();
                None
            }
        };

        drop(guard);
        self.release_gate(did).await;

        resolved
    }

    /// Drop the cached outcome for a DID, forcing re-verification
    pub async fn invalidate(&self, did: &str) -> GateResult<()> {
        self.store.invalidate(did).await
    }

    /// The verification store this verifier writes to
    pub fn store(&self) -> Arc<dyn IdentityStore> {
        Arc::clone(&self.store)
    }

    /// Cache lookup; outer `None` is a miss, inner value is the cached
    /// outcome (which may itself be a negative)
    async fn check_store(&self, did: &str) -> Option<Option<AgentIdentity>> {
        match self.store.get(did).await {
            Ok(Some(entry)) => Some(entry.identity),
            Ok(None) => None,
            Err(e) => {
                // A broken store degrades to a cache miss
                warn!("Verification cache read failed for {}: {}", did, e);
                None
            }
        }
    }

    async fn store_outcome(&self, did: &str, identity: Option<AgentIdentity>) {
        if let Err(e) = self.store.put(did, identity).await {
            warn!("Failed to cache verification outcome for {}: {}", did, e);
        }
    }

    /// Remove the in-flight gate for a DID. Best effort: waiters already
    /// hold their own handle to the gate and keep serializing among
    /// themselves; a late arrival starting a fresh gate costs at most one
    /// extra serialized remote call.
    async fn release_gate(&self, did: &str) {
        let mut inflight = self.inflight.lock().await;
        inflight.remove(did);
    }

    async fn fetch_remote(&self, did: &str) -> RemoteOutcome {
        if let Some(limiter) = &self.limiter {
            if !limiter.check() {
                warn!(
                    "Outbound verification rate limit exceeded, treating {} as unverified",
                    did
                );
                return RemoteOutcome::Unavailable;
            }
        }

        let url = format!(
            "{}/verify/{}",
            self.config.verify.base_url.trim_end_matches('/'),
            urlencoding::encode(did)
        );

        let started = Instant::now();
        let response = match self.http_client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Verification request for {} failed: {}", did, e);
                return RemoteOutcome::Unavailable;
            }
        };
        metrics::REMOTE_VERIFY_DURATION_SECONDS.observe(started.elapsed().as_secs_f64());

        if !response.status().is_success() {
            warn!(
                "Verification service returned {} for {}",
                response.status(),
                did
            );
            return RemoteOutcome::Unavailable;
        }

        let body: serde_json::Value = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Undecodable verification response for {}: {}", did, e);
                return RemoteOutcome::Unavailable;
            }
        };

        if body
            .get("verified")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
        {
            match serde_json::from_value::<AgentIdentity>(body) {
                Ok(identity) => {
                    debug!(
                        "Agent {} verified (reputation {})",
                        did, identity.reputation
                    );
                    RemoteOutcome::Verified(identity)
                }
                Err(e) => {
                    warn!("Malformed identity record for {}: {}", did, e);
                    RemoteOutcome::Unavailable
                }
            }
        } else {
            debug!("Agent {} explicitly not verified", did);
            RemoteOutcome::Denied
        }
    }
}
