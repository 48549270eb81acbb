/// Gate context and dependency wiring
use crate::{
    config::GateConfig,
    error::GateResult,
    identity::{AgentVerifier, IdentityStore, MemoryIdentityStore, RedisIdentityStore},
    jobs,
};
use chrono::Duration;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Shared state for the gates: configuration plus the verifier
///
/// Cheap to clone; hand it to `Router::with_state` directly or embed it
/// in an application state that implements `FromRef<State> -> GateContext`.
#[derive(Clone)]
pub struct GateContext {
    pub config: Arc<GateConfig>,
    pub verifier: Arc<AgentVerifier>,
}

impl GateContext {
    /// Create a context from configuration, choosing the store from it:
    /// in-memory by default, Redis when a URL is configured
    pub async fn new(config: GateConfig) -> GateResult<Self> {
        config.validate()?;

        let store: Arc<dyn IdentityStore> = match &config.cache.redis_url {
            Some(url) => {
                info!("Using shared Redis verification cache");
                Arc::new(RedisIdentityStore::new(url, config.cache.ttl_secs).await?)
            }
            None => Arc::new(MemoryIdentityStore::new(
                Duration::seconds(config.cache.ttl_secs as i64),
                config.cache.capacity,
            )),
        };

        Self::with_store(config, store)
    }

    /// Create a context with a caller-supplied store (tests, custom
    /// backends)
    pub fn with_store(config: GateConfig, store: Arc<dyn IdentityStore>) -> GateResult<Self> {
        config.validate()?;

        let config = Arc::new(config);
        let verifier = Arc::new(AgentVerifier::new(Arc::clone(&config), store)?);

        Ok(Self { config, verifier })
    }

    /// Spawn the background expiry sweep at the configured interval
    pub fn start_sweeper(&self) -> JoinHandle<()> {
        jobs::spawn_cache_sweeper(
            self.verifier.store(),
            std::time::Duration::from_secs(self.config.cache.sweep_interval_secs),
        )
    }

    /// Registration URL surfaced in rejection payloads
    pub fn register_url(&self) -> String {
        format!("{}/", self.config.verify.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn context_from_default_config_uses_memory_store() {
        let ctx = GateContext::new(GateConfig::default()).await.unwrap();
        assert_eq!(ctx.register_url(), "https://agent-identity.onrender.com/");
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let mut config = GateConfig::default();
        config.cache.ttl_secs = 0;
        assert!(GateContext::new(config).await.is_err());
    }

    #[tokio::test]
    async fn register_url_normalizes_trailing_slash() {
        let mut config = GateConfig::default();
        config.verify.base_url = "https://id.example/".to_string();
        let ctx = GateContext::new(config).await.unwrap();
        assert_eq!(ctx.register_url(), "https://id.example/");
    }
}
