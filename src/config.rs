/// Configuration for the agent gate
use crate::error::{GateError, GateResult};
use serde::{Deserialize, Serialize};
use std::env;

/// Top-level gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    pub verify: VerifyConfig,
    pub cache: CacheConfig,
    pub outbound: OutboundRateLimitConfig,
}

/// Remote verification service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyConfig {
    /// Root URL of the identity verification service
    pub base_url: String,
    /// Outbound request timeout in seconds (default: 10)
    pub request_timeout_secs: u64,
    /// User-Agent header for outbound requests
    pub user_agent: String,
}

/// Verification cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL for cached outcomes in seconds (default: 300 = 5 minutes)
    pub ttl_secs: u64,
    /// Entry bound for the in-memory store (default: 1024)
    pub capacity: usize,
    /// Background expiry sweep interval in seconds (default: 60)
    pub sweep_interval_secs: u64,
    /// Use a shared Redis store instead of the in-memory one when set
    pub redis_url: Option<String>,
}

/// Rate limit applied to calls toward the verification service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundRateLimitConfig {
    pub enabled: bool,
    pub requests_per_second: u32,
    pub burst_size: u32,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            base_url: "https://agent-identity.onrender.com".to_string(),
            request_timeout_secs: 10,
            user_agent: format!("agent-gate/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            capacity: 1024,
            sweep_interval_secs: 60,
            redis_url: None,
        }
    }
}

impl Default for OutboundRateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: 50,
            burst_size: 100,
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            verify: VerifyConfig::default(),
            cache: CacheConfig::default(),
            outbound: OutboundRateLimitConfig::default(),
        }
    }
}

impl GateConfig {
    /// Load configuration from environment variables
    ///
    /// Every variable is optional; malformed values fall back to the
    /// defaults and are caught by `validate()` where they matter.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let defaults = Self::default();

        let verify = VerifyConfig {
            base_url: env::var("AGENT_GATE_BASE_URL").unwrap_or(defaults.verify.base_url),
            request_timeout_secs: env::var("AGENT_GATE_REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(defaults.verify.request_timeout_secs),
            user_agent: env::var("AGENT_GATE_USER_AGENT").unwrap_or(defaults.verify.user_agent),
        };

        let cache = CacheConfig {
            ttl_secs: env::var("AGENT_GATE_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap_or(defaults.cache.ttl_secs),
            capacity: env::var("AGENT_GATE_CACHE_CAPACITY")
                .unwrap_or_else(|_| "1024".to_string())
                .parse()
                .unwrap_or(defaults.cache.capacity),
            sweep_interval_secs: env::var("AGENT_GATE_CACHE_SWEEP_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(defaults.cache.sweep_interval_secs),
            redis_url: env::var("AGENT_GATE_REDIS_URL").ok(),
        };

        let outbound = OutboundRateLimitConfig {
            enabled: env::var("AGENT_GATE_OUTBOUND_LIMIT_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(defaults.outbound.enabled),
            requests_per_second: env::var("AGENT_GATE_OUTBOUND_RPS")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .unwrap_or(defaults.outbound.requests_per_second),
            burst_size: env::var("AGENT_GATE_OUTBOUND_BURST")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .unwrap_or(defaults.outbound.burst_size),
        };

        Self {
            verify,
            cache,
            outbound,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> GateResult<()> {
        if self.verify.base_url.is_empty() {
            return Err(GateError::Config(
                "Verification base URL cannot be empty".to_string(),
            ));
        }

        if !self.verify.base_url.starts_with("http") {
            return Err(GateError::Config(
                "Verification base URL must be an http(s) URL".to_string(),
            ));
        }

        if self.verify.request_timeout_secs == 0 {
            return Err(GateError::Config(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }

        if self.cache.ttl_secs == 0 {
            return Err(GateError::Config(
                "Cache TTL must be at least 1 second".to_string(),
            ));
        }

        if self.cache.capacity == 0 {
            return Err(GateError::Config(
                "Cache capacity must be at least 1 entry".to_string(),
            ));
        }

        if self.outbound.enabled && self.outbound.requests_per_second == 0 {
            return Err(GateError::Config(
                "Outbound rate limit must allow at least 1 request per second".to_string(),
            ));
        }

        Ok(())
    }
}
