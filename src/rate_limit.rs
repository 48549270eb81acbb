/// Outbound rate limiting toward the verification service
use crate::config::OutboundRateLimitConfig;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorLimiter,
};
use std::{num::NonZeroU32, sync::Arc};

/// Process-wide limiter for calls to the verification service
#[derive(Clone)]
pub struct OutboundLimiter {
    limiter: Arc<GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl OutboundLimiter {
    pub fn new(config: &OutboundRateLimitConfig) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::new(50).unwrap()),
        )
        .allow_burst(NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::new(100).unwrap()));

        Self {
            limiter: Arc::new(GovernorLimiter::direct(quota)),
        }
    }

    /// Returns false when the call budget toward the remote service is
    /// currently spent
    pub fn check(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_request_allowed() {
        let limiter = OutboundLimiter::new(&OutboundRateLimitConfig::default());
        assert!(limiter.check());
    }

    #[test]
    fn burst_limit_enforced() {
        let config = OutboundRateLimitConfig {
            enabled: true,
            requests_per_second: 10,
            burst_size: 5,
        };
        let limiter = OutboundLimiter::new(&config);

        // Allowed up to the burst
        for _ in 0..5 {
            assert!(limiter.check());
        }

        // Budget spent
        assert!(!limiter.check());
    }
}
