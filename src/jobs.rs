/// Background maintenance for the verification cache
use crate::identity::IdentityStore;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info};

/// Spawn the periodic expiry sweep for a verification store
///
/// Stores also drop expired entries lazily on lookup; the sweep keeps an
/// idle process from holding stale outcomes between requests. The task
/// runs until the handle is aborted or the runtime shuts down.
pub fn spawn_cache_sweeper(store: Arc<dyn IdentityStore>, every: Duration) -> JoinHandle<()> {
    info!("Starting verification cache sweeper (every {:?})", every);

    tokio::spawn(async move {
        let mut interval = interval(every);

        loop {
            interval.tick().await;

            match store.sweep_expired().await {
                Ok(count) if count > 0 => {
                    info!("Swept {} expired verification outcomes", count);
                }
                Ok(_) => {
                    debug!("Verification cache sweep: nothing expired");
                }
                Err(e) => error!("Verification cache sweep failed: {}", e),
            }
        }
    })
}
