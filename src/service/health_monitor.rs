use crate::processors::ProcessorClient;
use crate::store::health_store::HealthStoreRedis;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Periodic health prober. Each processor gets its own loop and interval;
/// probing happens only while this instance holds the leader lease, and the
/// result is written to the shared store unconditionally (last write wins).
#[derive(Clone)]
pub struct HealthMonitor {
    pub store: HealthStoreRedis,
    pub is_leader: Arc<AtomicBool>,
    pub probe_timeout: Duration,
}

impl HealthMonitor {
    pub async fn run(
        self,
        client: Arc<dyn ProcessorClient>,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let name = client.name();
        tracing::info!("starting health monitor for {name}");
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(interval) => {}
            }

            if !self.is_leader.load(Ordering::Relaxed) {
                continue;
            }

            let health = client.probe_health(self.probe_timeout).await;
            if let Err(e) = self.store.set(name, health).await {
                tracing::warn!("could not record {name} health: {e}");
            }
        }
        tracing::info!("health monitor for {name} stopped");
    }
}
