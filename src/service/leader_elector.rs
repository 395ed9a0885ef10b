use crate::store::lease::Lease;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Keeps at most one active health prober per deployment. Followers poll
/// for the lease; the leader renews it and demotes itself the moment a
/// renewal fails. Losing the lease is a normal transition, not an error.
pub struct LeaderElector {
    pub lease: Arc<dyn Lease>,
    pub instance_id: String,
    pub lease_ttl: Duration,
    pub acquire_interval: Duration,
    pub renew_interval: Duration,
    is_leader: Arc<AtomicBool>,
}

impl LeaderElector {
    pub fn new(
        lease: Arc<dyn Lease>,
        instance_id: String,
        lease_ttl: Duration,
        acquire_interval: Duration,
        renew_interval: Duration,
    ) -> Self {
        Self {
            lease,
            instance_id,
            lease_ttl,
            acquire_interval,
            renew_interval,
            is_leader: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared flag the health monitor checks on every probe iteration.
    pub fn leadership(&self) -> Arc<AtomicBool> {
        self.is_leader.clone()
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if self.is_leader.load(Ordering::Relaxed) {
                self.renew_or_demote().await;
            } else {
                self.try_promote().await;
            }

            let wait = if self.is_leader.load(Ordering::Relaxed) {
                self.renew_interval
            } else {
                self.acquire_interval
            };
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }
        tracing::info!("leader elector for {} stopped", self.instance_id);
    }

    async fn try_promote(&self) {
        match self.lease.try_acquire(&self.instance_id, self.lease_ttl).await {
            Ok(true) => {
                self.is_leader.store(true, Ordering::Relaxed);
                tracing::info!("{} acquired the health lease", self.instance_id);
            }
            Ok(false) => {}
            Err(e) => tracing::warn!("lease acquisition failed: {e}"),
        }
    }

    async fn renew_or_demote(&self) {
        match self.lease.renew(&self.instance_id, self.lease_ttl).await {
            Ok(true) => {}
            Ok(false) => {
                self.is_leader.store(false, Ordering::Relaxed);
                tracing::info!("{} lost the health lease", self.instance_id);
            }
            Err(e) => {
                // Fail safe: without a confirmed renewal we must stop probing.
                self.is_leader.store(false, Ordering::Relaxed);
                tracing::warn!("lease renewal errored, demoting: {e}");
            }
        }
    }
}
