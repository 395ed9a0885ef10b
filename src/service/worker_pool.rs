use crate::service::retry::{directive_for, RetryDirective};
use crate::service::routing::RoutingEngine;
use crate::store::queue::{DispatchQueueRedis, QueuedItem};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;

/// Concurrent consumers draining the durable queue. Worker count bounds the
/// number of loops; the semaphore separately bounds in-flight remote calls.
#[derive(Clone)]
pub struct DispatchWorkerPool {
    pub queue: DispatchQueueRedis,
    pub engine: Arc<RoutingEngine>,
    pub permits: Arc<Semaphore>,
    pub dequeue_timeout: Duration,
    pub retry_backoff: Duration,
    pub max_retry_attempts: u32,
}

impl DispatchWorkerPool {
    pub fn spawn(
        self,
        workers: usize,
        shutdown: watch::Receiver<bool>,
    ) -> Vec<JoinHandle<()>> {
        (0..workers)
            .map(|worker| {
                let pool = self.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(async move { pool.run_worker(worker, shutdown).await })
            })
            .collect()
    }

    async fn run_worker(&self, worker: usize, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("starting dispatch worker {worker}");
        loop {
            if *shutdown.borrow() {
                break;
            }

            let popped = tokio::select! {
                _ = shutdown.changed() => continue,
                popped = self.queue.reliable_pop(self.dequeue_timeout) => popped,
            };

            let item = match popped {
                Ok(Some(item)) => item,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!("worker {worker}: queue error: {e}");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

            self.process_item(item, &mut shutdown).await;
        }
        tracing::info!("dispatch worker {worker} stopped");
    }

    async fn process_item(&self, item: QueuedItem, shutdown: &mut watch::Receiver<bool>) {
        // Retry throttle: a requeued request carries its accumulated delay.
        if let Some(delay) = item.request.delay() {
            tokio::select! {
                _ = shutdown.changed() => {
                    // Shutting down: hand the item back instead of starting
                    // a new call.
                    self.settle(&item, self.queue.requeue(&item.request).await).await;
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        let Ok(_permit) = self.permits.acquire().await else {
            return;
        };

        match self.engine.dispatch(&item.request).await {
            Ok(payment) => {
                tracing::debug!(
                    "payment {} processed by {}",
                    payment.correlation_id,
                    payment.processed_by
                );
                self.settle(&item, Ok(())).await;
            }
            Err(err) => {
                let directive =
                    directive_for(&err, item.request.retry_count, self.max_retry_attempts);
                match directive {
                    RetryDirective::Requeue => {
                        tracing::warn!("{err}; requeueing {}", item.request.correlation_id);
                        let retry = item.request.retry_after(self.retry_backoff);
                        self.settle(&item, self.queue.requeue(&retry).await).await;
                    }
                    RetryDirective::DeadLetter => {
                        tracing::error!(
                            "{err}; retries exhausted for {}, dead-lettering",
                            item.request.correlation_id
                        );
                        if let Err(e) = self.queue.bury(&item).await {
                            tracing::error!("could not dead-letter: {e}");
                        }
                    }
                    RetryDirective::Drop => {
                        tracing::error!("{err}; dropping {}", item.request.correlation_id);
                        self.settle(&item, Ok(())).await;
                    }
                }
            }
        }
    }

    /// Acknowledges the in-flight entry once the outcome (including any
    /// requeue) has been durably applied.
    async fn settle(&self, item: &QueuedItem, outcome: anyhow::Result<()>) {
        if let Err(e) = outcome {
            tracing::error!(
                "could not requeue {}; leaving it in-flight for recovery: {e}",
                item.request.correlation_id
            );
            return;
        }
        if let Err(e) = self.queue.ack(item).await {
            tracing::warn!("could not ack {}: {e}", item.request.correlation_id);
        }
    }
}
