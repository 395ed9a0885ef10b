use crate::domain::payment::RoutableRequest;
use anyhow::Result;
use redis::{AsyncCommands, Direction};
use std::time::Duration;

const PENDING_LIST: &str = "payments_to_process";
const QUARANTINE_LIST: &str = "payments_quarantine";
const DEAD_LIST: &str = "payments_dead";

/// Crash-tolerant work queue shared by every instance. Dequeue is an atomic
/// BLMOVE into a per-instance in-flight list, so a worker dying mid-dispatch
/// leaves the payload inspectable instead of lost.
#[derive(Clone)]
pub struct DispatchQueueRedis {
    pub client: redis::Client,
    pub instance_id: String,
}

/// A dequeued request plus the exact payload sitting in the in-flight list,
/// needed to acknowledge it once an outcome is decided.
pub struct QueuedItem {
    pub request: RoutableRequest,
    raw: String,
}

impl DispatchQueueRedis {
    pub fn new(client: redis::Client, instance_id: String) -> Self {
        Self {
            client,
            instance_id,
        }
    }

    fn in_flight_key(&self) -> String {
        format!("payments_pending:{}", self.instance_id)
    }

    /// New submissions go to the head of the pending list.
    pub async fn enqueue(&self, request: &RoutableRequest) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(request)?;
        let _: () = conn.lpush(PENDING_LIST, payload).await?;
        Ok(())
    }

    /// Retries go to the tail, behind fresh work.
    pub async fn requeue(&self, request: &RoutableRequest) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(request)?;
        let _: () = conn.rpush(PENDING_LIST, payload).await?;
        Ok(())
    }

    /// Atomically moves the next pending payload into this instance's
    /// in-flight list, blocking up to `timeout`. Undecodable payloads are
    /// quarantined rather than crashing the caller.
    pub async fn reliable_pop(&self, timeout: Duration) -> Result<Option<QueuedItem>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn
            .blmove(
                PENDING_LIST,
                self.in_flight_key(),
                Direction::Left,
                Direction::Left,
                timeout.as_secs_f64(),
            )
            .await?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        match serde_json::from_str::<RoutableRequest>(&raw) {
            Ok(request) => Ok(Some(QueuedItem { request, raw })),
            Err(e) => {
                tracing::warn!("quarantining undecodable queue payload: {e}");
                let _: () = conn.rpush(QUARANTINE_LIST, &raw).await?;
                let _: usize = conn.lrem(self.in_flight_key(), 1, &raw).await?;
                Ok(None)
            }
        }
    }

    /// Removes a settled item from the in-flight list.
    pub async fn ack(&self, item: &QueuedItem) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: usize = conn.lrem(self.in_flight_key(), 1, &item.raw).await?;
        Ok(())
    }

    /// Retires an item that exhausted its retry budget to the dead-letter
    /// list.
    pub async fn bury(&self, item: &QueuedItem) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.rpush(DEAD_LIST, &item.raw).await?;
        let _: usize = conn.lrem(self.in_flight_key(), 1, &item.raw).await?;
        Ok(())
    }

    pub async fn depths(&self) -> Result<(u64, u64)> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let pending: u64 = conn.llen(PENDING_LIST).await?;
        let in_flight: u64 = conn.llen(self.in_flight_key()).await?;
        Ok((pending, in_flight))
    }

    pub async fn purge_pending(&self) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: usize = conn.del(PENDING_LIST).await?;
        Ok(())
    }
}
