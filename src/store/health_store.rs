use crate::domain::health::ProcessorHealth;
use crate::domain::processor::ProcessorName;
use anyhow::Result;
use redis::AsyncCommands;

/// Health-state reads needed by the routing engine. The shared store is the
/// single source of truth; no instance caches a health snapshot.
#[async_trait::async_trait]
pub trait HealthSource: Send + Sync {
    /// Last-known health for `name`; a missing entry is fail-safe unhealthy.
    async fn health_of(&self, name: ProcessorName) -> Result<ProcessorHealth>;

    /// Local circuit-break: flags `name` as failing ahead of the next probe,
    /// preserving its last observed `minResponseTime`.
    async fn mark_failing(&self, name: ProcessorName) -> Result<()>;
}

#[derive(Clone)]
pub struct HealthStoreRedis {
    pub client: redis::Client,
}

impl HealthStoreRedis {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    fn health_key(name: ProcessorName) -> String {
        format!("healthcheck:{}", name.value())
    }

    pub async fn set(&self, name: ProcessorName, health: ProcessorHealth) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(&health)?;
        let _: () = conn.set(Self::health_key(name), payload).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl HealthSource for HealthStoreRedis {
    async fn health_of(&self, name: ProcessorName) -> Result<ProcessorHealth> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload: Option<String> = conn.get(Self::health_key(name)).await?;
        let health = match payload {
            Some(payload) => match serde_json::from_str(&payload) {
                Ok(health) => health,
                Err(e) => {
                    tracing::warn!("corrupt health entry for {name}: {e}");
                    ProcessorHealth::UNHEALTHY
                }
            },
            None => ProcessorHealth::UNHEALTHY,
        };
        Ok(health)
    }

    async fn mark_failing(&self, name: ProcessorName) -> Result<()> {
        let last = self.health_of(name).await?;
        self.set(
            name,
            ProcessorHealth {
                failing: true,
                min_response_time: last.min_response_time,
            },
        )
        .await
    }
}
