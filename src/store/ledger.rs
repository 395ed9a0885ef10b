use crate::domain::payment::Payment;
use crate::domain::summary::{summarize, PaymentsSummary};
use anyhow::Result;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;

/// Idempotent sink for successfully processed payments.
#[async_trait::async_trait]
pub trait PaymentRecorder: Send + Sync {
    /// Create-if-absent keyed by correlation id. When an entry already
    /// exists, the stored value is authoritative and is returned instead.
    async fn register(&self, payment: Payment) -> Result<Payment>;
}

#[derive(Clone)]
pub struct PaymentLedgerRedis {
    pub client: redis::Client,
}

const PAYMENTS_HASH: &str = "payments";

impl PaymentLedgerRedis {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    pub async fn get_by_correlation_id(&self, correlation_id: &str) -> Result<Option<Payment>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload: Option<String> = conn.hget(PAYMENTS_HASH, correlation_id).await?;
        match payload {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    pub async fn get_summary(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<PaymentsSummary> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let entries: std::collections::HashMap<String, String> =
            conn.hgetall(PAYMENTS_HASH).await?;

        let payments = entries.into_values().filter_map(|payload| {
            match serde_json::from_str::<Payment>(&payload) {
                Ok(payment) => Some(payment),
                Err(e) => {
                    tracing::warn!("skipping corrupt ledger entry: {e}");
                    None
                }
            }
        });

        Ok(summarize(payments, from, to))
    }

    pub async fn purge(&self) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: usize = conn.del(PAYMENTS_HASH).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl PaymentRecorder for PaymentLedgerRedis {
    async fn register(&self, payment: Payment) -> Result<Payment> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(&payment)?;
        let inserted: bool = conn
            .hset_nx(PAYMENTS_HASH, &payment.correlation_id, payload)
            .await?;
        if inserted {
            return Ok(payment);
        }
        // Lost a race; the first writer's record wins.
        Ok(self
            .get_by_correlation_id(&payment.correlation_id)
            .await?
            .unwrap_or(payment))
    }
}
