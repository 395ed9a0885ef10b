use crate::domain::processor::ProcessorName;
use crate::domain::time::iso_millis;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A client submission as it arrives at the system boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub correlation_id: String,
    pub amount: Decimal,
}

impl PaymentRequest {
    /// Stamps the submission for its first trip through the queue.
    pub fn into_routable(self, now: DateTime<Utc>) -> RoutableRequest {
        RoutableRequest {
            correlation_id: self.correlation_id,
            amount: self.amount,
            requested_at: now,
            retry_count: 0,
            retry_delay: 0,
        }
    }
}

/// The queued/wire form of a payment. Immutable; a retry replaces the value
/// via [`RoutableRequest::retry_after`]. `retry_delay` is milliseconds,
/// accumulated across retries and never reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutableRequest {
    pub correlation_id: String,
    pub amount: Decimal,
    #[serde(with = "iso_millis")]
    pub requested_at: DateTime<Utc>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub retry_delay: u64,
}

impl RoutableRequest {
    pub fn retry_after(&self, increment: Duration) -> RoutableRequest {
        RoutableRequest {
            correlation_id: self.correlation_id.clone(),
            amount: self.amount,
            requested_at: self.requested_at,
            retry_count: self.retry_count + 1,
            retry_delay: self.retry_delay + increment.as_millis() as u64,
        }
    }

    pub fn delay(&self) -> Option<Duration> {
        (self.retry_delay > 0).then(|| Duration::from_millis(self.retry_delay))
    }

    pub fn to_payment(&self, processed_by: ProcessorName) -> Payment {
        Payment {
            correlation_id: self.correlation_id.clone(),
            processed_by,
            amount: self.amount,
            created_at: self.requested_at,
        }
    }
}

/// A successfully processed payment. Created once per correlation id, on the
/// 2xx path only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub correlation_id: String,
    pub processed_by: ProcessorName,
    pub amount: Decimal,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
}
