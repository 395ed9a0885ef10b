use crate::domain::health::ProcessorHealth;
use crate::domain::payment::RoutableRequest;
use crate::domain::processor::ProcessorName;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod http;
pub mod mock;

/// Body returned by a remote processor; `message` is populated on non-2xx.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessorReply {
    pub message: Option<String>,
}

/// Normalized result of one outbound payment call. Transport problems are
/// classified here so callers never see a raw client error.
#[derive(Debug, Clone)]
pub enum CallOutcome {
    Accepted,
    Rejected { status: u16, message: String },
    Unreachable { reason: String },
}

#[async_trait::async_trait]
pub trait ProcessorClient: Send + Sync {
    fn name(&self) -> ProcessorName;

    async fn process_payment(&self, request: &RoutableRequest, timeout: Duration)
        -> CallOutcome;

    /// Probes the processor's health endpoint. Any non-200 status or
    /// transport failure maps to the fail-safe unhealthy value.
    async fn probe_health(&self, timeout: Duration) -> ProcessorHealth;
}
