use crate::domain::health::ProcessorHealth;
use crate::domain::payment::{Payment, RoutableRequest};
use crate::domain::processor::ProcessorName;
use crate::error::DispatchError;
use crate::processors::{CallOutcome, ProcessorClient};
use crate::store::health_store::HealthSource;
use crate::store::ledger::PaymentRecorder;
use std::sync::Arc;
use std::time::Duration;

/// Tie-break between two healthy processors. The default processor always
/// wins under `PreferDefault`; `LowestResponseTime` routes to whichever
/// advertises the lower `minResponseTime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingPolicy {
    PreferDefault,
    LowestResponseTime,
}

impl std::str::FromStr for RoutingPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "prefer-default" => Ok(RoutingPolicy::PreferDefault),
            "lowest-response-time" => Ok(RoutingPolicy::LowestResponseTime),
            other => Err(format!("unknown routing policy: {other}")),
        }
    }
}

/// Picks the processor for the next attempt. The fallback is chosen only
/// when the default is failing and the fallback is not, or when both are
/// healthy and the policy says the fallback is faster. The caller still has
/// to check the returned health before dialing out.
pub fn choose_processor(
    policy: RoutingPolicy,
    default_health: ProcessorHealth,
    fallback_health: ProcessorHealth,
) -> (ProcessorName, ProcessorHealth) {
    if default_health.failing && !fallback_health.failing {
        return (ProcessorName::Fallback, fallback_health);
    }
    if policy == RoutingPolicy::LowestResponseTime
        && !default_health.failing
        && !fallback_health.failing
        && fallback_health.min_response_time < default_health.min_response_time
    {
        return (ProcessorName::Fallback, fallback_health);
    }
    (ProcessorName::Default, default_health)
}

/// Per-payment decision and execution: read health, pick a tier, call it,
/// classify the outcome, record the payment on success.
pub struct RoutingEngine {
    pub health: Arc<dyn HealthSource>,
    pub ledger: Arc<dyn PaymentRecorder>,
    pub default_processor: Arc<dyn ProcessorClient>,
    pub fallback_processor: Arc<dyn ProcessorClient>,
    pub policy: RoutingPolicy,
    pub processor_timeout: Duration,
}

impl RoutingEngine {
    fn client_for(&self, name: ProcessorName) -> &dyn ProcessorClient {
        match name {
            ProcessorName::Default => self.default_processor.as_ref(),
            ProcessorName::Fallback => self.fallback_processor.as_ref(),
        }
    }

    pub async fn dispatch(&self, request: &RoutableRequest) -> Result<Payment, DispatchError> {
        let default_health = self.health.health_of(ProcessorName::Default).await?;
        let fallback_health = self.health.health_of(ProcessorName::Fallback).await?;

        let (chosen, health) = choose_processor(self.policy, default_health, fallback_health);
        if health.failing {
            return Err(DispatchError::AllProcessorsUnavailable);
        }

        let timeout = health.call_timeout(self.processor_timeout);
        let outcome = self.client_for(chosen).process_payment(request, timeout).await;

        match outcome {
            CallOutcome::Accepted => {
                let payment = request.to_payment(chosen);
                let stored = self.ledger.register(payment).await?;
                Ok(stored)
            }
            CallOutcome::Rejected { status, message } => {
                tracing::warn!(
                    "{chosen} : {status} - {message} ({})",
                    request.correlation_id
                );
                self.classify_rejection(chosen).await
            }
            CallOutcome::Unreachable { reason } => {
                tracing::warn!("{chosen} unreachable: {reason} ({})", request.correlation_id);
                self.classify_rejection(chosen).await
            }
        }
    }

    /// Any non-2xx or transport failure from the default tier is a
    /// retryable fault that also circuit-breaks the default in the shared
    /// health state; the same from the fallback tier is terminal, since no
    /// further tier exists.
    async fn classify_rejection(&self, chosen: ProcessorName) -> Result<Payment, DispatchError> {
        match chosen {
            ProcessorName::Default => {
                if let Err(e) = self.health.mark_failing(ProcessorName::Default).await {
                    tracing::warn!("could not flag default processor as failing: {e}");
                }
                Err(DispatchError::Retryable {
                    processor: ProcessorName::Default,
                })
            }
            ProcessorName::Fallback => Err(DispatchError::Terminal {
                processor: ProcessorName::Fallback,
            }),
        }
    }
}
