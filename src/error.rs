use crate::domain::processor::ProcessorName;
use thiserror::Error;

/// Outcome classification for a single dispatch attempt. Transient failures
/// are requeued by the worker pool; terminal ones are dropped.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("all remote payment processors are failing")]
    AllProcessorsUnavailable,

    #[error("{processor} remote payment processor errored, request will be resubmitted")]
    Retryable { processor: ProcessorName },

    #[error("{processor} remote payment processor rejected the payment")]
    Terminal { processor: ProcessorName },

    #[error("shared store error: {0}")]
    Store(#[from] anyhow::Error),
}
