use crate::domain::health::ProcessorHealth;
use crate::domain::payment::RoutableRequest;
use crate::domain::processor::ProcessorName;
use crate::processors::{CallOutcome, ProcessorClient};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Scriptable stand-in for a remote processor, used by the test suite.
pub struct MockProcessor {
    pub name: ProcessorName,
    pub behavior: MockBehavior,
    calls: AtomicUsize,
}

#[derive(Debug, Clone, Copy)]
pub enum MockBehavior {
    AlwaysAccept,
    AlwaysServerError,
    AlwaysUnreachable,
}

impl MockProcessor {
    pub fn new(name: ProcessorName, behavior: MockBehavior) -> Self {
        Self {
            name,
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ProcessorClient for MockProcessor {
    fn name(&self) -> ProcessorName {
        self.name
    }

    async fn process_payment(
        &self,
        _request: &RoutableRequest,
        _timeout: Duration,
    ) -> CallOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            MockBehavior::AlwaysAccept => CallOutcome::Accepted,
            MockBehavior::AlwaysServerError => CallOutcome::Rejected {
                status: 500,
                message: "internal error".to_string(),
            },
            MockBehavior::AlwaysUnreachable => CallOutcome::Unreachable {
                reason: "connection refused".to_string(),
            },
        }
    }

    async fn probe_health(&self, _timeout: Duration) -> ProcessorHealth {
        match self.behavior {
            MockBehavior::AlwaysAccept => ProcessorHealth {
                failing: false,
                min_response_time: 0,
            },
            _ => ProcessorHealth::UNHEALTHY,
        }
    }
}
