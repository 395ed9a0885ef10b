use payments_dispatch::domain::health::ProcessorHealth;
use payments_dispatch::domain::payment::{Payment, PaymentRequest, RoutableRequest};
use payments_dispatch::domain::processor::ProcessorName;
use payments_dispatch::error::DispatchError;
use payments_dispatch::processors::mock::{MockBehavior, MockProcessor};
use payments_dispatch::processors::{CallOutcome, ProcessorClient};
use payments_dispatch::service::routing::{RoutingEngine, RoutingPolicy};
use payments_dispatch::store::health_store::HealthSource;
use payments_dispatch::store::ledger::PaymentRecorder;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct FakeHealth {
    map: Mutex<HashMap<ProcessorName, ProcessorHealth>>,
}

impl FakeHealth {
    fn with(default: ProcessorHealth, fallback: ProcessorHealth) -> Arc<FakeHealth> {
        let mut map = HashMap::new();
        map.insert(ProcessorName::Default, default);
        map.insert(ProcessorName::Fallback, fallback);
        Arc::new(FakeHealth {
            map: Mutex::new(map),
        })
    }

    fn health_snapshot(&self, name: ProcessorName) -> ProcessorHealth {
        self.map
            .lock()
            .unwrap()
            .get(&name)
            .copied()
            .unwrap_or(ProcessorHealth::UNHEALTHY)
    }
}

#[async_trait::async_trait]
impl HealthSource for FakeHealth {
    async fn health_of(&self, name: ProcessorName) -> anyhow::Result<ProcessorHealth> {
        Ok(self.health_snapshot(name))
    }

    async fn mark_failing(&self, name: ProcessorName) -> anyhow::Result<()> {
        let mut map = self.map.lock().unwrap();
        let last = map.get(&name).copied().unwrap_or(ProcessorHealth::UNHEALTHY);
        map.insert(
            name,
            ProcessorHealth {
                failing: true,
                min_response_time: last.min_response_time,
            },
        );
        Ok(())
    }
}

struct FakeLedger {
    records: Mutex<HashMap<String, Payment>>,
}

impl FakeLedger {
    fn empty() -> Arc<FakeLedger> {
        Arc::new(FakeLedger {
            records: Mutex::new(HashMap::new()),
        })
    }

    fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    fn get(&self, correlation_id: &str) -> Option<Payment> {
        self.records.lock().unwrap().get(correlation_id).cloned()
    }
}

#[async_trait::async_trait]
impl PaymentRecorder for FakeLedger {
    async fn register(&self, payment: Payment) -> anyhow::Result<Payment> {
        let mut records = self.records.lock().unwrap();
        Ok(records
            .entry(payment.correlation_id.clone())
            .or_insert(payment)
            .clone())
    }
}

/// Records the timeout the engine derived from the health snapshot.
struct TimeoutProbe {
    last_timeout: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl ProcessorClient for TimeoutProbe {
    fn name(&self) -> ProcessorName {
        ProcessorName::Default
    }

    async fn process_payment(
        &self,
        _request: &RoutableRequest,
        timeout: Duration,
    ) -> CallOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_timeout.lock().unwrap() = Some(timeout);
        CallOutcome::Accepted
    }

    async fn probe_health(&self, _timeout: Duration) -> ProcessorHealth {
        ProcessorHealth::UNHEALTHY
    }
}

fn healthy(min_response_time: u64) -> ProcessorHealth {
    ProcessorHealth {
        failing: false,
        min_response_time,
    }
}

fn request(correlation_id: &str) -> RoutableRequest {
    PaymentRequest {
        correlation_id: correlation_id.to_string(),
        amount: dec!(100.00),
    }
    .into_routable(chrono::Utc::now())
}

fn engine(
    health: Arc<FakeHealth>,
    ledger: Arc<FakeLedger>,
    default_processor: Arc<dyn ProcessorClient>,
    fallback_processor: Arc<dyn ProcessorClient>,
    policy: RoutingPolicy,
) -> RoutingEngine {
    RoutingEngine {
        health,
        ledger,
        default_processor,
        fallback_processor,
        policy,
        processor_timeout: Duration::from_millis(1500),
    }
}

#[tokio::test]
async fn routes_to_default_when_healthy() {
    let health = FakeHealth::with(healthy(100), healthy(50));
    let ledger = FakeLedger::empty();
    let default = Arc::new(MockProcessor::new(
        ProcessorName::Default,
        MockBehavior::AlwaysAccept,
    ));
    let fallback = Arc::new(MockProcessor::new(
        ProcessorName::Fallback,
        MockBehavior::AlwaysAccept,
    ));
    let engine = engine(
        health,
        ledger.clone(),
        default.clone(),
        fallback.clone(),
        RoutingPolicy::PreferDefault,
    );

    let req = request("c1");
    let payment = engine.dispatch(&req).await.unwrap();

    assert_eq!(default.calls(), 1);
    assert_eq!(fallback.calls(), 0);
    assert_eq!(payment.processed_by, ProcessorName::Default);
    assert_eq!(payment.created_at, req.requested_at);
    assert_eq!(ledger.get("c1").unwrap().amount, dec!(100.00));
}

#[tokio::test]
async fn falls_back_when_default_is_failing() {
    let health = FakeHealth::with(ProcessorHealth::UNHEALTHY, healthy(50));
    let ledger = FakeLedger::empty();
    let default = Arc::new(MockProcessor::new(
        ProcessorName::Default,
        MockBehavior::AlwaysAccept,
    ));
    let fallback = Arc::new(MockProcessor::new(
        ProcessorName::Fallback,
        MockBehavior::AlwaysAccept,
    ));
    let engine = engine(
        health,
        ledger.clone(),
        default.clone(),
        fallback.clone(),
        RoutingPolicy::PreferDefault,
    );

    let payment = engine.dispatch(&request("c2")).await.unwrap();

    assert_eq!(default.calls(), 0);
    assert_eq!(fallback.calls(), 1);
    assert_eq!(payment.processed_by, ProcessorName::Fallback);
}

#[tokio::test]
async fn both_failing_means_no_outbound_call() {
    let health = FakeHealth::with(ProcessorHealth::UNHEALTHY, ProcessorHealth::UNHEALTHY);
    let ledger = FakeLedger::empty();
    let default = Arc::new(MockProcessor::new(
        ProcessorName::Default,
        MockBehavior::AlwaysAccept,
    ));
    let fallback = Arc::new(MockProcessor::new(
        ProcessorName::Fallback,
        MockBehavior::AlwaysAccept,
    ));
    let engine = engine(
        health,
        ledger.clone(),
        default.clone(),
        fallback.clone(),
        RoutingPolicy::PreferDefault,
    );

    let err = engine.dispatch(&request("c3")).await.unwrap_err();

    assert!(matches!(err, DispatchError::AllProcessorsUnavailable));
    assert_eq!(default.calls(), 0);
    assert_eq!(fallback.calls(), 0);
    assert_eq!(ledger.len(), 0);
}

#[tokio::test]
async fn server_error_from_default_circuit_breaks_and_reroutes() {
    let health = FakeHealth::with(healthy(100), healthy(50));
    let ledger = FakeLedger::empty();
    let default = Arc::new(MockProcessor::new(
        ProcessorName::Default,
        MockBehavior::AlwaysServerError,
    ));
    let fallback = Arc::new(MockProcessor::new(
        ProcessorName::Fallback,
        MockBehavior::AlwaysAccept,
    ));
    let engine = engine(
        health.clone(),
        ledger.clone(),
        default.clone(),
        fallback.clone(),
        RoutingPolicy::PreferDefault,
    );

    let err = engine.dispatch(&request("c4")).await.unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Retryable {
            processor: ProcessorName::Default
        }
    ));
    assert!(health.health_snapshot(ProcessorName::Default).failing);
    assert_eq!(ledger.len(), 0);

    // The circuit-break steers the next attempt to the fallback.
    let payment = engine.dispatch(&request("c5")).await.unwrap();
    assert_eq!(payment.processed_by, ProcessorName::Fallback);
    assert_eq!(default.calls(), 1);
    assert_eq!(fallback.calls(), 1);
}

#[tokio::test]
async fn server_error_from_fallback_is_terminal() {
    let health = FakeHealth::with(ProcessorHealth::UNHEALTHY, healthy(50));
    let ledger = FakeLedger::empty();
    let default = Arc::new(MockProcessor::new(
        ProcessorName::Default,
        MockBehavior::AlwaysAccept,
    ));
    let fallback = Arc::new(MockProcessor::new(
        ProcessorName::Fallback,
        MockBehavior::AlwaysServerError,
    ));
    let engine = engine(
        health.clone(),
        ledger.clone(),
        default,
        fallback,
        RoutingPolicy::PreferDefault,
    );

    let err = engine.dispatch(&request("c6")).await.unwrap_err();

    assert!(matches!(
        err,
        DispatchError::Terminal {
            processor: ProcessorName::Fallback
        }
    ));
    // Fallback rejections never touch the health state.
    assert!(!health.health_snapshot(ProcessorName::Fallback).failing);
    assert_eq!(ledger.len(), 0);
}

#[tokio::test]
async fn transport_error_from_default_is_retryable() {
    let health = FakeHealth::with(healthy(100), healthy(50));
    let ledger = FakeLedger::empty();
    let default = Arc::new(MockProcessor::new(
        ProcessorName::Default,
        MockBehavior::AlwaysUnreachable,
    ));
    let fallback = Arc::new(MockProcessor::new(
        ProcessorName::Fallback,
        MockBehavior::AlwaysAccept,
    ));
    let engine = engine(
        health.clone(),
        ledger,
        default,
        fallback,
        RoutingPolicy::PreferDefault,
    );

    let err = engine.dispatch(&request("c7")).await.unwrap_err();

    assert!(matches!(
        err,
        DispatchError::Retryable {
            processor: ProcessorName::Default
        }
    ));
    assert!(health.health_snapshot(ProcessorName::Default).failing);
}

#[tokio::test]
async fn lowest_response_time_policy_prefers_the_faster_tier() {
    let ledger = FakeLedger::empty();
    let default = Arc::new(MockProcessor::new(
        ProcessorName::Default,
        MockBehavior::AlwaysAccept,
    ));
    let fallback = Arc::new(MockProcessor::new(
        ProcessorName::Fallback,
        MockBehavior::AlwaysAccept,
    ));

    let engine_fast_fallback = engine(
        FakeHealth::with(healthy(3000), healthy(100)),
        ledger.clone(),
        default.clone(),
        fallback.clone(),
        RoutingPolicy::LowestResponseTime,
    );
    let payment = engine_fast_fallback.dispatch(&request("c8")).await.unwrap();
    assert_eq!(payment.processed_by, ProcessorName::Fallback);

    // The same snapshot under the default policy sticks with the default.
    let engine_prefer_default = engine(
        FakeHealth::with(healthy(3000), healthy(100)),
        ledger,
        default.clone(),
        fallback,
        RoutingPolicy::PreferDefault,
    );
    let payment = engine_prefer_default.dispatch(&request("c9")).await.unwrap();
    assert_eq!(payment.processed_by, ProcessorName::Default);
    assert_eq!(default.calls(), 1);
}

#[tokio::test]
async fn stored_record_wins_a_register_race() {
    let health = FakeHealth::with(healthy(100), healthy(50));
    let ledger = FakeLedger::empty();

    // Another instance already recorded c10 against the fallback.
    let req = request("c10");
    let first = req.to_payment(ProcessorName::Fallback);
    ledger.register(first.clone()).await.unwrap();

    let default = Arc::new(MockProcessor::new(
        ProcessorName::Default,
        MockBehavior::AlwaysAccept,
    ));
    let fallback = Arc::new(MockProcessor::new(
        ProcessorName::Fallback,
        MockBehavior::AlwaysAccept,
    ));
    let engine = engine(
        health,
        ledger.clone(),
        default,
        fallback,
        RoutingPolicy::PreferDefault,
    );

    let stored = engine.dispatch(&req).await.unwrap();

    assert_eq!(stored, first);
    assert_eq!(ledger.len(), 1);
}

#[tokio::test]
async fn call_timeout_comes_from_the_health_snapshot() {
    let ledger = FakeLedger::empty();
    let fallback = Arc::new(MockProcessor::new(
        ProcessorName::Fallback,
        MockBehavior::AlwaysAccept,
    ));

    let probe = Arc::new(TimeoutProbe {
        last_timeout: Mutex::new(None),
        calls: AtomicUsize::new(0),
    });
    let engine_known = engine(
        FakeHealth::with(healthy(700), healthy(50)),
        ledger.clone(),
        probe.clone(),
        fallback.clone(),
        RoutingPolicy::PreferDefault,
    );
    engine_known.dispatch(&request("c11")).await.unwrap();
    assert_eq!(
        *probe.last_timeout.lock().unwrap(),
        Some(Duration::from_millis(700))
    );

    // Unknown minResponseTime substitutes the configured default.
    let engine_unknown = engine(
        FakeHealth::with(healthy(0), healthy(50)),
        ledger,
        probe.clone(),
        fallback,
        RoutingPolicy::PreferDefault,
    );
    engine_unknown.dispatch(&request("c12")).await.unwrap();
    assert_eq!(
        *probe.last_timeout.lock().unwrap(),
        Some(Duration::from_millis(1500))
    );
    assert_eq!(probe.calls.load(Ordering::SeqCst), 2);
}
