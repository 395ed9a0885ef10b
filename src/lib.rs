use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub mod config;
pub mod domain {
    pub mod health;
    pub mod payment;
    pub mod processor;
    pub mod summary;
    pub mod time;
}
pub mod error;
pub mod http {
    pub mod handlers {
        pub mod ops;
        pub mod payments;
    }
}
pub mod processors;
pub mod service {
    pub mod health_monitor;
    pub mod leader_elector;
    pub mod retry;
    pub mod routing;
    pub mod worker_pool;
}
pub mod store {
    pub mod health_store;
    pub mod lease;
    pub mod ledger;
    pub mod queue;
}

#[derive(Clone)]
pub struct AppState {
    pub queue: store::queue::DispatchQueueRedis,
    pub ledger: store::ledger::PaymentLedgerRedis,
    pub is_leader: Arc<AtomicBool>,
}
