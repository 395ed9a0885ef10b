use axum::routing::{get, post};
use axum::Router;
use payments_dispatch::config::AppConfig;
use payments_dispatch::domain::processor::ProcessorName;
use payments_dispatch::processors::http::HttpProcessorClient;
use payments_dispatch::service::health_monitor::HealthMonitor;
use payments_dispatch::service::leader_elector::LeaderElector;
use payments_dispatch::service::routing::RoutingEngine;
use payments_dispatch::service::worker_pool::DispatchWorkerPool;
use payments_dispatch::store::health_store::HealthStoreRedis;
use payments_dispatch::store::lease::LeaseStoreRedis;
use payments_dispatch::store::ledger::PaymentLedgerRedis;
use payments_dispatch::store::queue::DispatchQueueRedis;
use payments_dispatch::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env()?;

    let redis_client = redis::Client::open(cfg.redis_url.clone())?;
    let http_client = reqwest::Client::new();

    let health_store = HealthStoreRedis::new(redis_client.clone());
    let ledger = PaymentLedgerRedis::new(redis_client.clone());
    let queue = DispatchQueueRedis::new(redis_client.clone(), cfg.instance_id.clone());
    let lease = LeaseStoreRedis::new(redis_client);

    let default_processor = Arc::new(HttpProcessorClient::new(
        ProcessorName::Default,
        cfg.default_processor_url.clone(),
        http_client.clone(),
    ));
    let fallback_processor = Arc::new(HttpProcessorClient::new(
        ProcessorName::Fallback,
        cfg.fallback_processor_url.clone(),
        http_client,
    ));

    let engine = Arc::new(RoutingEngine {
        health: Arc::new(health_store.clone()),
        ledger: Arc::new(ledger.clone()),
        default_processor: default_processor.clone(),
        fallback_processor: fallback_processor.clone(),
        policy: cfg.routing_policy,
        processor_timeout: cfg.processor_timeout,
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let elector = LeaderElector::new(
        Arc::new(lease),
        cfg.instance_id.clone(),
        cfg.lease_ttl,
        cfg.acquire_interval,
        cfg.renew_interval,
    );
    let is_leader = elector.leadership();
    let mut handles = vec![tokio::spawn(elector.run(shutdown_rx.clone()))];

    let monitor = HealthMonitor {
        store: health_store,
        is_leader: is_leader.clone(),
        probe_timeout: cfg.probe_timeout,
    };
    handles.push(tokio::spawn(monitor.clone().run(
        default_processor,
        cfg.default_health_interval,
        shutdown_rx.clone(),
    )));
    handles.push(tokio::spawn(monitor.run(
        fallback_processor,
        cfg.fallback_health_interval,
        shutdown_rx.clone(),
    )));

    let pool = DispatchWorkerPool {
        queue: queue.clone(),
        engine,
        permits: Arc::new(Semaphore::new(cfg.dispatch_permits)),
        dequeue_timeout: cfg.dequeue_timeout,
        retry_backoff: cfg.retry_backoff,
        max_retry_attempts: cfg.max_retry_attempts,
    };
    handles.extend(pool.spawn(cfg.worker_count, shutdown_rx));

    let state = AppState {
        queue,
        ledger,
        is_leader,
    };

    let app = Router::new()
        .route(
            "/payments",
            post(payments_dispatch::http::handlers::payments::create_payment),
        )
        .route(
            "/payments-summary",
            get(payments_dispatch::http::handlers::payments::payments_summary),
        )
        .route(
            "/purge-payments",
            post(payments_dispatch::http::handlers::payments::purge_payments),
        )
        .route("/health", get(payments_dispatch::http::handlers::payments::health))
        .route("/ops/queue", get(payments_dispatch::http::handlers::ops::queue_status))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!(
        "instance {} listening on {} with {} workers",
        cfg.instance_id,
        cfg.bind_addr,
        cfg.worker_count
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx.clone()))
        .await?;

    // Server is down; make sure background tasks drain too.
    let _ = shutdown_tx.send(true);
    for handle in handles {
        if tokio::time::timeout(Duration::from_secs(5), handle).await.is_err() {
            tracing::warn!("background task did not stop in time");
        }
    }
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("could not install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("shutdown signal received");
    let _ = shutdown_tx.send(true);
}
