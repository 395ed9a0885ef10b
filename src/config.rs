use crate::service::routing::RoutingPolicy;
use anyhow::Context;
use std::time::Duration;

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub redis_url: String,
    pub instance_id: String,
    pub default_processor_url: String,
    pub fallback_processor_url: String,
    pub default_health_interval: Duration,
    pub fallback_health_interval: Duration,
    pub probe_timeout: Duration,
    pub worker_count: usize,
    pub dispatch_permits: usize,
    pub dequeue_timeout: Duration,
    pub retry_backoff: Duration,
    pub max_retry_attempts: u32,
    pub processor_timeout: Duration,
    pub lease_ttl: Duration,
    pub acquire_interval: Duration,
    pub renew_interval: Duration,
    pub routing_policy: RoutingPolicy,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        let default_processor_url = env_or(
            "DEFAULT_PROCESSOR_URL",
            "http://localhost:8001",
        );
        let fallback_processor_url = env_or(
            "FALLBACK_PROCESSOR_URL",
            "http://localhost:8002",
        );
        reqwest::Url::parse(&default_processor_url)
            .context("invalid DEFAULT_PROCESSOR_URL")?;
        reqwest::Url::parse(&fallback_processor_url)
            .context("invalid FALLBACK_PROCESSOR_URL")?;

        Ok(Self {
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:9999"),
            redis_url: env_or("REDIS_URL", "redis://127.0.0.1:6379/"),
            instance_id: std::env::var("INSTANCE_ID")
                .unwrap_or_else(|_| uuid::Uuid::new_v4().to_string()),
            default_processor_url,
            fallback_processor_url,
            default_health_interval: env_millis("DEFAULT_HEALTH_INTERVAL_MS", 5_000)?,
            fallback_health_interval: env_millis("FALLBACK_HEALTH_INTERVAL_MS", 5_000)?,
            probe_timeout: env_millis("HEALTH_PROBE_TIMEOUT_MS", 2_000)?,
            worker_count: env_parse("WORKER_COUNT", parallelism)?,
            dispatch_permits: env_parse("DISPATCH_PERMITS", (parallelism / 2).max(1))?,
            dequeue_timeout: env_millis("DEQUEUE_TIMEOUT_MS", 2_000)?,
            retry_backoff: env_millis("RETRY_BACKOFF_MS", 250)?,
            max_retry_attempts: env_parse("MAX_RETRY_ATTEMPTS", 15)?,
            processor_timeout: env_millis("PROCESSOR_TIMEOUT_MS", 1_500)?,
            lease_ttl: Duration::from_secs(env_parse("LEASE_TTL_SECS", 10)?),
            acquire_interval: env_millis("LEASE_ACQUIRE_INTERVAL_MS", 3_000)?,
            renew_interval: env_millis("LEASE_RENEW_INTERVAL_MS", 3_000)?,
            routing_policy: env_or("ROUTING_POLICY", "prefer-default")
                .parse()
                .map_err(anyhow::Error::msg)?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().with_context(|| format!("invalid {key}")),
        Err(_) => Ok(default),
    }
}

fn env_millis(key: &str, default: u64) -> anyhow::Result<Duration> {
    Ok(Duration::from_millis(env_parse(key, default)?))
}
