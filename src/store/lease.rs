use anyhow::Result;
use std::time::Duration;

const LEADER_KEY: &str = "health-leader";

// Renewal must only extend a lease this owner still holds.
const RENEW_SCRIPT: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('PEXPIRE', KEYS[1], ARGV[2])
else
    return 0
end
"#;

/// Time-bounded ownership record backing leader election. At most one
/// owner holds the lease at a time; expiry hands it over.
#[async_trait::async_trait]
pub trait Lease: Send + Sync {
    /// Set-if-absent with TTL; true for exactly one concurrent caller.
    async fn try_acquire(&self, owner: &str, ttl: Duration) -> Result<bool>;

    /// Extends the lease only while `owner` still holds it; false means
    /// ownership moved and the caller must demote itself.
    async fn renew(&self, owner: &str, ttl: Duration) -> Result<bool>;
}

#[derive(Clone)]
pub struct LeaseStoreRedis {
    pub client: redis::Client,
}

impl LeaseStoreRedis {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Lease for LeaseStoreRedis {
    async fn try_acquire(&self, owner: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let reply: Option<String> = redis::cmd("SET")
            .arg(LEADER_KEY)
            .arg(owner)
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn renew(&self, owner: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let extended: i64 = redis::cmd("EVAL")
            .arg(RENEW_SCRIPT)
            .arg(1)
            .arg(LEADER_KEY)
            .arg(owner)
            .arg(ttl.as_millis() as u64)
            .query_async(&mut conn)
            .await?;
        Ok(extended == 1)
    }
}
