use async_trait::async_trait;
use redis::{Script, aio::ConnectionManager};

use crate::app_error::{AppError, AppResult};
use crate::infra::error::InfraError;

/// Trait for rate limiting implementations.
#[async_trait]
pub trait RateLimiterTrait: Send + Sync {
    /// Per-source-address bucket, bumped by the middleware on every request.
    async fn check_ip(&self, ip: &str) -> AppResult<()>;

    /// Per-login-identifier bucket, bumped by credential-bearing endpoints
    /// (login, forgot-password) so one address cannot be hammered from many
    /// sources.
    async fn check_identifier(&self, identifier: &str) -> AppResult<()>;
}

/// Lua script for atomic increment with TTL.
/// Returns the new count after increment.
/// If the key doesn't exist, it's created with TTL.
/// If the key exists but has no TTL (edge case from old bug), TTL is set.
const INCR_WITH_TTL_SCRIPT: &str = r#"
local current = redis.call('INCR', KEYS[1])
if current == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
elseif redis.call('TTL', KEYS[1]) == -1 then
    -- Key exists but has no TTL (shouldn't happen, but fix it)
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return current
"#;

/// Redis-backed fixed-window rate limiter for production use.
#[derive(Clone)]
pub struct RedisRateLimiter {
    manager: ConnectionManager,
    window_secs: u64,
    max_per_ip: u64,
    max_per_identifier: u64,
    script: Script,
}

impl RedisRateLimiter {
    pub async fn new(
        redis_url: &str,
        window_secs: u64,
        max_per_ip: u64,
        max_per_identifier: u64,
    ) -> Result<Self, InfraError> {
        let client = redis::Client::open(redis_url).map_err(InfraError::RedisConnection)?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(InfraError::RedisConnection)?;
        let script = Script::new(INCR_WITH_TTL_SCRIPT);
        Ok(Self {
            manager,
            window_secs,
            max_per_ip,
            max_per_identifier,
            script,
        })
    }

    async fn bump(&self, key: &str, limit: u64) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let current: u64 = self
            .script
            .key(key)
            .arg(self.window_secs)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        if current > limit {
            return Err(AppError::RateLimited);
        }

        Ok(())
    }
}

#[async_trait]
impl RateLimiterTrait for RedisRateLimiter {
    async fn check_ip(&self, ip: &str) -> AppResult<()> {
        self.bump(&format!("throttle:ip:{ip}"), self.max_per_ip).await
    }

    async fn check_identifier(&self, identifier: &str) -> AppResult<()> {
        let normalized = identifier.trim().to_lowercase();
        self.bump(
            &format!("throttle:id:{normalized}"),
            self.max_per_identifier,
        )
        .await
    }
}
