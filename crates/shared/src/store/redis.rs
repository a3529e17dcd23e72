//! Redis-backed implementation of the ephemeral key-value store
//!
//! Uses a multiplexed `ConnectionManager`, so cloning the store is cheap and
//! each operation runs on the shared connection. `take` maps to `GETDEL` for
//! one-shot reads with no read-then-delete race.

use crate::error::{Error, Result};
use crate::store::KeyValueStore;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::time::Duration;

/// Create a Redis connection manager from a connection URL
pub async fn create_client(url: &str) -> Result<ConnectionManager> {
    let client = Client::open(url).map_err(|e| Error::config(format!("Invalid Redis URL: {}", e)))?;

    ConnectionManager::new(client)
        .await
        .map_err(|e| Error::store(format!("Failed to connect to Redis: {}", e)))
}

/// Redis-backed store for transient OAuth state
#[derive(Clone)]
pub struct RedisStore {
    redis: ConnectionManager,
}

impl RedisStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs()).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.redis.clone();
        let value: Option<String> = conn.get(key).await?;
        tracing::debug!(key, hit = value.is_some(), "Store read");
        Ok(value)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.redis.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.redis.clone();
        // GETDEL is atomic on the server side; no window between read and delete
        let value: Option<String> = redis::cmd("GETDEL")
            .arg(key)
            .query_async(&mut conn)
            .await?;
        tracing::debug!(key, hit = value.is_some(), "Store take");
        Ok(value)
    }
}
