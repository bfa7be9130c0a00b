//! Redis-backed [`KvStore`] implementation.

use std::time::Duration;

use async_trait::async_trait;
use lumly_core::{KvStore, StoreError};
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use secrecy::{ExposeSecret, SecretString};

/// Production key-value store over a multiplexed async Redis connection.
///
/// Every call is bounded by the configured timeout; a timed-out call
/// surfaces as [`StoreError::Unavailable`] and is never retried here -
/// retry belongs to the caller's next invocation.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
    timeout: Duration,
}

impl RedisStore {
    /// Connect to Redis and return a store handle.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the client cannot be created
    /// or the connection cannot be established within the timeout.
    pub async fn connect(url: &SecretString, timeout: Duration) -> Result<Self, StoreError> {
        let client = redis::Client::open(url.expose_secret())
            .map_err(|e| StoreError::Unavailable(format!("failed to create Redis client: {e}")))?;

        let conn = tokio::time::timeout(timeout, client.get_multiplexed_async_connection())
            .await
            .map_err(|_| StoreError::Unavailable("Redis connection timed out".to_string()))?
            .map_err(|e| StoreError::Unavailable(format!("Redis connection failed: {e}")))?;

        Ok(Self { conn, timeout })
    }

    /// Run one Redis command under the configured timeout.
    async fn bounded<T, F>(&self, op: &str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = redis::RedisResult<T>> + Send,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Err(_) => Err(StoreError::Unavailable(format!("Redis {op} timed out"))),
            Ok(Err(e)) => Err(StoreError::Unavailable(format!("Redis {op} failed: {e}"))),
            Ok(Ok(value)) => Ok(value),
        }
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        self.bounded("GET", async move { conn.get(key).await }).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        self.bounded("SET", async move { conn.set(key, value).await })
            .await
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        self.bounded("INCR", async move { conn.incr(key, 1).await })
            .await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        self.bounded("DEL", async move { conn.del(key).await }).await
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        // KEYS matches the original store usage; the marker namespace is
        // bounded by the number of customers currently in cooldown.
        let pattern = format!("{prefix}*");
        let mut conn = self.conn.clone();
        self.bounded("KEYS", async move { conn.keys(pattern).await })
            .await
    }
}
