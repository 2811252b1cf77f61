use crate::error::{AppError, Result};
use crate::store::KeyValueStore;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

/// Redis-backed store. `ConnectionManager` is `Arc`-based internally, so
/// cloning it per call is cheap.
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| AppError::Storage(format!("Failed to create Redis client: {}", e)))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to connect to Redis: {}", e)))?;

        tracing::info!("Redis store connection established");

        Ok(RedisStore { connection })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection.clone();
        let result: redis::RedisResult<Option<Vec<u8>>> = conn.get(key).await;
        result.map_err(|e| AppError::Storage(format!("Redis GET {}: {}", key, e)))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut conn = self.connection.clone();
        let result: redis::RedisResult<()> = conn.set(key, value).await;
        match result {
            Ok(()) => {
                tracing::debug!("Redis store wrote {} bytes: {}", value.len(), key);
                Ok(())
            }
            Err(e) => Err(AppError::Storage(format!("Redis SET {}: {}", key, e))),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection.clone();
        let result: redis::RedisResult<()> = conn.del(key).await;
        result.map_err(|e| AppError::Storage(format!("Redis DEL {}: {}", key, e)))
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.connection.clone();
        let result: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
        result.is_ok()
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
