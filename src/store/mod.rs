mod file;
mod memory;
mod redis;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use self::redis::RedisStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

use crate::config::{Config, StoreBackend};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Byte-oriented key-value persistence for learning data.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
    async fn health_check(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}

/// Build the configured store. A Redis backend that cannot be reached falls
/// back to memory so the service still starts.
pub async fn build_store(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match config.store_backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory learning store (data is lost on restart)");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::File => {
            tracing::info!("Using file learning store at {}", config.store_path);
            Arc::new(FileStore::new(&config.store_path))
        }
        StoreBackend::Redis => {
            let redis_url = config.redis_url.as_deref().unwrap_or("redis://127.0.0.1:6379");
            tracing::info!("Connecting to Redis learning store...");
            match RedisStore::new(redis_url).await {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    tracing::warn!(
                        "Failed to connect to Redis: {}. Falling back to in-memory store.",
                        e
                    );
                    Arc::new(MemoryStore::new())
                }
            }
        }
        #[cfg(feature = "sqlite")]
        StoreBackend::Sqlite => {
            tracing::info!("Opening SQLite learning store at {}", config.store_path);
            Arc::new(SqliteStore::open(&config.store_path).await?)
        }
        #[cfg(not(feature = "sqlite"))]
        StoreBackend::Sqlite => {
            return Err(crate::error::AppError::Internal(
                "STORE_BACKEND=sqlite requires the `sqlite` feature".to_string(),
            ));
        }
    };

    Ok(store)
}
