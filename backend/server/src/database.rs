//! # KV store
//!
//! The whole catalog lives as one JSON string under [`SITES_KEY`]. Writes
//! replace it wholesale; there is no partial update.
//!
//! Without `REDIS_URL` the store is [`Kv::Disabled`]: reads come back empty so
//! the built-in catalog is served, and writes are refused. `REDIS_URL=memory://`
//! keeps the catalog in process memory, lost on restart.

use std::{collections::HashMap, time::Duration};

use redis::{
    AsyncCommands, Client, RedisError,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use tokio::sync::RwLock;
use tracing::info;

use crate::error::AppError;

pub use catalog::SITES_KEY;

pub const MEMORY_URL: &str = "memory://";

pub enum Kv {
    Redis(ConnectionManager),
    Memory(RwLock<HashMap<String, String>>),
    Disabled,
}

pub async fn init_redis(redis_url: &str) -> Result<ConnectionManager, RedisError> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url)?;

    client.get_connection_manager_with_config(config).await
}

impl Kv {
    pub async fn connect(redis_url: Option<&str>) -> Result<Self, RedisError> {
        match redis_url {
            Some(MEMORY_URL) => {
                info!("Using in-memory KV, edits are lost on restart");
                Ok(Kv::memory())
            }
            Some(url) => {
                info!("Connecting to Redis...");
                Ok(Kv::Redis(init_redis(url).await?))
            }
            None => {
                info!("No Redis configured, KV writes disabled");
                Ok(Kv::Disabled)
            }
        }
    }

    pub fn memory() -> Self {
        Kv::Memory(RwLock::new(HashMap::new()))
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Kv::Disabled)
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        match self {
            Kv::Redis(connection) => {
                let mut connection = connection.clone();
                Ok(connection.get(key).await?)
            }
            Kv::Memory(map) => Ok(map.read().await.get(key).cloned()),
            Kv::Disabled => Ok(None),
        }
    }

    pub async fn put(&self, key: &str, value: String) -> Result<(), AppError> {
        match self {
            Kv::Redis(connection) => {
                let mut connection = connection.clone();
                let () = connection.set(key, value).await?;
                Ok(())
            }
            Kv::Memory(map) => {
                map.write().await.insert(key.to_string(), value);
                Ok(())
            }
            Kv::Disabled => Err(AppError::StorageNotConfigured),
        }
    }
}
