pub mod sqlite;

#[cfg(feature = "redis")]
pub mod redis;

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::app::{EstuaryError, Result};

pub use sqlite::SqliteStore;

/// Scraped product listings, stored as a JSON array.
pub const PRODUCTS_KEY: &str = "croma_products";
/// `{head, header}` fragments of the scraped page.
pub const PAGE_FRAGMENTS_KEY: &str = "croma_page_elements";
/// Aggregated news articles, newest first.
pub const NEWS_KEY: &str = "pharma_news";
/// Local time of the last successful news aggregation.
pub const NEWS_UPDATED_KEY: &str = "pharma_last_updated";

/// Opaque string key-value store shared by both pipelines.
///
/// Writes overwrite the previous value wholesale.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Cheap connectivity check, fails with [`EstuaryError::StoreUnavailable`].
    fn ping(&self) -> Result<()>;
}

/// Result of reading a key that may not have been written yet.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    /// Nothing stored under the key; the producing pipeline has not run.
    Missing,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Missing => None,
        }
    }
}

pub fn put_json<S, T>(store: &S, key: &str, value: &T) -> Result<()>
where
    S: KvStore + ?Sized,
    T: Serialize + ?Sized,
{
    let encoded = serde_json::to_string(value)?;
    store.set(key, &encoded)?;
    tracing::info!("Stored {} bytes under '{}'", encoded.len(), key);
    Ok(())
}

pub fn get_json<S, T>(store: &S, key: &str) -> Result<Lookup<T>>
where
    S: KvStore + ?Sized,
    T: DeserializeOwned,
{
    match store.get(key)? {
        Some(raw) => Ok(Lookup::Found(serde_json::from_str(&raw)?)),
        None => Ok(Lookup::Missing),
    }
}

/// Which backend holds the shared data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Redis,
}

/// Store connection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// SQLite database file (default: `<data dir>/estuary/estuary.db`)
    pub path: Option<PathBuf>,

    /// Redis connection URL, used when `backend = "redis"`
    pub redis_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            path: None,
            redis_url: "redis://127.0.0.1:6379/0".to_string(),
        }
    }
}

impl StoreConfig {
    fn sqlite_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.path {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| EstuaryError::Config("Could not find data directory".into()))?;
        let estuary_dir = data_dir.join("estuary");
        std::fs::create_dir_all(&estuary_dir)?;
        Ok(estuary_dir.join("estuary.db"))
    }
}

/// Open the configured backend and verify it responds.
pub fn open_store(config: &StoreConfig) -> Result<Box<dyn KvStore + Send + Sync>> {
    let store: Box<dyn KvStore + Send + Sync> = match config.backend {
        StoreBackend::Sqlite => Box::new(SqliteStore::new(config.sqlite_path()?)?),
        #[cfg(feature = "redis")]
        StoreBackend::Redis => Box::new(redis::RedisStore::connect(&config.redis_url)?),
        #[cfg(not(feature = "redis"))]
        StoreBackend::Redis => {
            return Err(EstuaryError::Config(
                "Redis support not compiled. Rebuild with: cargo build --features redis".into(),
            ))
        }
    };
    store.ping()?;
    Ok(store)
}
