//! Redis-backed store for sharing scraped data with other processes.

use std::sync::{Mutex, MutexGuard};

use redis::Commands;

use crate::app::{EstuaryError, Result};
use crate::store::KvStore;

pub struct RedisStore {
    conn: Mutex<redis::Connection>,
}

impl RedisStore {
    /// Connect to `redis_url` (e.g. `redis://127.0.0.1:6379/0`).
    pub fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| EstuaryError::StoreUnavailable(format!("Redis connection error: {}", e)))?;
        let conn = client
            .get_connection()
            .map_err(|e| EstuaryError::StoreUnavailable(format!("Could not connect to Redis: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, redis::Connection>> {
        self.conn
            .lock()
            .map_err(|e| EstuaryError::StoreUnavailable(format!("connection poisoned: {}", e)))
    }
}

fn unavailable(e: redis::RedisError) -> EstuaryError {
    EstuaryError::StoreUnavailable(e.to_string())
}

impl KvStore for RedisStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.lock()?;
        conn.get(key).map_err(unavailable)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.lock()?;
        conn.set::<_, _, ()>(key, value).map_err(unavailable)
    }

    fn ping(&self) -> Result<()> {
        let mut conn = self.lock()?;
        redis::cmd("PING")
            .query::<String>(&mut *conn)
            .map(|_| ())
            .map_err(unavailable)
    }
}
