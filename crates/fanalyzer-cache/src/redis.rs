use std::{sync::Arc, time::Duration};

use ::redis::{AsyncCommands, aio::MultiplexedConnection};
use async_trait::async_trait;
use fanalyzer_core::{Result, cache::JsonCache};
use tokio::sync::RwLock;
use tracing::{debug, trace, warn};

use crate::Error;

/// Keys are deleted in batches of this size by [`RedisCache::clear`].
const SCAN_COUNT: usize = 200;

/// Cache shared through a Redis server. Every key is stored as
/// `<prefix><key>` holding the JSON text of the document.
pub struct RedisCache {
  client:     ::redis::Client,
  /// Lazily (re)established multiplexed connection.
  connection: Arc<RwLock<Option<MultiplexedConnection>>>,
  key_prefix: String,
}

impl RedisCache {
  /// Open a client for `url` and check the server answers `PING`.
  pub async fn connect(url: &str, key_prefix: impl Into<String>) -> crate::Result<Self> {
    let client = ::redis::Client::open(url)?;
    let cache = Self {
      client,
      connection: Arc::new(RwLock::new(None)),
      key_prefix: key_prefix.into(),
    };

    let mut conn = cache.connection().await?;
    let pong: String = ::redis::cmd("PING").query_async(&mut conn).await?;
    debug!(prefix = %cache.key_prefix, %pong, "redis cache connected");

    Ok(cache)
  }

  async fn connection(&self) -> crate::Result<MultiplexedConnection> {
    {
      let guard = self.connection.read().await;
      if let Some(conn) = guard.as_ref() {
        return Ok(conn.clone());
      }
    }

    let mut guard = self.connection.write().await;
    if let Some(conn) = guard.as_ref() {
      return Ok(conn.clone());
    }

    let conn = self.client.get_multiplexed_async_connection().await?;
    *guard = Some(conn.clone());
    trace!("redis connection established");
    Ok(conn)
  }

  /// Drop the cached connection so the next call reconnects.
  async fn reset_connection(&self) {
    *self.connection.write().await = None;
    debug!("redis connection reset");
  }

  /// Reset the connection when `result` carries a Redis failure.
  async fn with_reset<T>(&self, result: crate::Result<T>) -> crate::Result<T> {
    if let Err(Error::Redis(e)) = &result {
      warn!(error = %e, "redis command failed");
      self.reset_connection().await;
    }
    result
  }

  fn make_key(&self, key: &str) -> String { format!("{}{}", self.key_prefix, key) }

  async fn get_raw(&self, key: &str) -> crate::Result<Option<serde_json::Value>> {
    let mut conn = self.connection().await?;
    let data: Option<String> = conn.get(self.make_key(key)).await?;
    Ok(data.map(|d| serde_json::from_str(&d)).transpose()?)
  }

  async fn set_raw(
    &self,
    key: &str,
    value: &serde_json::Value,
    ttl: Duration,
  ) -> crate::Result<()> {
    let mut conn = self.connection().await?;
    let data = serde_json::to_string(value)?;
    // SETEX rejects a zero expiry.
    let secs = ttl.as_secs().max(1);
    let () = conn.set_ex(self.make_key(key), data, secs).await?;
    Ok(())
  }

  async fn remove_raw(&self, key: &str) -> crate::Result<()> {
    let mut conn = self.connection().await?;
    let removed: u64 = conn.del(self.make_key(key)).await?;
    trace!(key, removed, "redis key removed");
    Ok(())
  }

  /// Delete every key under the prefix with `SCAN`, never `KEYS` or
  /// `FLUSHDB`, so other tenants of the database are untouched.
  async fn clear_raw(&self) -> crate::Result<()> {
    let mut conn = self.connection().await?;
    let pattern = format!("{}*", self.key_prefix);
    let mut cursor: u64 = 0;

    loop {
      let (next, keys): (u64, Vec<String>) = ::redis::cmd("SCAN")
        .arg(cursor)
        .arg("MATCH")
        .arg(&pattern)
        .arg("COUNT")
        .arg(SCAN_COUNT)
        .query_async(&mut conn)
        .await?;

      if !keys.is_empty() {
        let () = conn.del(keys).await?;
      }
      if next == 0 {
        break;
      }
      cursor = next;
    }

    Ok(())
  }
}

#[async_trait]
impl JsonCache for RedisCache {
  async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
    let result = self.get_raw(key).await;
    Ok(self.with_reset(result).await?)
  }

  async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) -> Result<()> {
    let result = self.set_raw(key, &value, ttl).await;
    Ok(self.with_reset(result).await?)
  }

  async fn remove(&self, key: &str) -> Result<()> {
    let result = self.remove_raw(key).await;
    Ok(self.with_reset(result).await?)
  }

  async fn clear(&self) -> Result<()> {
    let result = self.clear_raw().await;
    Ok(self.with_reset(result).await?)
  }
}
