use std::{
  sync::Arc,
  time::{Duration, Instant},
};

use async_trait::async_trait;
use fanalyzer_core::{Result, cache::JsonCache};
use moka::{future::Cache, policy::Expiry};
use tracing::debug;

/// A cached document and the lifetime it was stored with.
#[derive(Debug)]
struct Entry {
  value: serde_json::Value,
  ttl:   Duration,
}

/// Expires each entry after the TTL it was inserted with. Overwrites restart
/// the clock.
struct EntryExpiry;

impl Expiry<String, Arc<Entry>> for EntryExpiry {
  fn expire_after_create(
    &self,
    _key: &String,
    value: &Arc<Entry>,
    _created_at: Instant,
  ) -> Option<Duration> {
    Some(value.ttl)
  }

  fn expire_after_update(
    &self,
    _key: &String,
    value: &Arc<Entry>,
    _updated_at: Instant,
    _duration_until_expiry: Option<Duration>,
  ) -> Option<Duration> {
    Some(value.ttl)
  }
}

/// In-process cache on top of [`moka`].
#[derive(Clone)]
pub struct MokaCache {
  inner: Cache<String, Arc<Entry>>,
}

impl MokaCache {
  pub fn new(max_capacity: u64) -> Self {
    let inner = Cache::builder()
      .max_capacity(max_capacity)
      .expire_after(EntryExpiry)
      .build();

    debug!(max_capacity, "moka cache initialised");
    Self { inner }
  }
}

#[async_trait]
impl JsonCache for MokaCache {
  async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
    Ok(self.inner.get(key).await.map(|entry| entry.value.clone()))
  }

  async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) -> Result<()> {
    self
      .inner
      .insert(key.to_owned(), Arc::new(Entry { value, ttl }))
      .await;
    Ok(())
  }

  async fn remove(&self, key: &str) -> Result<()> {
    self.inner.invalidate(key).await;
    Ok(())
  }

  async fn clear(&self) -> Result<()> {
    self.inner.invalidate_all();
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  const HOUR: Duration = Duration::from_secs(3600);

  #[tokio::test]
  async fn set_then_get() {
    let cache = MokaCache::new(100);
    assert_eq!(cache.get("k").await.unwrap(), None);

    cache.set("k", json!({ "rating": 42.5 }), HOUR).await.unwrap();
    assert_eq!(cache.get("k").await.unwrap(), Some(json!({ "rating": 42.5 })));
  }

  #[tokio::test]
  async fn remove_and_clear() {
    let cache = MokaCache::new(100);
    cache.set("a", json!(1), HOUR).await.unwrap();
    cache.set("b", json!(2), HOUR).await.unwrap();

    cache.remove("a").await.unwrap();
    assert_eq!(cache.get("a").await.unwrap(), None);
    assert_eq!(cache.get("b").await.unwrap(), Some(json!(2)));

    cache.clear().await.unwrap();
    assert_eq!(cache.get("b").await.unwrap(), None);
  }

  #[tokio::test]
  async fn entries_expire_after_their_own_ttl() {
    let cache = MokaCache::new(100);
    cache.set("short", json!("x"), Duration::from_millis(50)).await.unwrap();
    cache.set("long", json!("y"), HOUR).await.unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(cache.get("short").await.unwrap(), None);
    assert_eq!(cache.get("long").await.unwrap(), Some(json!("y")));
  }

  #[tokio::test]
  async fn overwrite_replaces_value_and_ttl() {
    let cache = MokaCache::new(100);
    cache.set("k", json!(1), Duration::from_millis(50)).await.unwrap();
    cache.set("k", json!(2), HOUR).await.unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(cache.get("k").await.unwrap(), Some(json!(2)));
  }
}
