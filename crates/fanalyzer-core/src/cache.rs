//! Cache-aside over a key → JSON document store with expiry.
//!
//! The cache is an accelerator only. Read failures fall through to the
//! producer and write failures are logged; neither fails the request.

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::Result;

/// Post ratings and user ratings live for ten minutes.
pub const RATING_TTL: Duration = Duration::from_secs(10 * 60);
/// Sentiment summaries live for twelve hours.
pub const SENTIMENT_TTL: Duration = Duration::from_secs(12 * 60 * 60);
/// Cached listings (e.g. all articles) live for one hour.
pub const LISTING_TTL: Duration = Duration::from_secs(60 * 60);

pub fn post_rating_key(id: &str) -> String { format!("postRating:{id}") }

pub fn user_rating_key(user_id: &str) -> String { format!("userRating:{user_id}") }

pub fn comment_analysis_key(id: &str) -> String { format!("commentAnalysis:{id}") }

pub const ALL_ARTICLES_KEY: &str = "allArticles";

/// A key → JSON document store with per-entry expiry.
#[async_trait]
pub trait JsonCache: Send + Sync {
  async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;

  async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) -> Result<()>;

  async fn remove(&self, key: &str) -> Result<()>;

  /// Drop every entry owned by this cache.
  async fn clear(&self) -> Result<()>;
}

/// Remove `key`, logging instead of failing.
pub async fn invalidate(cache: &dyn JsonCache, key: &str) {
  if let Err(e) = cache.remove(key).await {
    warn!(key, error = %e, "failed to invalidate cache entry");
  }
}

// ─── Cache-aside builder ─────────────────────────────────────────────────────

/// A single cache-aside read: look up `key`, otherwise run the producer and
/// store its result for `ttl`.
///
/// ```rust,ignore
/// let rating = CacheAside::new(cache, post_rating_key(id), RATING_TTL)
///   .admit(PostRatingOutcome::is_rated)
///   .get_or_compute(|| compute(store, id))
///   .await?;
/// ```
pub struct CacheAside<'a, T> {
  cache: &'a dyn JsonCache,
  key:   String,
  ttl:   Duration,
  admit: fn(&T) -> bool,
}

impl<'a, T> CacheAside<'a, T>
where
  T: Serialize + DeserializeOwned,
{
  pub fn new(cache: &'a dyn JsonCache, key: impl Into<String>, ttl: Duration) -> Self {
    Self { cache, key: key.into(), ttl, admit: |_| true }
  }

  /// Only store produced values for which `admit` returns `true`.
  pub fn admit(mut self, admit: fn(&T) -> bool) -> Self {
    self.admit = admit;
    self
  }

  pub async fn get_or_compute<F, Fut>(self, produce: F) -> Result<T>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    match self.cache.get(&self.key).await {
      Ok(Some(doc)) => match serde_json::from_value::<T>(doc) {
        Ok(value) => {
          debug!(key = %self.key, "cache hit");
          return Ok(value);
        }
        Err(e) => warn!(key = %self.key, error = %e, "discarding undecodable cache entry"),
      },
      Ok(None) => debug!(key = %self.key, "cache miss"),
      Err(e) => warn!(key = %self.key, error = %e, "cache read failed"),
    }

    let value = produce().await?;

    if (self.admit)(&value) {
      match serde_json::to_value(&value) {
        Ok(doc) => {
          if let Err(e) = self.cache.set(&self.key, doc, self.ttl).await {
            warn!(key = %self.key, error = %e, "cache write failed");
          }
        }
        Err(e) => warn!(key = %self.key, error = %e, "value not cacheable"),
      }
    }

    Ok(value)
  }
}

// ─── Test support ────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod testing {
  use std::{
    collections::HashMap,
    sync::{
      Mutex,
      atomic::{AtomicBool, Ordering},
    },
  };

  use super::*;
  use crate::Error;

  /// A map-backed cache that ignores expiry, with a switch to make every
  /// call fail.
  #[derive(Default)]
  pub struct MapCache {
    pub entries: Mutex<HashMap<String, serde_json::Value>>,
    pub broken:  AtomicBool,
  }

  fn broken() -> Error { Error::Cache("cache offline".into()) }

  #[async_trait]
  impl JsonCache for MapCache {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
      if self.broken.load(Ordering::SeqCst) {
        return Err(broken());
      }
      Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: serde_json::Value, _ttl: Duration) -> Result<()> {
      if self.broken.load(Ordering::SeqCst) {
        return Err(broken());
      }
      self.entries.lock().unwrap().insert(key.to_owned(), value);
      Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
      self.entries.lock().unwrap().remove(key);
      Ok(())
    }

    async fn clear(&self) -> Result<()> {
      self.entries.lock().unwrap().clear();
      Ok(())
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::{testing::MapCache, *};
  use crate::Error;

  #[tokio::test]
  async fn miss_then_hit_runs_producer_once() {
    let cache = MapCache::default();
    let calls = AtomicUsize::new(0);
    let counter = &calls;

    for _ in 0..2 {
      let v: u32 = CacheAside::new(&cache, "k", RATING_TTL)
        .get_or_compute(move || async move {
          counter.fetch_add(1, Ordering::SeqCst);
          Ok(42)
        })
        .await
        .unwrap();
      assert_eq!(v, 42);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn rejected_values_are_not_stored() {
    let cache = MapCache::default();
    let v: u32 = CacheAside::new(&cache, "k", RATING_TTL)
      .admit(|v| *v > 100)
      .get_or_compute(|| async { Ok(7) })
      .await
      .unwrap();
    assert_eq!(v, 7);
    assert!(cache.entries.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn broken_cache_does_not_fail_the_request() {
    let cache = MapCache::default();
    cache.broken.store(true, Ordering::SeqCst);
    let v: String = CacheAside::new(&cache, "k", RATING_TTL)
      .get_or_compute(|| async { Ok("fresh".to_owned()) })
      .await
      .unwrap();
    assert_eq!(v, "fresh");
  }

  #[tokio::test]
  async fn producer_errors_propagate_and_are_not_cached() {
    let cache = MapCache::default();
    let res: Result<u32> = CacheAside::new(&cache, "k", RATING_TTL)
      .get_or_compute(|| async { Err(Error::NotFound("gone".into())) })
      .await;
    assert!(matches!(res, Err(Error::NotFound(_))));
    assert!(cache.entries.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn undecodable_entry_is_recomputed() {
    let cache = MapCache::default();
    cache
      .entries
      .lock()
      .unwrap()
      .insert("k".into(), serde_json::json!({"not": "a number"}));
    let v: u32 = CacheAside::new(&cache, "k", RATING_TTL)
      .get_or_compute(|| async { Ok(3) })
      .await
      .unwrap();
    assert_eq!(v, 3);
    assert_eq!(cache.entries.lock().unwrap()["k"], 3);
  }
}
