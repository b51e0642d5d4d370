use std::time::Duration;

use async_trait::async_trait;
use fanalyzer_core::{Result, cache::JsonCache};
use tracing::trace;

/// A cache that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCache;

#[async_trait]
impl JsonCache for NullCache {
  async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
    trace!(key, "null cache miss");
    Ok(None)
  }

  async fn set(&self, _key: &str, _value: serde_json::Value, _ttl: Duration) -> Result<()> {
    Ok(())
  }

  async fn remove(&self, _key: &str) -> Result<()> { Ok(()) }

  async fn clear(&self) -> Result<()> { Ok(()) }
}
