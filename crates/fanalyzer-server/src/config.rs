//! Runtime configuration, deserialised from `config.toml` and `FANALYZER__*`
//! environment variables. Every field has a default.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  pub cache:      CacheConfig,
  pub completion: CompletionConfig,
  pub geoip:      GeoIpConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_string(),
      port:       3000,
      store_path: PathBuf::from("~/.local/share/fanalyzer/stats.db"),
      cache:      CacheConfig::default(),
      completion: CompletionConfig::default(),
      geoip:      GeoIpConfig::default(),
    }
  }
}

// ─── Cache ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
  #[default]
  Memory,
  Redis,
  /// Every lookup misses.
  None,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  pub backend:      CacheBackend,
  /// Entry bound for the in-process cache.
  pub max_capacity: u64,
  pub redis_url:    String,
  pub key_prefix:   String,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      backend:      CacheBackend::Memory,
      max_capacity: 10_000,
      redis_url:    "redis://127.0.0.1:6379".to_string(),
      key_prefix:   "fanalyzer:".to_string(),
    }
  }
}

// ─── Completion ───────────────────────────────────────────────────────────────

/// An OpenAI-compatible chat completion endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
  pub base_url:     String,
  pub api_key:      Option<String>,
  pub model:        String,
  pub timeout_secs: u64,
}

impl Default for CompletionConfig {
  fn default() -> Self {
    Self {
      base_url:     "https://api.openai.com/v1".to_string(),
      api_key:      None,
      model:        "gpt-4o-mini".to_string(),
      timeout_secs: 30,
    }
  }
}

// ─── GeoIP ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeoIpConfig {
  /// MaxMind `.mmdb` file. `/trace` reports `-` without one.
  pub database_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn load(toml: &str) -> ServerConfig {
    ::config::Config::builder()
      .add_source(::config::File::from_str(toml, ::config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_file_uses_defaults() {
    let cfg = load("");
    assert_eq!(cfg.port, 3000);
    assert_eq!(cfg.cache.backend, CacheBackend::Memory);
    assert!(cfg.completion.api_key.is_none());
    assert!(cfg.geoip.database_path.is_none());
  }

  #[test]
  fn nested_sections_override_only_their_fields() {
    let cfg = load(
      r#"
        port = 8080

        [cache]
        backend = "redis"
        redis_url = "redis://cache:6379"

        [completion]
        model = "local-model"
      "#,
    );
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.cache.backend, CacheBackend::Redis);
    assert_eq!(cfg.cache.redis_url, "redis://cache:6379");
    assert_eq!(cfg.cache.key_prefix, "fanalyzer:");
    assert_eq!(cfg.completion.model, "local-model");
    assert_eq!(cfg.completion.timeout_secs, 30);
  }

  #[test]
  fn cache_can_be_disabled() {
    let cfg = load("[cache]\nbackend = \"none\"\n");
    assert_eq!(cfg.cache.backend, CacheBackend::None);
  }
}
