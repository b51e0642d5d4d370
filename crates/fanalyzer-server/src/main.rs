//! fanalyzer stats server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `FANALYZER_*` environment variables, opens the SQLite store, connects the
//! configured cache and serves the JSON API under `/v1`.
//!
//! ```
//! FANALYZER_PORT=8080 FANALYZER_CACHE__BACKEND=redis fanalyzer-server
//! ```

mod completion;
mod config;
mod geoip;

use std::{
  net::SocketAddr,
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::Router;
use clap::Parser;
use fanalyzer_api::{AppState, api_router};
use fanalyzer_cache::{MokaCache, NullCache, RedisCache};
use fanalyzer_core::{cache::JsonCache, geo::GeoLocator};
use fanalyzer_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

use crate::{
  completion::ChatCompletionClient,
  config::{CacheBackend, CacheConfig, ServerConfig},
  geoip::MaxMindLocator,
};

#[derive(Parser)]
#[command(author, version, about = "Fanalyzer engagement stats server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = ::config::Config::builder()
    .add_source(::config::File::from(cli.config).required(false))
    .add_source(
      ::config::Environment::with_prefix("FANALYZER")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let cache = open_cache(&server_cfg.cache).await?;
  let completion = ChatCompletionClient::new(&server_cfg.completion)
    .context("failed to build completion client")?;
  if server_cfg.completion.api_key.is_none() {
    warn!("no completion.api_key configured; comment analysis requests may be rejected");
  }

  let geo = match &server_cfg.geoip.database_path {
    Some(path) => {
      let path = expand_tilde(path);
      let locator = MaxMindLocator::open(&path)
        .with_context(|| format!("failed to open GeoIP database at {path:?}"))?;
      info!(provider = locator.name(), "geoip enabled");
      Some(Arc::new(locator) as Arc<dyn GeoLocator>)
    }
    None => None,
  };

  let state = AppState {
    store: Arc::new(store),
    cache,
    completion: Arc::new(completion),
    geo,
  };

  let app = Router::new()
    .nest("/v1", api_router(state))
    .layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
    .await
    .context("server error")?;

  Ok(())
}

async fn open_cache(cfg: &CacheConfig) -> anyhow::Result<Arc<dyn JsonCache>> {
  let cache: Arc<dyn JsonCache> = match cfg.backend {
    CacheBackend::Memory => {
      info!(max_capacity = cfg.max_capacity, "using in-process cache");
      Arc::new(MokaCache::new(cfg.max_capacity))
    }
    CacheBackend::Redis => {
      let redis = RedisCache::connect(&cfg.redis_url, cfg.key_prefix.clone())
        .await
        .with_context(|| format!("failed to connect to redis at {}", cfg.redis_url))?;
      info!(url = %cfg.redis_url, "using redis cache");
      Arc::new(redis)
    }
    CacheBackend::None => {
      warn!("caching disabled");
      Arc::new(NullCache)
    }
  };
  Ok(cache)
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
