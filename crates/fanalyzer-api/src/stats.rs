//! Handlers for `/stats` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/stats` | Body: `{"user_id","id","clicks",..}`; increments the `(user, post)` row |
//! | `GET`  | `/stats` | Every stat row |
//! | `GET`  | `/stats/article` | `{"id"}`; rows recorded directly against one post |
//! | `GET`  | `/stats/users-locations` | Users per location |
//! | `GET`  | `/stats/metrics` | `{"id"}`; comments, reactions and shares per location |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use fanalyzer_core::{
  engagement::{EngagementCounters, EngagementStat, NewEngagement},
  geo::{LocationMetrics, location_metrics},
  resolve::resolve_post,
  store::StatsStore,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::{
  AppState,
  error::{ApiError, required_str},
  extract::Input,
};

/// Body of every endpoint keyed by a bare post id.
#[derive(Debug, Deserialize)]
pub struct IdBody {
  pub id: Option<String>,
}

// ─── Record ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RecordBody {
  pub user_id:  Option<String>,
  pub id:       Option<String>,
  #[serde(flatten)]
  pub counters: EngagementCounters,
}

/// `POST /stats`
pub async fn record<S: StatsStore>(
  State(state): State<AppState<S>>,
  Input(body): Input<RecordBody>,
) -> Result<impl IntoResponse, ApiError> {
  let user_id = required_str(body.user_id, "user_id is required")?;
  let id = required_str(body.id, "ID is required")?;
  let store = state.store.as_ref();

  if store.get_user(&user_id).await.map_err(ApiError::store)?.is_none() {
    return Err(ApiError::NotFound("User Not Found".into()));
  }
  let post = resolve_post(store, &id).await?;

  let upsert = store
    .record_engagement(NewEngagement { user_id, post, counters: body.counters })
    .await
    .map_err(ApiError::store)?;
  debug!(stat_id = upsert.stat_id, created = upsert.created, "engagement recorded");

  let message = if upsert.created {
    "Stats added successfully"
  } else {
    "Stats updated successfully"
  };
  Ok((StatusCode::CREATED, Json(json!({ "id": upsert.stat_id, "message": message }))))
}

// ─── Read ─────────────────────────────────────────────────────────────────────

/// `GET /stats`
pub async fn list<S: StatsStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<EngagementStat>>, ApiError> {
  let stats = state.store.list_stats().await.map_err(ApiError::store)?;
  Ok(Json(stats))
}

/// `GET /stats/article`
pub async fn for_post<S: StatsStore>(
  State(state): State<AppState<S>>,
  Input(body): Input<IdBody>,
) -> Result<Json<Vec<EngagementStat>>, ApiError> {
  let id = required_str(body.id, "ID is required")?;
  let post = resolve_post(state.store.as_ref(), &id).await?;
  let stats = state.store.stats_for_post(&post).await.map_err(ApiError::store)?;
  Ok(Json(stats))
}

/// `GET /stats/users-locations`
pub async fn users_locations<S: StatsStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<Value>, ApiError> {
  let locations = state.store.count_users_by_location().await.map_err(ApiError::store)?;
  Ok(Json(json!({ "locations": locations })))
}

/// `GET /stats/metrics`
pub async fn metrics<S: StatsStore>(
  State(state): State<AppState<S>>,
  Input(body): Input<IdBody>,
) -> Result<Json<Vec<LocationMetrics>>, ApiError> {
  let id = required_str(body.id, "ID is required")?;
  let metrics = location_metrics(state.store.as_ref(), &id).await?;
  Ok(Json(metrics))
}
