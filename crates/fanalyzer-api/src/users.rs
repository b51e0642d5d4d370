//! Handlers for user endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/users` | Body: `{"user_id":"..","location":"US"}`; 200 if it already exists |
//! | `POST`   | `/add-all-users` | Body: array of users; existing ids are skipped |
//! | `GET`    | `/users` | All users |
//! | `PATCH`  | `/users?user_id=` | Profile fields; invalidates the cached user rating |
//! | `DELETE` | `/users/clear` | Drops every row and flushes the cache |
//! | `GET`    | `/users/{post_type}?user_id=` | `topics`, `articles` or `advertisements` |
//! | `GET`    | `/user?user_id=` | 404 if not found |
//! | `DELETE` | `/user?user_id=` | Cascades to everything the user owns and drops their cached ratings |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use fanalyzer_core::{
  cache::{ALL_ARTICLES_KEY, invalidate, post_rating_key, user_rating_key},
  post::{ArticleFilter, PostKind},
  store::StatsStore,
  user::{NewUser, User, UserPatch},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::{
  AppState,
  error::{ApiError, required_str},
  extract::{Input, Params},
};

#[derive(Debug, Deserialize)]
pub struct UserIdParams {
  pub user_id: Option<String>,
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub user_id:  Option<String>,
  pub location: Option<String>,
}

/// `POST /users`
pub async fn create<S: StatsStore>(
  State(state): State<AppState<S>>,
  Input(body): Input<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let user_id = required_str(body.user_id, "User ID is required")?;

  let created = state
    .store
    .add_user(NewUser { user_id: user_id.clone(), location: body.location })
    .await
    .map_err(ApiError::store)?;

  Ok(match created {
    Some(user) => (
      StatusCode::CREATED,
      Json(json!({ "id": user.user_id, "message": "User created successfully" })),
    ),
    None => (StatusCode::OK, Json(json!({ "user_id": user_id }))),
  })
}

/// `POST /add-all-users`: body: `[{"user_id":".."}, ...]`
pub async fn create_many<S: StatsStore>(
  State(state): State<AppState<S>>,
  Input(body): Input<Value>,
) -> Result<impl IntoResponse, ApiError> {
  let Value::Array(items) = body else {
    return Err(ApiError::Validation(
      "Request body should contain an array of users".into(),
    ));
  };
  if items.is_empty() {
    return Err(ApiError::Validation("Request body required".into()));
  }

  let users = items
    .into_iter()
    .map(serde_json::from_value::<NewUser>)
    .collect::<Result<Vec<_>, _>>()
    .map_err(|e| ApiError::Validation(format!("invalid user: {e}")))?;

  let created = state.store.add_users(users).await.map_err(ApiError::store)?;
  info!(created, "bulk user import");

  Ok((
    StatusCode::CREATED,
    Json(json!({ "message": format!("{created} users created successfully") })),
  ))
}

// ─── Read ─────────────────────────────────────────────────────────────────────

/// `GET /users`
pub async fn list<S: StatsStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<Value>, ApiError> {
  let users = state.store.list_users().await.map_err(ApiError::store)?;
  Ok(Json(json!({ "response": "OK", "usersList": users })))
}

/// `GET /user?user_id=`
pub async fn get_one<S: StatsStore>(
  State(state): State<AppState<S>>,
  Input(params): Input<UserIdParams>,
) -> Result<Json<User>, ApiError> {
  let user_id = required_str(params.user_id, "User ID is required")?;
  let user = state
    .store
    .get_user(&user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
  Ok(Json(user))
}

/// `GET /users/{post_type}?user_id=`
pub async fn owned_posts<S: StatsStore>(
  State(state): State<AppState<S>>,
  Path(post_type): Path<String>,
  Input(params): Input<UserIdParams>,
) -> Result<Response, ApiError> {
  let user_id = required_str(params.user_id, "User ID is required")?;
  let store = &state.store;

  if store.get_user(&user_id).await.map_err(ApiError::store)?.is_none() {
    return Err(ApiError::NotFound("User does not exist".into()));
  }

  match post_type.as_str() {
    "topics" => {
      let topics = store.list_topics(Some(user_id.as_str())).await.map_err(ApiError::store)?;
      Ok(Json(topics).into_response())
    }
    "articles" => {
      let filter = ArticleFilter { user_id: Some(user_id.clone()), ..Default::default() };
      let articles = store.list_articles(&filter).await.map_err(ApiError::store)?;
      Ok(Json(articles).into_response())
    }
    "advertisements" => {
      let ads = store.list_advertisements(Some(user_id.as_str())).await.map_err(ApiError::store)?;
      Ok(Json(ads).into_response())
    }
    _ => Err(ApiError::Validation(
      "Post type must be one of topics, articles or advertisements".into(),
    )),
  }
}

// ─── Update / delete ──────────────────────────────────────────────────────────

/// `PATCH /users?user_id=`: body: any of the profile fields.
pub async fn update<S: StatsStore>(
  State(state): State<AppState<S>>,
  Params(params): Params<UserIdParams>,
  Input(patch): Input<UserPatch>,
) -> Result<Json<Value>, ApiError> {
  let user_id = required_str(params.user_id, "User ID is required")?;

  let user = state
    .store
    .update_user(&user_id, patch)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("User does not exist".into()))?;

  invalidate(state.cache.as_ref(), &user_rating_key(&user_id)).await;
  Ok(Json(json!({ "id": user_id, "message": "User updated successfully", "user": user })))
}

/// `DELETE /user?user_id=`
pub async fn remove<S: StatsStore>(
  State(state): State<AppState<S>>,
  Input(params): Input<UserIdParams>,
) -> Result<Json<Value>, ApiError> {
  let user_id = required_str(params.user_id, "user_id is required")?;

  let removed = state
    .store
    .delete_user(&user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
  info!(%user_id, posts = removed.len(), "user deleted");

  let cache = state.cache.as_ref();
  invalidate(cache, &user_rating_key(&user_id)).await;
  for post in &removed {
    invalidate(cache, &post_rating_key(&post.id)).await;
  }
  if removed.iter().any(|p| p.kind == PostKind::Article) {
    invalidate(cache, ALL_ARTICLES_KEY).await;
  }
  Ok(Json(json!({ "message": "User and all user related data deleted successfully" })))
}

/// `DELETE /users/clear`
pub async fn clear<S: StatsStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<Value>, ApiError> {
  state.store.clear().await.map_err(ApiError::store)?;
  if let Err(e) = state.cache.clear().await {
    warn!(error = %e, "failed to flush cache");
  }
  info!("all data cleared");
  Ok(Json(json!({ "response": "DB cleared" })))
}
