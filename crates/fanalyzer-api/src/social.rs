//! Handlers for comments, reactions and shares.
//!
//! Every write takes a bare post `id` and resolves its kind first, so the same
//! endpoints serve articles, topics and advertisements.

use std::collections::BTreeMap;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use fanalyzer_core::{
  geo::{count_by_location, reactions_by_location as group_reactions},
  post::PostRef,
  resolve::resolve_post,
  sentiment::{SentimentSummary, analyze_comments},
  social::{NewComment, NewShare, ReactionChange, ReactionInput},
  store::StatsStore,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
  AppState,
  error::{ApiError, required_str},
  extract::Input,
  stats::IdBody,
};

async fn ensure_user<S: StatsStore>(store: &S, user_id: &str) -> Result<(), ApiError> {
  match store.get_user(user_id).await.map_err(ApiError::store)? {
    Some(_) => Ok(()),
    None => Err(ApiError::NotFound("User not found".into())),
  }
}

/// The article `article_id`, or 404.
async fn existing_article<S: StatsStore>(
  store: &S,
  article_id: Option<String>,
) -> Result<PostRef, ApiError> {
  let article_id = required_str(article_id, "Article ID is required")?;
  let post = PostRef::article(article_id);
  if !store.post_exists(&post).await.map_err(ApiError::store)? {
    return Err(ApiError::NotFound("Article Not Found".into()));
  }
  Ok(post)
}

/// One `{location, count}` row of a per-country breakdown.
#[derive(Debug, Serialize)]
pub struct CountryCount {
  pub location: String,
  pub count:    u64,
}

fn by_country(counts: BTreeMap<String, u64>) -> Value {
  let rows: Vec<CountryCount> = counts
    .into_iter()
    .map(|(location, count)| CountryCount { location, count })
    .collect();
  json!({ "response": rows })
}

// ─── Comments ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CommentBody {
  pub user_id: Option<String>,
  pub id:      Option<String>,
  pub content: Option<String>,
}

/// `POST /comment`
pub async fn add_comment<S: StatsStore>(
  State(state): State<AppState<S>>,
  Input(body): Input<CommentBody>,
) -> Result<impl IntoResponse, ApiError> {
  let user_id = required_str(body.user_id, "user_id is required")?;
  let id = required_str(body.id, "Id is required")?;
  let content = required_str(body.content, "content is required")?;
  let store = state.store.as_ref();

  ensure_user(store, &user_id).await?;
  let post = resolve_post(store, &id).await?;

  let comment = store
    .add_comment(NewComment { user_id, post, content })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(json!({ "comment": comment }))))
}

/// `GET /comments`: `{"id"}`; comment counts keyed by location.
pub async fn comments_by_location<S: StatsStore>(
  State(state): State<AppState<S>>,
  Input(body): Input<IdBody>,
) -> Result<Json<Value>, ApiError> {
  let id = required_str(body.id, "ID is required")?;
  let post = resolve_post(state.store.as_ref(), &id).await?;
  let locations = state.store.comment_locations(&post).await.map_err(ApiError::store)?;
  Ok(Json(json!({ "comments": count_by_location(&locations) })))
}

#[derive(Debug, Deserialize)]
pub struct ArticleParams {
  pub article_id: Option<String>,
}

/// `GET /comments/article?article_id=`
pub async fn article_comments_by_country<S: StatsStore>(
  State(state): State<AppState<S>>,
  Input(params): Input<ArticleParams>,
) -> Result<Json<Value>, ApiError> {
  let post = existing_article(state.store.as_ref(), params.article_id).await?;
  let locations = state.store.comment_locations(&post).await.map_err(ApiError::store)?;
  Ok(Json(by_country(count_by_location(&locations))))
}

#[derive(Debug, Deserialize)]
pub struct AnalysisBody {
  pub id:       Option<String>,
  #[serde(default)]
  pub comments: Vec<String>,
}

/// `POST /comments/analysis`: `{"id", "comments": [..]}`; one-word sentiment.
pub async fn analyze<S: StatsStore>(
  State(state): State<AppState<S>>,
  Input(body): Input<AnalysisBody>,
) -> Result<Json<SentimentSummary>, ApiError> {
  let id = body.id.unwrap_or_default();
  let summary = analyze_comments(
    state.cache.as_ref(),
    state.completion.as_ref(),
    &id,
    &body.comments,
  )
  .await?;
  Ok(Json(summary))
}

// ─── Reactions ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReactionBody {
  pub user_id: Option<String>,
  pub id:      Option<String>,
  /// `true` like, `false` dislike, `null` or absent clears.
  #[serde(rename = "isLike")]
  pub is_like: Option<bool>,
}

/// `POST /reaction`
pub async fn react<S: StatsStore>(
  State(state): State<AppState<S>>,
  Input(body): Input<ReactionBody>,
) -> Result<impl IntoResponse, ApiError> {
  let user_id = required_str(body.user_id, "User ID is required")?;
  let id = required_str(body.id, "An Id is required")?;
  let store = state.store.as_ref();

  ensure_user(store, &user_id).await?;
  let post = resolve_post(store, &id).await?;

  let change = store
    .set_reaction(ReactionInput { user_id, post, is_like: body.is_like })
    .await
    .map_err(ApiError::store)?;

  let message = match change {
    ReactionChange::Added => "Interaction added successfully",
    ReactionChange::Updated => "Interaction updated successfully",
    ReactionChange::Removed => "Interaction removed successfully",
    ReactionChange::NothingToRemove => {
      return Err(ApiError::Validation("Interaction should be a boolean".into()));
    }
  };
  Ok((StatusCode::CREATED, Json(json!({ "id": id, "message": message }))))
}

/// `GET /reactions`: `{"id"}`; likes and dislikes keyed by location.
pub async fn reactions_by_location<S: StatsStore>(
  State(state): State<AppState<S>>,
  Input(body): Input<IdBody>,
) -> Result<Json<Value>, ApiError> {
  let id = required_str(body.id, "id is required")?;
  let post = resolve_post(state.store.as_ref(), &id).await?;
  let reactions = state.store.reaction_locations(&post).await.map_err(ApiError::store)?;
  Ok(Json(json!({ "interactions": group_reactions(&reactions) })))
}

#[derive(Debug, Deserialize)]
pub struct ReactionTypeParams {
  pub article_id: Option<String>,
  #[serde(rename = "type")]
  pub kind:       Option<String>,
}

/// `likes` → `true`, `dislikes` → `false`.
fn reaction_type(kind: Option<&str>) -> Result<bool, ApiError> {
  match kind {
    Some("likes") => Ok(true),
    Some("dislikes") => Ok(false),
    _ => Err(ApiError::Validation("Type is required (likes or dislikes)".into())),
  }
}

/// `GET /reactions/by-type?article_id=&type=likes|dislikes`
pub async fn reactions_total<S: StatsStore>(
  State(state): State<AppState<S>>,
  Input(params): Input<ReactionTypeParams>,
) -> Result<Json<Value>, ApiError> {
  let is_like = reaction_type(params.kind.as_deref())?;
  let post = existing_article(state.store.as_ref(), params.article_id).await?;
  let total = state
    .store
    .count_reactions(&post, is_like)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(json!({ "total": total })))
}

/// `GET /reactions/article?article_id=&type=likes|dislikes`
pub async fn article_reactions_by_country<S: StatsStore>(
  State(state): State<AppState<S>>,
  Input(params): Input<ReactionTypeParams>,
) -> Result<Json<Value>, ApiError> {
  let is_like = reaction_type(params.kind.as_deref())?;
  let post = existing_article(state.store.as_ref(), params.article_id).await?;
  let reactions = state.store.reaction_locations(&post).await.map_err(ApiError::store)?;

  let matching: Vec<Option<String>> = reactions
    .into_iter()
    .filter(|r| r.is_like == is_like)
    .map(|r| r.location)
    .collect();
  Ok(Json(by_country(count_by_location(&matching))))
}

// ─── Shares ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ShareBody {
  pub user_id:      Option<String>,
  pub id:           Option<String>,
  #[serde(alias = "socialMedia")]
  pub social_media: Option<String>,
}

/// `POST /share`
pub async fn add_share<S: StatsStore>(
  State(state): State<AppState<S>>,
  Input(body): Input<ShareBody>,
) -> Result<impl IntoResponse, ApiError> {
  let user_id = required_str(body.user_id, "User ID is required")?;
  let id = required_str(body.id, "ID is required")?;
  let store = state.store.as_ref();

  ensure_user(store, &user_id).await?;
  let post = resolve_post(store, &id).await?;

  store
    .add_share(NewShare { user_id, post, social_media: body.social_media })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(json!({ "id": id, "message": "Share added successfully" }))))
}
