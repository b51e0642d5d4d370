//! Handlers for topic, article and advertisement endpoints.
//!
//! Identifiers are unique across all three kinds. Creating a post whose id is
//! already taken by the same kind returns the existing post with `200`; an id
//! taken by another kind is a `409`.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use fanalyzer_core::{
  Error,
  cache::{ALL_ARTICLES_KEY, CacheAside, LISTING_TTL, invalidate, post_rating_key},
  post::{
    Advertisement, Article, ArticleFilter, NewAdvertisement, NewArticle, NewTopic, PostKind,
    Topic,
  },
  resolve::check_identifier,
  store::StatsStore,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::{
  AppState,
  error::{ApiError, required_str},
  extract::Input,
};

/// 404 unless `user_id` exists.
async fn ensure_owner<S: StatsStore>(store: &S, user_id: &str) -> Result<(), ApiError> {
  match store.get_user(user_id).await.map_err(ApiError::store)? {
    Some(_) => Ok(()),
    None => Err(ApiError::NotFound("User not found".into())),
  }
}

fn created(id: &str, message: &str) -> Response {
  (StatusCode::CREATED, Json(json!({ "id": id, "message": message }))).into_response()
}

// ─── Topics ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TopicBody {
  pub user_id:    Option<String>,
  pub topic_id:   Option<String>,
  pub title:      Option<String>,
  pub content:    Option<String>,
  #[serde(default)]
  pub categories: Vec<String>,
}

/// `POST /topic`
pub async fn create_topic<S: StatsStore>(
  State(state): State<AppState<S>>,
  Input(body): Input<TopicBody>,
) -> Result<Response, ApiError> {
  let user_id = required_str(body.user_id, "user_id is required")?;
  let title = required_str(body.title, "title is required")?;
  let content = required_str(body.content, "content is required")?;
  let topic_id = required_str(body.topic_id, "topic_id is required")?;
  let store = state.store.as_ref();

  ensure_owner(store, &user_id).await?;

  if check_identifier(store, PostKind::Topic, &topic_id).await? {
    let existing = store.get_topic(&topic_id).await.map_err(ApiError::store)?;
    return Ok(Json(existing).into_response());
  }

  let topic = store
    .add_topic(NewTopic { topic_id, user_id, title, content, categories: body.categories })
    .await
    .map_err(ApiError::store)?;
  info!(topic_id = %topic.topic_id, "topic created");
  Ok(created(&topic.topic_id, "Topic created successfully"))
}

#[derive(Debug, Deserialize)]
pub struct TopicParams {
  pub topic_id: Option<String>,
}

/// `GET /topic?topic_id=`
pub async fn get_topic<S: StatsStore>(
  State(state): State<AppState<S>>,
  Input(params): Input<TopicParams>,
) -> Result<Json<Topic>, ApiError> {
  let topic_id = required_str(params.topic_id, "Topic ID is required")?;
  let topic = state
    .store
    .get_topic(&topic_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("Topic not found".into()))?;
  Ok(Json(topic))
}

/// `GET /topics`
pub async fn list_topics<S: StatsStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Topic>>, ApiError> {
  let topics = state.store.list_topics(None).await.map_err(ApiError::store)?;
  Ok(Json(topics))
}

/// `GET /topic/articles?topic_id=`
pub async fn topic_articles<S: StatsStore>(
  State(state): State<AppState<S>>,
  Input(params): Input<TopicParams>,
) -> Result<Json<Vec<Article>>, ApiError> {
  let topic_id = required_str(params.topic_id, "Topic ID is required")?;
  let store = state.store.as_ref();

  if store.get_topic(&topic_id).await.map_err(ApiError::store)?.is_none() {
    return Err(ApiError::NotFound("Topic not found".into()));
  }

  let filter = ArticleFilter { topic_id: Some(topic_id), ..Default::default() };
  let articles = store.list_articles(&filter).await.map_err(ApiError::store)?;
  Ok(Json(articles))
}

// ─── Articles ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ArticleBody {
  pub user_id:    Option<String>,
  pub article_id: Option<String>,
  pub topic_id:   Option<String>,
  pub title:      Option<String>,
  pub content:    Option<String>,
}

/// `POST /article`: the parent topic must exist.
pub async fn create_article<S: StatsStore>(
  State(state): State<AppState<S>>,
  Input(body): Input<ArticleBody>,
) -> Result<Response, ApiError> {
  let user_id = required_str(body.user_id, "user_id is required")?;
  let title = required_str(body.title, "title is required")?;
  let content = required_str(body.content, "content is required")?;
  let topic_id = required_str(body.topic_id, "topic_id is required")?;
  let article_id = required_str(body.article_id, "article_id is required")?;
  let store = state.store.as_ref();

  if store.get_topic(&topic_id).await.map_err(ApiError::store)?.is_none() {
    return Err(ApiError::NotFound("Topic not found".into()));
  }
  ensure_owner(store, &user_id).await?;

  if check_identifier(store, PostKind::Article, &article_id).await? {
    let existing = store.get_article(&article_id).await.map_err(ApiError::store)?;
    return Ok(Json(existing).into_response());
  }

  let article = store
    .add_article(NewArticle { article_id, user_id, topic_id, title, content })
    .await
    .map_err(ApiError::store)?;
  invalidate(state.cache.as_ref(), ALL_ARTICLES_KEY).await;
  info!(article_id = %article.article_id, "article created");
  Ok(created(&article.article_id, "Article created successfully"))
}

#[derive(Debug, Deserialize)]
pub struct ArticleParams {
  pub article_id: Option<String>,
}

/// `GET /article?article_id=`
pub async fn get_article<S: StatsStore>(
  State(state): State<AppState<S>>,
  Input(params): Input<ArticleParams>,
) -> Result<Json<Article>, ApiError> {
  let article_id = required_str(params.article_id, "article_id is required")?;
  let article = state
    .store
    .get_article(&article_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("Article not found".into()))?;
  Ok(Json(article))
}

/// `GET /articles`: cached under `allArticles`.
pub async fn list_articles<S: StatsStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Article>>, ApiError> {
  let store = state.store.as_ref();
  let articles = CacheAside::new(state.cache.as_ref(), ALL_ARTICLES_KEY, LISTING_TTL)
    .get_or_compute(|| async move {
      store.list_articles(&ArticleFilter::default()).await.map_err(Error::store)
    })
    .await?;
  Ok(Json(articles))
}

/// `DELETE /article?article_id=`
pub async fn delete_article<S: StatsStore>(
  State(state): State<AppState<S>>,
  Input(params): Input<ArticleParams>,
) -> Result<Json<Value>, ApiError> {
  let article_id = required_str(params.article_id, "article_id is required")?;

  if !state.store.delete_article(&article_id).await.map_err(ApiError::store)? {
    return Err(ApiError::NotFound("Article not found".into()));
  }

  let cache = state.cache.as_ref();
  invalidate(cache, &post_rating_key(&article_id)).await;
  invalidate(cache, ALL_ARTICLES_KEY).await;
  info!(%article_id, "article deleted");
  Ok(Json(json!({ "message": "Article deleted successfully" })))
}

// ─── Advertisements ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AdvertisementBody {
  pub user_id:  Option<String>,
  pub ad_id:    Option<String>,
  pub title:    Option<String>,
  pub content:  Option<String>,
  pub budget:   Option<f64>,
  pub duration: Option<String>,
}

/// `POST /advertisement`
pub async fn create_advertisement<S: StatsStore>(
  State(state): State<AppState<S>>,
  Input(body): Input<AdvertisementBody>,
) -> Result<Response, ApiError> {
  const MISSING: &str = "user_id, title, content, and ad_id are required";
  let user_id = required_str(body.user_id, MISSING)?;
  let title = required_str(body.title, MISSING)?;
  let content = required_str(body.content, MISSING)?;
  let ad_id = required_str(body.ad_id, MISSING)?;
  let store = state.store.as_ref();

  ensure_owner(store, &user_id).await?;

  if check_identifier(store, PostKind::Advertisement, &ad_id).await? {
    let existing = store.get_advertisement(&ad_id).await.map_err(ApiError::store)?;
    return Ok(Json(existing).into_response());
  }

  let ad = store
    .add_advertisement(NewAdvertisement {
      ad_id,
      user_id,
      title,
      content,
      budget: body.budget,
      duration: body.duration,
    })
    .await
    .map_err(ApiError::store)?;
  info!(ad_id = %ad.ad_id, "advertisement created");
  Ok(created(&ad.ad_id, "Advertisement added successfully"))
}

#[derive(Debug, Deserialize)]
pub struct AdvertisementParams {
  pub ad_id: Option<String>,
}

/// `GET /advertisement?ad_id=`
pub async fn get_advertisement<S: StatsStore>(
  State(state): State<AppState<S>>,
  Input(params): Input<AdvertisementParams>,
) -> Result<Json<Advertisement>, ApiError> {
  let ad_id = required_str(params.ad_id, "ad_id is required")?;
  let ad = state
    .store
    .get_advertisement(&ad_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("Advertisement not found".into()))?;
  Ok(Json(ad))
}

/// `GET /advertisements`
pub async fn list_advertisements<S: StatsStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Advertisement>>, ApiError> {
  let ads = state.store.list_advertisements(None).await.map_err(ApiError::store)?;
  Ok(Json(ads))
}
