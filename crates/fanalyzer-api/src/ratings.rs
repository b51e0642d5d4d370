//! Rating endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/post-rating` | `{"id"}`; the post's rating plus every post of its kind, best first |
//! | `GET`  | `/user-rating` | `{"user_id"}`; mean rating over everything the user owns |
//!
//! Both results are cached for ten minutes and are not invalidated when new
//! stats are recorded.

use axum::{Json, extract::State};
use fanalyzer_core::{
  rating::{PostRatingOutcome, UserRating, post_rating, user_rating},
  store::StatsStore,
};

use crate::{
  AppState,
  error::{ApiError, required_str},
  extract::Input,
  stats::IdBody,
  users::UserIdParams,
};

/// `GET /post-rating`
pub async fn post<S: StatsStore>(
  State(state): State<AppState<S>>,
  Input(body): Input<IdBody>,
) -> Result<Json<PostRatingOutcome>, ApiError> {
  let id = required_str(body.id, "ID is required")?;
  let outcome = post_rating(state.store.as_ref(), state.cache.as_ref(), &id).await?;
  Ok(Json(outcome))
}

/// `GET /user-rating`
pub async fn user<S: StatsStore>(
  State(state): State<AppState<S>>,
  Input(body): Input<UserIdParams>,
) -> Result<Json<UserRating>, ApiError> {
  let user_id = required_str(body.user_id, "User ID is required")?;
  let rating = user_rating(state.store.as_ref(), state.cache.as_ref(), &user_id).await?;
  Ok(Json(rating))
}
