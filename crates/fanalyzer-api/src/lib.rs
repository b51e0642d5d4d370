//! JSON REST API for the Fanalyzer stats service.
//!
//! Exposes an axum [`Router`] backed by any [`StatsStore`]. Auth, TLS and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/v1", fanalyzer_api::api_router(state))
//! ```

pub mod error;
pub mod extract;
pub mod posts;
pub mod ratings;
pub mod social;
pub mod stats;
pub mod trace;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use fanalyzer_core::{
  cache::JsonCache, geo::GeoLocator, sentiment::TextCompletion, store::StatsStore,
};

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:      Arc<S>,
  pub cache:      Arc<dyn JsonCache>,
  pub completion: Arc<dyn TextCompletion>,
  /// `None` when no GeoIP database is configured.
  pub geo:        Option<Arc<dyn GeoLocator>>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:      Arc::clone(&self.store),
      cache:      Arc::clone(&self.cache),
      completion: Arc::clone(&self.completion),
      geo:        self.geo.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: StatsStore + 'static,
{
  Router::new()
    // Users
    .route("/users", get(users::list::<S>).post(users::create::<S>).patch(users::update::<S>))
    .route("/add-all-users", post(users::create_many::<S>))
    .route("/users/clear", delete(users::clear::<S>))
    .route("/users/{post_type}", get(users::owned_posts::<S>))
    .route("/user", get(users::get_one::<S>).delete(users::remove::<S>))
    // Posts
    .route("/topic", get(posts::get_topic::<S>).post(posts::create_topic::<S>))
    .route("/topics", get(posts::list_topics::<S>))
    .route("/topic/articles", get(posts::topic_articles::<S>))
    .route(
      "/article",
      get(posts::get_article::<S>)
        .post(posts::create_article::<S>)
        .delete(posts::delete_article::<S>),
    )
    .route("/articles", get(posts::list_articles::<S>))
    .route(
      "/advertisement",
      get(posts::get_advertisement::<S>).post(posts::create_advertisement::<S>),
    )
    .route("/advertisements", get(posts::list_advertisements::<S>))
    // Engagement statistics
    .route("/stats", get(stats::list::<S>).post(stats::record::<S>))
    .route("/stats/article", get(stats::for_post::<S>))
    .route("/stats/users-locations", get(stats::users_locations::<S>))
    .route("/stats/metrics", get(stats::metrics::<S>))
    // Comments, reactions, shares
    .route("/comment", post(social::add_comment::<S>))
    .route("/comments", get(social::comments_by_location::<S>))
    .route("/comments/article", get(social::article_comments_by_country::<S>))
    .route("/comments/analysis", post(social::analyze::<S>))
    .route("/reaction", post(social::react::<S>))
    .route("/reactions", get(social::reactions_by_location::<S>))
    .route("/reactions/by-type", get(social::reactions_total::<S>))
    .route("/reactions/article", get(social::article_reactions_by_country::<S>))
    .route("/share", post(social::add_share::<S>))
    // Ratings
    .route("/post-rating", get(ratings::post::<S>))
    .route("/user-rating", get(ratings::user::<S>))
    // Geo
    .route("/trace", get(trace::handler::<S>))
    .with_state(state)
}
