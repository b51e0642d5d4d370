//! The `StatsStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `fanalyzer-store-sqlite`). The rating engine and the HTTP layer depend on
//! this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  engagement::{EngagementCounters, EngagementStat, NewEngagement, PostTotals, StatUpsert},
  post::{
    Advertisement, Article, ArticleFilter, NewAdvertisement, NewArticle, NewTopic,
    PostKind, PostRef, Topic,
  },
  social::{
    Comment, LocatedReaction, NewComment, NewShare, ReactionChange, ReactionInput,
    Share,
  },
  user::{LocationCount, NewUser, User, UserPatch},
};

/// Abstraction over the relational store behind the stats service.
///
/// Counter accumulation must be atomic: two concurrent
/// [`record_engagement`](StatsStore::record_engagement) calls for the same
/// `(user, post)` pair must both be reflected in the stored row.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait StatsStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Insert a user. Returns `None` if the id is already taken.
  fn add_user(
    &self,
    user: NewUser,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Insert every user whose id is not yet taken; returns how many were
  /// created.
  fn add_users(
    &self,
    users: Vec<NewUser>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn get_user<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  fn list_users(
    &self,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Apply `patch`; returns the updated user or `None` if absent.
  fn update_user<'a>(
    &'a self,
    user_id: &'a str,
    patch: UserPatch,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Delete a user with everything they own: their posts, the engagement and
  /// social rows attached to those posts, and the rows they authored.
  /// Returns the posts that were removed, or `None` if the user did not
  /// exist.
  fn delete_user<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Option<Vec<PostRef>>, Self::Error>> + Send + 'a;

  /// Remove every row from every table.
  fn clear(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Users per non-null location.
  fn count_users_by_location(
    &self,
  ) -> impl Future<Output = Result<Vec<LocationCount>, Self::Error>> + Send + '_;

  // ── Posts ─────────────────────────────────────────────────────────────

  /// Primary-key probe of the table for `post.kind`.
  fn post_exists<'a>(
    &'a self,
    post: &'a PostRef,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn add_topic(
    &self,
    topic: NewTopic,
  ) -> impl Future<Output = Result<Topic, Self::Error>> + Send + '_;

  fn add_article(
    &self,
    article: NewArticle,
  ) -> impl Future<Output = Result<Article, Self::Error>> + Send + '_;

  fn add_advertisement(
    &self,
    ad: NewAdvertisement,
  ) -> impl Future<Output = Result<Advertisement, Self::Error>> + Send + '_;

  fn get_topic<'a>(
    &'a self,
    topic_id: &'a str,
  ) -> impl Future<Output = Result<Option<Topic>, Self::Error>> + Send + 'a;

  fn get_article<'a>(
    &'a self,
    article_id: &'a str,
  ) -> impl Future<Output = Result<Option<Article>, Self::Error>> + Send + 'a;

  fn get_advertisement<'a>(
    &'a self,
    ad_id: &'a str,
  ) -> impl Future<Output = Result<Option<Advertisement>, Self::Error>> + Send + 'a;

  /// List topics, optionally restricted to one owner.
  fn list_topics<'a>(
    &'a self,
    user_id: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<Topic>, Self::Error>> + Send + 'a;

  fn list_articles<'a>(
    &'a self,
    filter: &'a ArticleFilter,
  ) -> impl Future<Output = Result<Vec<Article>, Self::Error>> + Send + 'a;

  fn list_advertisements<'a>(
    &'a self,
    user_id: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<Advertisement>, Self::Error>> + Send + 'a;

  /// Delete an article together with its engagement and social rows.
  /// Returns `false` if the article did not exist.
  fn delete_article<'a>(
    &'a self,
    article_id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Engagement ────────────────────────────────────────────────────────

  /// Upsert-with-increment of the `(user, post)` row. The post must exist.
  fn record_engagement(
    &self,
    input: NewEngagement,
  ) -> impl Future<Output = Result<StatUpsert, Self::Error>> + Send + '_;

  fn list_stats(
    &self,
  ) -> impl Future<Output = Result<Vec<EngagementStat>, Self::Error>> + Send + '_;

  /// The rows recorded directly against `post`. A topic's rows do not include
  /// the rows of its articles.
  fn stats_for_post<'a>(
    &'a self,
    post: &'a PostRef,
  ) -> impl Future<Output = Result<Vec<EngagementStat>, Self::Error>> + Send + 'a;

  /// Field-wise maximum over every stat row; all zero when there are none.
  fn max_counters(
    &self,
  ) -> impl Future<Output = Result<EngagementCounters, Self::Error>> + Send + '_;

  /// Summed counters for every post of `kind`, including posts with no rows.
  fn post_totals(
    &self,
    kind: PostKind,
  ) -> impl Future<Output = Result<Vec<PostTotals>, Self::Error>> + Send + '_;

  /// Summed counters for every post owned by `user_id`, of any kind.
  fn owned_post_totals<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Vec<PostTotals>, Self::Error>> + Send + 'a;

  // ── Social ────────────────────────────────────────────────────────────

  fn add_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  /// The commenter location of every comment on `post`.
  fn comment_locations<'a>(
    &'a self,
    post: &'a PostRef,
  ) -> impl Future<Output = Result<Vec<Option<String>>, Self::Error>> + Send + 'a;

  /// Set, flip or clear the user's reaction on a post.
  fn set_reaction(
    &self,
    input: ReactionInput,
  ) -> impl Future<Output = Result<ReactionChange, Self::Error>> + Send + '_;

  fn count_reactions<'a>(
    &'a self,
    post: &'a PostRef,
    is_like: bool,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  fn reaction_locations<'a>(
    &'a self,
    post: &'a PostRef,
  ) -> impl Future<Output = Result<Vec<LocatedReaction>, Self::Error>> + Send + 'a;

  fn add_share(
    &self,
    input: NewShare,
  ) -> impl Future<Output = Result<Share, Self::Error>> + Send + '_;

  fn share_locations<'a>(
    &'a self,
    post: &'a PostRef,
  ) -> impl Future<Output = Result<Vec<Option<String>>, Self::Error>> + Send + 'a;
}
