//! Social rows attached to a post: comments, reactions and shares.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::post::PostRef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id: Uuid,
  pub user_id:    String,
  pub post:       PostRef,
  pub topic_id:   Option<String>,
  pub content:    String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
  pub user_id: String,
  pub post:    PostRef,
  pub content: String,
}

/// A like or dislike. At most one per `(user, post)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
  pub reaction_id: Uuid,
  pub user_id:     String,
  pub post:        PostRef,
  pub is_like:     bool,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::StatsStore::set_reaction`]. `is_like: None`
/// clears the user's reaction.
#[derive(Debug, Clone)]
pub struct ReactionInput {
  pub user_id: String,
  pub post:    PostRef,
  pub is_like: Option<bool>,
}

/// What [`crate::store::StatsStore::set_reaction`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionChange {
  Added,
  Updated,
  Removed,
  /// A clear was requested but the user had no reaction on the post.
  NothingToRemove,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Share {
  pub share_id:     Uuid,
  pub user_id:      String,
  pub post:         PostRef,
  pub social_media: Option<String>,
  pub created_at:   DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewShare {
  pub user_id:      String,
  pub post:         PostRef,
  pub social_media: Option<String>,
}

/// A reaction joined to the reacting user's location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedReaction {
  pub location: Option<String>,
  pub is_like:  bool,
}
