//! Posts: the three engageable content kinds.
//!
//! Articles, topics and advertisements live in separate tables but share one
//! identifier namespace. Everything downstream of the resolver addresses a
//! post through a [`PostRef`], never through a bare string.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which table a post identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
  Article,
  Topic,
  Advertisement,
}

impl PostKind {
  /// The order in which stores are probed when resolving an identifier.
  pub const PROBE_ORDER: [PostKind; 3] =
    [PostKind::Article, PostKind::Topic, PostKind::Advertisement];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Article => "article",
      Self::Topic => "topic",
      Self::Advertisement => "advertisement",
    }
  }
}

impl fmt::Display for PostKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A resolved post identifier: the id together with the kind it denotes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostRef {
  pub kind: PostKind,
  pub id:   String,
}

impl PostRef {
  pub fn new(kind: PostKind, id: impl Into<String>) -> Self {
    Self { kind, id: id.into() }
  }

  pub fn article(id: impl Into<String>) -> Self { Self::new(PostKind::Article, id) }
}

impl fmt::Display for PostRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.kind, self.id)
  }
}

// ─── Stored posts ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
  pub topic_id:   String,
  pub user_id:    String,
  pub title:      String,
  pub content:    String,
  pub categories: Vec<String>,
  pub created_at: DateTime<Utc>,
}

/// An article always belongs to a parent topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
  pub article_id: String,
  pub user_id:    String,
  pub topic_id:   String,
  pub title:      String,
  pub content:    String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advertisement {
  pub ad_id:      String,
  pub user_id:    String,
  pub title:      String,
  pub content:    String,
  pub budget:     Option<f64>,
  pub duration:   Option<String>,
  pub created_at: DateTime<Utc>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::StatsStore::add_topic`].
#[derive(Debug, Clone)]
pub struct NewTopic {
  pub topic_id:   String,
  pub user_id:    String,
  pub title:      String,
  pub content:    String,
  pub categories: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewArticle {
  pub article_id: String,
  pub user_id:    String,
  pub topic_id:   String,
  pub title:      String,
  pub content:    String,
}

#[derive(Debug, Clone)]
pub struct NewAdvertisement {
  pub ad_id:    String,
  pub user_id:  String,
  pub title:    String,
  pub content:  String,
  pub budget:   Option<f64>,
  pub duration: Option<String>,
}

/// Filter for [`crate::store::StatsStore::list_articles`].
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
  pub topic_id: Option<String>,
  pub user_id:  Option<String>,
}
