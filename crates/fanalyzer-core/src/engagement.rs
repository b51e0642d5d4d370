//! Engagement counters: the raw input of the rating engine.
//!
//! There is at most one [`EngagementStat`] per `(user, post)` pair. Repeated
//! submissions are folded into the existing row by the store with an atomic
//! increment.

use std::iter::Sum;
use std::ops::Add;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::post::PostRef;

/// Five non-negative activity counters. Field names on the wire follow the
/// tracking client (`mouseMovements`, `totalTime`).
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct EngagementCounters {
  #[serde(default)]
  pub clicks:          u64,
  #[serde(default)]
  pub keypresses:      u64,
  #[serde(default)]
  pub mouse_movements: u64,
  #[serde(default)]
  pub scrolls:         u64,
  /// Time on page, in the unit reported by the client.
  #[serde(default)]
  pub total_time:      u64,
}

impl EngagementCounters {
  /// The counters in a fixed field order, for per-field arithmetic.
  pub fn fields(&self) -> [u64; 5] {
    [
      self.clicks,
      self.keypresses,
      self.mouse_movements,
      self.scrolls,
      self.total_time,
    ]
  }

  /// Field-wise maximum.
  pub fn max(self, other: Self) -> Self {
    Self {
      clicks:          self.clicks.max(other.clicks),
      keypresses:      self.keypresses.max(other.keypresses),
      mouse_movements: self.mouse_movements.max(other.mouse_movements),
      scrolls:         self.scrolls.max(other.scrolls),
      total_time:      self.total_time.max(other.total_time),
    }
  }
}

impl Add for EngagementCounters {
  type Output = Self;

  fn add(self, rhs: Self) -> Self {
    Self {
      clicks:          self.clicks.saturating_add(rhs.clicks),
      keypresses:      self.keypresses.saturating_add(rhs.keypresses),
      mouse_movements: self.mouse_movements.saturating_add(rhs.mouse_movements),
      scrolls:         self.scrolls.saturating_add(rhs.scrolls),
      total_time:      self.total_time.saturating_add(rhs.total_time),
    }
  }
}

impl Sum for EngagementCounters {
  fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
    iter.fold(Self::default(), Add::add)
  }
}

impl<'a> Sum<&'a EngagementCounters> for EngagementCounters {
  fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
    iter.copied().sum()
  }
}

/// One stored row: a user's accumulated activity on one post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementStat {
  pub stat_id:    i64,
  pub user_id:    String,
  pub post:       PostRef,
  /// Parent topic for article rows, the topic itself for topic rows.
  pub topic_id:   Option<String>,
  #[serde(flatten)]
  pub counters:   EngagementCounters,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Input to [`crate::store::StatsStore::record_engagement`].
#[derive(Debug, Clone)]
pub struct NewEngagement {
  pub user_id:  String,
  pub post:     PostRef,
  pub counters: EngagementCounters,
}

/// Outcome of an upsert-with-increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatUpsert {
  pub stat_id: i64,
  /// `true` if a new row was inserted, `false` if an existing row was
  /// incremented.
  pub created: bool,
}

/// The summed counters of one post across all users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostTotals {
  pub post:   PostRef,
  pub totals: EngagementCounters,
  /// Number of stat rows that contributed to `totals`.
  pub rows:   u64,
}
