//! Engagement rating: a 0–100 score derived from five raw counters.
//!
//! Each counter is expressed as a fraction of the largest value of that
//! counter recorded anywhere in the store, and the fractions of the populated
//! counters are averaged. Counters a post has no data for do not drag its
//! score down.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
  Error, Result,
  cache::{CacheAside, JsonCache, RATING_TTL, post_rating_key, user_rating_key},
  engagement::{EngagementCounters, PostTotals},
  post::PostKind,
  resolve::resolve_post,
  store::StatsStore,
};

/// Upper bound of every rating.
pub const MAX_RATING: f64 = 100.0;

/// Per-counter denominators: the global maxima, each at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxStats(EngagementCounters);

impl MaxStats {
  /// Build denominators from observed maxima, replacing zeros with 1.
  pub fn from_observed(observed: EngagementCounters) -> Self {
    let floor = |v: u64| v.max(1);
    Self(EngagementCounters {
      clicks:          floor(observed.clicks),
      keypresses:      floor(observed.keypresses),
      mouse_movements: floor(observed.mouse_movements),
      scrolls:         floor(observed.scrolls),
      total_time:      floor(observed.total_time),
    })
  }

  pub fn counters(&self) -> &EngagementCounters { &self.0 }
}

/// Score `stats` against `max`. Always within `[0, 100]`.
pub fn calculate_rating(stats: &EngagementCounters, max: &MaxStats) -> f64 {
  let (sum, populated) = stats
    .fields()
    .into_iter()
    .zip(max.counters().fields())
    .filter(|(value, _)| *value > 0)
    .fold((0.0_f64, 0_u32), |(sum, n), (value, max)| {
      (sum + value as f64 / max as f64, n + 1)
    });

  if populated == 0 {
    return 0.0;
  }
  (sum / f64::from(populated) * MAX_RATING).min(MAX_RATING)
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// One entry of a ratings listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingEntry {
  pub id:     String,
  pub rating: f64,
}

/// Rating of one post plus every post of the same kind, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRating {
  pub id:          String,
  pub kind:        PostKind,
  pub post_rating: f64,
  pub ratings:     Vec<RatingEntry>,
}

pub const NO_STATS_MESSAGE: &str =
  "No stats available for the given ID or stats list is empty";

/// Result of [`post_rating`]. A post without stat rows is a successful,
/// uncached outcome rather than an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostRatingOutcome {
  Rated(PostRating),
  NoStats { response: String },
}

impl PostRatingOutcome {
  pub fn no_stats() -> Self {
    Self::NoStats { response: NO_STATS_MESSAGE.to_owned() }
  }

  pub fn is_rated(&self) -> bool { matches!(self, Self::Rated(_)) }
}

/// A user's mean rating across everything they own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRating {
  pub user_id:               String,
  pub user_rating:           f64,
  pub article_ratings:       Vec<RatingEntry>,
  pub topic_ratings:         Vec<RatingEntry>,
  pub advertisement_ratings: Vec<RatingEntry>,
}

fn best_first(a: &RatingEntry, b: &RatingEntry) -> Ordering {
  b.rating
    .partial_cmp(&a.rating)
    .unwrap_or(Ordering::Equal)
    .then_with(|| a.id.cmp(&b.id))
}

fn entry(totals: &PostTotals, max: &MaxStats) -> RatingEntry {
  RatingEntry {
    id:     totals.post.id.clone(),
    rating: calculate_rating(&totals.totals, max),
  }
}

async fn max_stats<S: StatsStore>(store: &S) -> Result<MaxStats> {
  let observed = store.max_counters().await.map_err(Error::store)?;
  Ok(MaxStats::from_observed(observed))
}

// ─── Operations ──────────────────────────────────────────────────────────────

/// Rate the post `id` and list the rating of every post of its kind.
///
/// Cached under `postRating:<id>` for [`RATING_TTL`]; the "no stats" outcome
/// is never cached.
pub async fn post_rating<S: StatsStore>(
  store: &S,
  cache: &dyn JsonCache,
  id: &str,
) -> Result<PostRatingOutcome> {
  if id.trim().is_empty() {
    return Err(Error::Validation("ID is required".into()));
  }

  CacheAside::new(cache, post_rating_key(id), RATING_TTL)
    .admit(PostRatingOutcome::is_rated)
    .get_or_compute(|| compute_post_rating(store, id))
    .await
}

async fn compute_post_rating<S: StatsStore>(
  store: &S,
  id: &str,
) -> Result<PostRatingOutcome> {
  let post = resolve_post(store, id).await?;

  let rows = store.stats_for_post(&post).await.map_err(Error::store)?;
  if rows.is_empty() {
    debug!(%post, "no stat rows; skipping rating");
    return Ok(PostRatingOutcome::no_stats());
  }

  let max = max_stats(store).await?;
  let totals: EngagementCounters = rows.iter().map(|r| &r.counters).sum();
  let post_rating = calculate_rating(&totals, &max);

  let mut ratings: Vec<RatingEntry> = store
    .post_totals(post.kind)
    .await
    .map_err(Error::store)?
    .iter()
    .filter(|t| t.rows > 0)
    .map(|t| entry(t, &max))
    .collect();
  ratings.sort_by(best_first);

  Ok(PostRatingOutcome::Rated(PostRating {
    id: post.id,
    kind: post.kind,
    post_rating,
    ratings,
  }))
}

/// The mean rating of every post `user_id` owns (0 if they own none), with
/// per-kind listings. Cached under `userRating:<user_id>` for [`RATING_TTL`].
pub async fn user_rating<S: StatsStore>(
  store: &S,
  cache: &dyn JsonCache,
  user_id: &str,
) -> Result<UserRating> {
  if user_id.trim().is_empty() {
    return Err(Error::Validation("User ID is required".into()));
  }

  CacheAside::new(cache, user_rating_key(user_id), RATING_TTL)
    .get_or_compute(|| compute_user_rating(store, user_id))
    .await
}

async fn compute_user_rating<S: StatsStore>(store: &S, user_id: &str) -> Result<UserRating> {
  store
    .get_user(user_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound("User not found".into()))?;

  let owned = store.owned_post_totals(user_id).await.map_err(Error::store)?;
  let max = max_stats(store).await?;

  let mut rating = UserRating {
    user_id:               user_id.to_owned(),
    user_rating:           0.0,
    article_ratings:       Vec::new(),
    topic_ratings:         Vec::new(),
    advertisement_ratings: Vec::new(),
  };

  for totals in &owned {
    let e = entry(totals, &max);
    rating.user_rating += e.rating;
    match totals.post.kind {
      PostKind::Article => rating.article_ratings.push(e),
      PostKind::Topic => rating.topic_ratings.push(e),
      PostKind::Advertisement => rating.advertisement_ratings.push(e),
    }
  }

  if !owned.is_empty() {
    rating.user_rating /= owned.len() as f64;
  }
  for list in [
    &mut rating.article_ratings,
    &mut rating.topic_ratings,
    &mut rating.advertisement_ratings,
  ] {
    list.sort_by(best_first);
  }

  Ok(rating)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn counters(c: u64, k: u64, m: u64, s: u64, t: u64) -> EngagementCounters {
    EngagementCounters {
      clicks:          c,
      keypresses:      k,
      mouse_movements: m,
      scrolls:         s,
      total_time:      t,
    }
  }

  fn max(c: u64, k: u64, m: u64, s: u64, t: u64) -> MaxStats {
    MaxStats::from_observed(counters(c, k, m, s, t))
  }

  #[test]
  fn all_zero_rates_zero() {
    let m = max(10, 10, 10, 10, 10);
    assert_eq!(calculate_rating(&EngagementCounters::default(), &m), 0.0);
  }

  #[test]
  fn every_counter_at_its_maximum_rates_100() {
    let c = counters(3, 40, 500, 6, 7000);
    assert_eq!(calculate_rating(&c, &MaxStats::from_observed(c)), 100.0);
  }

  #[test]
  fn single_populated_counter_is_its_ratio() {
    let m = max(10, 10, 10, 10, 10);
    assert_eq!(calculate_rating(&counters(10, 0, 0, 0, 0), &m), 100.0);
    assert_eq!(calculate_rating(&counters(0, 0, 0, 5, 0), &m), 50.0);
  }

  #[test]
  fn averages_only_populated_counters() {
    let m = max(10, 100, 1, 1, 1);
    // (5/10 + 25/100) / 2 = 0.375
    assert_eq!(calculate_rating(&counters(5, 25, 0, 0, 0), &m), 37.5);
  }

  #[test]
  fn zero_maxima_become_one() {
    let m = MaxStats::from_observed(EngagementCounters::default());
    assert_eq!(*m.counters(), counters(1, 1, 1, 1, 1));
    // A value above a floored maximum is clamped.
    assert_eq!(calculate_rating(&counters(4, 0, 0, 0, 0), &m), 100.0);
  }

  #[test]
  fn clamps_values_above_the_recorded_maximum() {
    let m = max(10, 10, 10, 10, 10);
    let r = calculate_rating(&counters(1000, 30, 20, 10, 50), &m);
    assert_eq!(r, 100.0);
  }

  #[test]
  fn stays_within_bounds() {
    let m = max(7, 13, 1, 100, 3);
    for c in 0..20 {
      for t in 0..20 {
        let r = calculate_rating(&counters(c, 1, 0, c * 3, t), &m);
        assert!((0.0..=100.0).contains(&r), "rating {r} out of range");
      }
    }
  }

  #[test]
  fn monotonic_in_each_populated_counter() {
    let m = max(50, 50, 50, 50, 50);
    let base = counters(5, 5, 5, 5, 5);
    let bumps: [fn(&mut EngagementCounters); 5] = [
      |c| c.clicks += 1,
      |c| c.keypresses += 1,
      |c| c.mouse_movements += 1,
      |c| c.scrolls += 1,
      |c| c.total_time += 1,
    ];
    for bump in bumps {
      let mut current = base;
      let mut previous = calculate_rating(&current, &m);
      for _ in 0..60 {
        bump(&mut current);
        let next = calculate_rating(&current, &m);
        assert!(next >= previous, "{next} < {previous}");
        previous = next;
      }
    }
  }

  #[test]
  fn listing_is_best_first_then_by_id() {
    let mut entries = vec![
      RatingEntry { id: "b".into(), rating: 10.0 },
      RatingEntry { id: "c".into(), rating: 80.0 },
      RatingEntry { id: "a".into(), rating: 10.0 },
    ];
    entries.sort_by(best_first);
    let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["c", "a", "b"]);
  }

  #[test]
  fn outcomes_round_trip_through_the_cache_format() {
    let rated = PostRatingOutcome::Rated(PostRating {
      id:          "a1".into(),
      kind:        PostKind::Article,
      post_rating: 42.0,
      ratings:     vec![RatingEntry { id: "a1".into(), rating: 42.0 }],
    });
    let json = serde_json::to_value(&rated).unwrap();
    assert_eq!(json["postRating"], 42.0);
    assert_eq!(serde_json::from_value::<PostRatingOutcome>(json).unwrap(), rated);

    let json = serde_json::to_value(PostRatingOutcome::no_stats()).unwrap();
    assert_eq!(json["response"], NO_STATS_MESSAGE);
    assert!(!serde_json::from_value::<PostRatingOutcome>(json).unwrap().is_rated());
  }
}
