//! Geography: per-location aggregation of social activity, and the IP lookup
//! contract used by the trace endpoint.

use std::{collections::BTreeMap, net::IpAddr};

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  post::PostRef,
  resolve::resolve_post,
  social::LocatedReaction,
  store::StatsStore,
};

/// Maps a network address to an ISO 3166-1 alpha-2 country code.
pub trait GeoLocator: Send + Sync {
  fn country(&self, ip: IpAddr) -> Option<String>;

  /// Provider name, for logs.
  fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interactions {
  pub likes:    u64,
  pub dislikes: u64,
}

impl Interactions {
  fn record(&mut self, is_like: bool) {
    if is_like {
      self.likes += 1;
    } else {
      self.dislikes += 1;
    }
  }
}

/// Social activity on one post from users in one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationMetrics {
  pub location:     String,
  pub comments:     u64,
  pub interactions: Interactions,
  pub shares:       u64,
}

impl LocationMetrics {
  fn empty(location: String) -> Self {
    Self { location, comments: 0, interactions: Interactions::default(), shares: 0 }
  }
}

/// Fold comment, reaction and share locations into one entry per observed
/// location. Rows without a location are skipped. Output is ordered by
/// location.
pub fn aggregate(
  comments: &[Option<String>],
  reactions: &[LocatedReaction],
  shares: &[Option<String>],
) -> Vec<LocationMetrics> {
  let mut by_location: BTreeMap<String, LocationMetrics> = BTreeMap::new();

  for location in comments {
    if let Some(m) = slot(&mut by_location, location) {
      m.comments += 1;
    }
  }
  for reaction in reactions {
    if let Some(m) = slot(&mut by_location, &reaction.location) {
      m.interactions.record(reaction.is_like);
    }
  }
  for location in shares {
    if let Some(m) = slot(&mut by_location, location) {
      m.shares += 1;
    }
  }

  by_location.into_values().collect()
}

fn slot<'m>(
  by_location: &'m mut BTreeMap<String, LocationMetrics>,
  location: &Option<String>,
) -> Option<&'m mut LocationMetrics> {
  let location = location.as_ref()?;
  Some(
    by_location
      .entry(location.clone())
      .or_insert_with(|| LocationMetrics::empty(location.clone())),
  )
}

/// Count located rows per location, skipping rows without one.
pub fn count_by_location<'a>(
  locations: impl IntoIterator<Item = &'a Option<String>>,
) -> BTreeMap<String, u64> {
  let mut counts = BTreeMap::new();
  for location in locations.into_iter().flatten() {
    *counts.entry(location.clone()).or_insert(0) += 1;
  }
  counts
}

/// Likes and dislikes per location, skipping reactions without one.
pub fn reactions_by_location(reactions: &[LocatedReaction]) -> BTreeMap<String, Interactions> {
  let mut grouped: BTreeMap<String, Interactions> = BTreeMap::new();
  for reaction in reactions {
    if let Some(location) = &reaction.location {
      grouped.entry(location.clone()).or_default().record(reaction.is_like);
    }
  }
  grouped
}

/// Comments, reactions and shares on the post `id`, grouped by the acting
/// user's location. The three reads are issued concurrently.
pub async fn location_metrics<S: StatsStore>(
  store: &S,
  id: &str,
) -> Result<Vec<LocationMetrics>> {
  let post = resolve_post(store, id).await?;
  metrics_for(store, &post).await
}

async fn metrics_for<S: StatsStore>(store: &S, post: &PostRef) -> Result<Vec<LocationMetrics>> {
  let (comments, reactions, shares) = futures::try_join!(
    store.comment_locations(post),
    store.reaction_locations(post),
    store.share_locations(post),
  )
  .map_err(Error::store)?;

  Ok(aggregate(&comments, &reactions, &shares))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn loc(s: &str) -> Option<String> { Some(s.to_owned()) }

  fn reaction(location: Option<String>, is_like: bool) -> LocatedReaction {
    LocatedReaction { location, is_like }
  }

  #[test]
  fn comments_and_likes_land_in_separate_locations() {
    let out = aggregate(
      &[loc("US"), loc("US")],
      &[reaction(loc("CA"), true)],
      &[],
    );

    assert_eq!(out.len(), 2);
    assert!(out.contains(&LocationMetrics {
      location:     "US".into(),
      comments:     2,
      interactions: Interactions { likes: 0, dislikes: 0 },
      shares:       0,
    }));
    assert!(out.contains(&LocationMetrics {
      location:     "CA".into(),
      comments:     0,
      interactions: Interactions { likes: 1, dislikes: 0 },
      shares:       0,
    }));
  }

  #[test]
  fn rows_without_location_are_skipped() {
    let out = aggregate(
      &[None, loc("FR")],
      &[reaction(None, true), reaction(loc("FR"), false)],
      &[None],
    );
    assert_eq!(out, vec![LocationMetrics {
      location:     "FR".into(),
      comments:     1,
      interactions: Interactions { likes: 0, dislikes: 1 },
      shares:       0,
    }]);
  }

  #[test]
  fn shares_are_counted() {
    let out = aggregate(&[], &[], &[loc("DE"), loc("DE"), loc("PT")]);
    let de = out.iter().find(|m| m.location == "DE").unwrap();
    assert_eq!(de.shares, 2);
    assert_eq!(out.len(), 2);
  }

  #[test]
  fn empty_input_yields_empty_output() {
    assert!(aggregate(&[], &[], &[]).is_empty());
  }

  #[test]
  fn grouping_helpers() {
    let counts = count_by_location(&[loc("US"), None, loc("US"), loc("BR")]);
    assert_eq!(counts["US"], 2);
    assert_eq!(counts["BR"], 1);
    assert_eq!(counts.len(), 2);

    let grouped = reactions_by_location(&[
      reaction(loc("US"), true),
      reaction(loc("US"), false),
      reaction(loc("US"), true),
    ]);
    assert_eq!(grouped["US"], Interactions { likes: 2, dislikes: 1 });
  }
}
