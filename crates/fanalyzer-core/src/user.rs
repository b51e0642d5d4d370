//! Users: identified by an opaque string id.
//!
//! `location` is the country or region code every geographic aggregate is
//! keyed by.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Optional public profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
  pub name:        Option<String>,
  pub bio:         Option<String>,
  pub image:       Option<String>,
  pub facebook:    Option<String>,
  pub instagram:   Option<String>,
  pub linkedin:    Option<String>,
  pub twitter:     Option<String>,
  #[serde(rename = "ethAddress", alias = "eth_address")]
  pub eth_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:    String,
  pub location:   Option<String>,
  #[serde(flatten)]
  pub profile:    UserProfile,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::StatsStore::add_user`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
  pub user_id:  String,
  pub location: Option<String>,
}

/// A partial update. `None` fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
  pub location: Option<String>,
  #[serde(flatten)]
  pub profile:  UserProfile,
}

/// One row of the users-per-location breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationCount {
  pub location: String,
  pub users:    u64,
}
