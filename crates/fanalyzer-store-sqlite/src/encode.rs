//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, topic categories a compact JSON array and
//! UUIDs hyphenated lowercase strings. Counters are stored as `INTEGER` and
//! guarded non-negative by `CHECK` constraints.

use chrono::{DateTime, Utc};
use fanalyzer_core::{
  engagement::{EngagementCounters, EngagementStat, PostTotals},
  post::{Advertisement, Article, PostKind, PostRef, Topic},
  user::{User, UserProfile},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── PostKind ────────────────────────────────────────────────────────────────

pub fn encode_kind(k: PostKind) -> &'static str { k.as_str() }

pub fn decode_kind(s: &str) -> Result<PostKind> {
  match s {
    "article" => Ok(PostKind::Article),
    "topic" => Ok(PostKind::Topic),
    "advertisement" => Ok(PostKind::Advertisement),
    other => Err(Error::Decode(format!("unknown post kind: {other:?}"))),
  }
}

/// `(table, primary key column)` holding posts of kind `k`.
pub fn post_table(k: PostKind) -> (&'static str, &'static str) {
  match k {
    PostKind::Article => ("articles", "article_id"),
    PostKind::Topic => ("topics", "topic_id"),
    PostKind::Advertisement => ("advertisements", "ad_id"),
  }
}

// ─── Counters ────────────────────────────────────────────────────────────────

/// SQLite integers are signed; values past `i64::MAX` saturate.
pub fn encode_counter(v: u64) -> i64 { i64::try_from(v).unwrap_or(i64::MAX) }

pub fn decode_counter(v: i64) -> Result<u64> {
  u64::try_from(v).map_err(|_| Error::Decode(format!("negative counter: {v}")))
}

pub fn decode_counters(raw: [i64; 5]) -> Result<EngagementCounters> {
  let [clicks, keypresses, mouse_movements, scrolls, total_time] = raw;
  Ok(EngagementCounters {
    clicks:          decode_counter(clicks)?,
    keypresses:      decode_counter(keypresses)?,
    mouse_movements: decode_counter(mouse_movements)?,
    scrolls:         decode_counter(scrolls)?,
    total_time:      decode_counter(total_time)?,
  })
}

// ─── Categories ──────────────────────────────────────────────────────────────

pub fn encode_categories(c: &[String]) -> Result<String> {
  Ok(serde_json::to_string(c)?)
}

pub fn decode_categories(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Raw rows ────────────────────────────────────────────────────────────────
//
// Rows are read into these plain structs inside the connection thread and
// decoded into domain types afterwards, so decode failures surface as
// `crate::Error` rather than being squeezed into `rusqlite::Error`.

pub const USER_COLUMNS: &str = "user_id, location, name, bio, image, facebook, \
                                instagram, linkedin, twitter, eth_address, \
                                created_at";

pub struct RawUser {
  pub user_id:    String,
  pub location:   Option<String>,
  pub profile:    UserProfile,
  pub created_at: String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(0)?,
      location:   row.get(1)?,
      profile:    UserProfile {
        name:        row.get(2)?,
        bio:         row.get(3)?,
        image:       row.get(4)?,
        facebook:    row.get(5)?,
        instagram:   row.get(6)?,
        linkedin:    row.get(7)?,
        twitter:     row.get(8)?,
        eth_address: row.get(9)?,
      },
      created_at: row.get(10)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    self.user_id,
      location:   self.location,
      profile:    self.profile,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const TOPIC_COLUMNS: &str =
  "topic_id, user_id, title, content, categories, created_at";

pub struct RawTopic {
  pub topic_id:   String,
  pub user_id:    String,
  pub title:      String,
  pub content:    String,
  pub categories: String,
  pub created_at: String,
}

impl RawTopic {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      topic_id:   row.get(0)?,
      user_id:    row.get(1)?,
      title:      row.get(2)?,
      content:    row.get(3)?,
      categories: row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_topic(self) -> Result<Topic> {
    Ok(Topic {
      topic_id:   self.topic_id,
      user_id:    self.user_id,
      title:      self.title,
      content:    self.content,
      categories: decode_categories(&self.categories)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const ARTICLE_COLUMNS: &str =
  "article_id, user_id, topic_id, title, content, created_at";

pub struct RawArticle {
  pub article_id: String,
  pub user_id:    String,
  pub topic_id:   String,
  pub title:      String,
  pub content:    String,
  pub created_at: String,
}

impl RawArticle {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      article_id: row.get(0)?,
      user_id:    row.get(1)?,
      topic_id:   row.get(2)?,
      title:      row.get(3)?,
      content:    row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_article(self) -> Result<Article> {
    Ok(Article {
      article_id: self.article_id,
      user_id:    self.user_id,
      topic_id:   self.topic_id,
      title:      self.title,
      content:    self.content,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const AD_COLUMNS: &str =
  "ad_id, user_id, title, content, budget, duration, created_at";

pub struct RawAdvertisement {
  pub ad_id:      String,
  pub user_id:    String,
  pub title:      String,
  pub content:    String,
  pub budget:     Option<f64>,
  pub duration:   Option<String>,
  pub created_at: String,
}

impl RawAdvertisement {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      ad_id:      row.get(0)?,
      user_id:    row.get(1)?,
      title:      row.get(2)?,
      content:    row.get(3)?,
      budget:     row.get(4)?,
      duration:   row.get(5)?,
      created_at: row.get(6)?,
    })
  }

  pub fn into_advertisement(self) -> Result<Advertisement> {
    Ok(Advertisement {
      ad_id:      self.ad_id,
      user_id:    self.user_id,
      title:      self.title,
      content:    self.content,
      budget:     self.budget,
      duration:   self.duration,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const STAT_COLUMNS: &str = "stat_id, user_id, post_kind, post_id, topic_id, \
                                clicks, keypresses, mouse_movements, scrolls, \
                                total_time, created_at, updated_at";

pub struct RawStat {
  pub stat_id:    i64,
  pub user_id:    String,
  pub post_kind:  String,
  pub post_id:    String,
  pub topic_id:   Option<String>,
  pub counters:   [i64; 5],
  pub created_at: String,
  pub updated_at: String,
}

impl RawStat {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      stat_id:    row.get(0)?,
      user_id:    row.get(1)?,
      post_kind:  row.get(2)?,
      post_id:    row.get(3)?,
      topic_id:   row.get(4)?,
      counters:   [
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
      ],
      created_at: row.get(10)?,
      updated_at: row.get(11)?,
    })
  }

  pub fn into_stat(self) -> Result<EngagementStat> {
    Ok(EngagementStat {
      stat_id:    self.stat_id,
      user_id:    self.user_id,
      post:       PostRef::new(decode_kind(&self.post_kind)?, self.post_id),
      topic_id:   self.topic_id,
      counters:   decode_counters(self.counters)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// One row of a per-post `SUM(...)` rollup.
pub struct RawTotals {
  pub kind:   PostKind,
  pub id:     String,
  pub totals: [i64; 5],
  pub rows:   i64,
}

impl RawTotals {
  /// Columns: `id, sum(clicks) .. sum(total_time), count(rows)`.
  pub fn from_row(kind: PostKind, row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      kind,
      id: row.get(0)?,
      totals: [
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
      ],
      rows: row.get(6)?,
    })
  }

  pub fn into_totals(self) -> Result<PostTotals> {
    Ok(PostTotals {
      post:   PostRef::new(self.kind, self.id),
      totals: decode_counters(self.totals)?,
      rows:   decode_counter(self.rows)?,
    })
  }
}
