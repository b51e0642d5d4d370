//! [`SqliteStore`], the SQLite implementation of [`StatsStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _};
use tracing::debug;
use uuid::Uuid;

use fanalyzer_core::{
  engagement::{EngagementCounters, EngagementStat, NewEngagement, PostTotals, StatUpsert},
  post::{
    Advertisement, Article, ArticleFilter, NewAdvertisement, NewArticle, NewTopic,
    PostKind, PostRef, Topic,
  },
  social::{
    Comment, LocatedReaction, NewComment, NewShare, ReactionChange, ReactionInput,
    Share,
  },
  store::StatsStore,
  user::{LocationCount, NewUser, User, UserPatch},
};

use crate::{
  encode::{
    decode_counter, decode_counters, encode_categories, encode_counter, encode_dt,
    encode_kind, encode_uuid, post_table, RawAdvertisement, RawArticle, RawStat,
    RawTopic, RawTotals, RawUser, AD_COLUMNS, ARTICLE_COLUMNS, STAT_COLUMNS,
    TOPIC_COLUMNS, USER_COLUMNS,
  },
  schema::{POST_CHILD_TABLES, SCHEMA},
  Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Fanalyzer stats store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    debug!("sqlite schema initialised");
    Ok(())
  }

  /// Comment and share locations share one query shape.
  async fn actor_locations(
    &self,
    table: &'static str,
    post: &PostRef,
  ) -> Result<Vec<Option<String>>> {
    let kind = encode_kind(post.kind);
    let id = post.id.clone();

    let locations = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT u.location FROM {table} t
             LEFT JOIN users u ON u.user_id = t.user_id
            WHERE t.post_kind = ?1 AND t.post_id = ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![kind, id], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<Option<String>>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(locations)
  }
}

// ─── Connection-thread helpers ───────────────────────────────────────────────

/// The `topic_id` column value for a row attached to `(kind, id)`.
fn row_topic_id(
  conn: &Connection,
  kind: PostKind,
  id: &str,
) -> rusqlite::Result<Option<String>> {
  match kind {
    PostKind::Topic => Ok(Some(id.to_owned())),
    PostKind::Advertisement => Ok(None),
    PostKind::Article => conn
      .query_row(
        "SELECT topic_id FROM articles WHERE article_id = ?1",
        rusqlite::params![id],
        |r| r.get(0),
      )
      .optional(),
  }
}

/// Remove every engagement and social row attached to `(kind, id)`.
fn delete_post_rows(conn: &Connection, kind: PostKind, id: &str) -> rusqlite::Result<()> {
  for table in POST_CHILD_TABLES {
    conn.execute(
      &format!("DELETE FROM {table} WHERE post_kind = ?1 AND post_id = ?2"),
      rusqlite::params![encode_kind(kind), id],
    )?;
  }
  Ok(())
}

/// Per-post summed counters for `kind`, optionally restricted to one owner.
/// Posts with no stat rows appear with zero totals and `rows = 0`.
fn query_totals(
  conn: &Connection,
  kind: PostKind,
  owner: Option<&str>,
) -> rusqlite::Result<Vec<RawTotals>> {
  let (table, key) = post_table(kind);
  let mut stmt = conn.prepare(&format!(
    "SELECT p.{key},
            COALESCE(SUM(s.clicks), 0),
            COALESCE(SUM(s.keypresses), 0),
            COALESCE(SUM(s.mouse_movements), 0),
            COALESCE(SUM(s.scrolls), 0),
            COALESCE(SUM(s.total_time), 0),
            COUNT(s.stat_id)
       FROM {table} p
       LEFT JOIN engagement_stats s
         ON s.post_kind = ?1 AND s.post_id = p.{key}
      WHERE ?2 IS NULL OR p.user_id = ?2
      GROUP BY p.{key}
      ORDER BY p.{key}"
  ))?;
  let rows = stmt
    .query_map(rusqlite::params![encode_kind(kind), owner], |row| {
      RawTotals::from_row(kind, row)
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

// ─── StatsStore impl ─────────────────────────────────────────────────────────

impl StatsStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, user: NewUser) -> Result<Option<User>> {
    let created_at = Utc::now();
    let at_str = encode_dt(created_at);
    let (id, location) = (user.user_id.clone(), user.location.clone());

    let inserted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "INSERT INTO users (user_id, location, created_at) VALUES (?1, ?2, ?3)
           ON CONFLICT (user_id) DO NOTHING",
          rusqlite::params![id, location, at_str],
        )?;
        Ok(n == 1)
      })
      .await?;

    Ok(inserted.then(|| User {
      user_id: user.user_id,
      location: user.location,
      profile: Default::default(),
      created_at,
    }))
  }

  async fn add_users(&self, users: Vec<NewUser>) -> Result<usize> {
    let at_str = encode_dt(Utc::now());

    let created = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut created = 0;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO users (user_id, location, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT (user_id) DO NOTHING",
          )?;
          for user in &users {
            created += stmt.execute(rusqlite::params![user.user_id, user.location, at_str])?;
          }
        }
        tx.commit()?;
        Ok(created)
      })
      .await?;

    Ok(created)
  }

  async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
    let id = user_id.to_owned();

    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
            rusqlite::params![id],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    let raws = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at, user_id"))?;
        let rows = stmt
          .query_map([], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn update_user(&self, user_id: &str, patch: UserPatch) -> Result<Option<User>> {
    let id = user_id.to_owned();
    let p = patch.profile;

    let updated = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE users SET
             location    = COALESCE(?2, location),
             name        = COALESCE(?3, name),
             bio         = COALESCE(?4, bio),
             image       = COALESCE(?5, image),
             facebook    = COALESCE(?6, facebook),
             instagram   = COALESCE(?7, instagram),
             linkedin    = COALESCE(?8, linkedin),
             twitter     = COALESCE(?9, twitter),
             eth_address = COALESCE(?10, eth_address)
           WHERE user_id = ?1",
          rusqlite::params![
            id,
            patch.location,
            p.name,
            p.bio,
            p.image,
            p.facebook,
            p.instagram,
            p.linkedin,
            p.twitter,
            p.eth_address,
          ],
        )?;
        Ok(n == 1)
      })
      .await?;

    if !updated {
      return Ok(None);
    }
    self.get_user(user_id).await
  }

  async fn delete_user(&self, user_id: &str) -> Result<Option<Vec<PostRef>>> {
    let id = user_id.to_owned();

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        // Rows on the user's posts, including articles filed under their
        // topics. Foreign keys only cascade through `user_id`, so rows left by
        // other users on these posts have to go explicitly.
        let mut owned: Vec<(PostKind, String)> = Vec::new();
        for (kind, sql) in [
          (PostKind::Topic, "SELECT topic_id FROM topics WHERE user_id = ?1"),
          (
            PostKind::Article,
            "SELECT article_id FROM articles WHERE user_id = ?1
              OR topic_id IN (SELECT topic_id FROM topics WHERE user_id = ?1)",
          ),
          (PostKind::Advertisement, "SELECT ad_id FROM advertisements WHERE user_id = ?1"),
        ] {
          let mut stmt = tx.prepare(sql)?;
          let ids = stmt
            .query_map(rusqlite::params![id], |r| r.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          owned.extend(ids.into_iter().map(|i| (kind, i)));
        }
        for (kind, post_id) in &owned {
          delete_post_rows(&tx, *kind, post_id)?;
        }

        let n = tx.execute("DELETE FROM users WHERE user_id = ?1", rusqlite::params![id])?;
        tx.commit()?;
        if n == 0 {
          return Ok(None);
        }
        let posts: Vec<PostRef> =
          owned.into_iter().map(|(kind, post_id)| PostRef::new(kind, post_id)).collect();
        Ok(Some(posts))
      })
      .await?;

    if let Some(posts) = &deleted {
      debug!(user_id, posts = posts.len(), "user deleted with owned posts");
    }
    Ok(deleted)
  }

  async fn clear(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(
          "BEGIN;
           DELETE FROM engagement_stats;
           DELETE FROM comments;
           DELETE FROM reactions;
           DELETE FROM shares;
           DELETE FROM articles;
           DELETE FROM topics;
           DELETE FROM advertisements;
           DELETE FROM users;
           COMMIT;",
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn count_users_by_location(&self) -> Result<Vec<LocationCount>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT location, COUNT(*) FROM users
            WHERE location IS NOT NULL
            GROUP BY location ORDER BY location",
        )?;
        let rows = stmt
          .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(location, users)| {
        Ok(LocationCount { location, users: decode_counter(users)? })
      })
      .collect()
  }

  // ── Posts ─────────────────────────────────────────────────────────────────

  async fn post_exists(&self, post: &PostRef) -> Result<bool> {
    let (table, key) = post_table(post.kind);
    let id = post.id.clone();

    let exists = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT 1 FROM {table} WHERE {key} = ?1"),
            rusqlite::params![id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false))
      })
      .await?;

    Ok(exists)
  }

  async fn add_topic(&self, input: NewTopic) -> Result<Topic> {
    let topic = Topic {
      topic_id:   input.topic_id,
      user_id:    input.user_id,
      title:      input.title,
      content:    input.content,
      categories: input.categories,
      created_at: Utc::now(),
    };

    let id_str     = topic.topic_id.clone();
    let user_str   = topic.user_id.clone();
    let title      = topic.title.clone();
    let content    = topic.content.clone();
    let categories = encode_categories(&topic.categories)?;
    let at_str     = encode_dt(topic.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!("INSERT INTO topics ({TOPIC_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
          rusqlite::params![id_str, user_str, title, content, categories, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(topic)
  }

  async fn add_article(&self, input: NewArticle) -> Result<Article> {
    let article = Article {
      article_id: input.article_id,
      user_id:    input.user_id,
      topic_id:   input.topic_id,
      title:      input.title,
      content:    input.content,
      created_at: Utc::now(),
    };

    let id_str    = article.article_id.clone();
    let user_str  = article.user_id.clone();
    let topic_str = article.topic_id.clone();
    let title     = article.title.clone();
    let content   = article.content.clone();
    let at_str    = encode_dt(article.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!("INSERT INTO articles ({ARTICLE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
          rusqlite::params![id_str, user_str, topic_str, title, content, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(article)
  }

  async fn add_advertisement(&self, input: NewAdvertisement) -> Result<Advertisement> {
    let ad = Advertisement {
      ad_id:      input.ad_id,
      user_id:    input.user_id,
      title:      input.title,
      content:    input.content,
      budget:     input.budget,
      duration:   input.duration,
      created_at: Utc::now(),
    };

    let id_str   = ad.ad_id.clone();
    let user_str = ad.user_id.clone();
    let title    = ad.title.clone();
    let content  = ad.content.clone();
    let budget   = ad.budget;
    let duration = ad.duration.clone();
    let at_str   = encode_dt(ad.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO advertisements ({AD_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
          ),
          rusqlite::params![id_str, user_str, title, content, budget, duration, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(ad)
  }

  async fn get_topic(&self, topic_id: &str) -> Result<Option<Topic>> {
    let id = topic_id.to_owned();

    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {TOPIC_COLUMNS} FROM topics WHERE topic_id = ?1"),
            rusqlite::params![id],
            RawTopic::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawTopic::into_topic).transpose()
  }

  async fn get_article(&self, article_id: &str) -> Result<Option<Article>> {
    let id = article_id.to_owned();

    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE article_id = ?1"),
            rusqlite::params![id],
            RawArticle::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawArticle::into_article).transpose()
  }

  async fn get_advertisement(&self, ad_id: &str) -> Result<Option<Advertisement>> {
    let id = ad_id.to_owned();

    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {AD_COLUMNS} FROM advertisements WHERE ad_id = ?1"),
            rusqlite::params![id],
            RawAdvertisement::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawAdvertisement::into_advertisement).transpose()
  }

  async fn list_topics(&self, user_id: Option<&str>) -> Result<Vec<Topic>> {
    let owner = user_id.map(str::to_owned);

    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {TOPIC_COLUMNS} FROM topics
            WHERE ?1 IS NULL OR user_id = ?1
            ORDER BY created_at, topic_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner], RawTopic::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTopic::into_topic).collect()
  }

  async fn list_articles(&self, filter: &ArticleFilter) -> Result<Vec<Article>> {
    let (topic, owner) = (filter.topic_id.clone(), filter.user_id.clone());

    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ARTICLE_COLUMNS} FROM articles
            WHERE (?1 IS NULL OR topic_id = ?1)
              AND (?2 IS NULL OR user_id = ?2)
            ORDER BY created_at, article_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![topic, owner], RawArticle::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawArticle::into_article).collect()
  }

  async fn list_advertisements(&self, user_id: Option<&str>) -> Result<Vec<Advertisement>> {
    let owner = user_id.map(str::to_owned);

    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {AD_COLUMNS} FROM advertisements
            WHERE ?1 IS NULL OR user_id = ?1
            ORDER BY created_at, ad_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner], RawAdvertisement::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAdvertisement::into_advertisement).collect()
  }

  async fn delete_article(&self, article_id: &str) -> Result<bool> {
    let id = article_id.to_owned();

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        delete_post_rows(&tx, PostKind::Article, &id)?;
        let n =
          tx.execute("DELETE FROM articles WHERE article_id = ?1", rusqlite::params![id])?;
        tx.commit()?;
        Ok(n == 1)
      })
      .await?;

    Ok(deleted)
  }

  // ── Engagement ────────────────────────────────────────────────────────────

  async fn record_engagement(&self, input: NewEngagement) -> Result<StatUpsert> {
    let now = encode_dt(Utc::now());
    let kind = input.post.kind;
    let (user_id, post_id) = (input.user_id, input.post.id);
    let c = input.counters;
    let counters = [
      encode_counter(c.clicks),
      encode_counter(c.keypresses),
      encode_counter(c.mouse_movements),
      encode_counter(c.scrolls),
      encode_counter(c.total_time),
    ];

    let upsert = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existing: Option<i64> = tx
          .query_row(
            "SELECT stat_id FROM engagement_stats
              WHERE user_id = ?1 AND post_kind = ?2 AND post_id = ?3",
            rusqlite::params![user_id, encode_kind(kind), post_id],
            |r| r.get(0),
          )
          .optional()?;
        let topic_id = row_topic_id(&tx, kind, &post_id)?;

        // The increment happens inside SQLite, so concurrent submissions for
        // the same pair are serialised by the write lock rather than racing
        // on a read-modify-write in Rust.
        tx.execute(
          "INSERT INTO engagement_stats
             (user_id, post_kind, post_id, topic_id,
              clicks, keypresses, mouse_movements, scrolls, total_time,
              created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
           ON CONFLICT (user_id, post_kind, post_id) DO UPDATE SET
             clicks          = clicks          + excluded.clicks,
             keypresses      = keypresses      + excluded.keypresses,
             mouse_movements = mouse_movements + excluded.mouse_movements,
             scrolls         = scrolls         + excluded.scrolls,
             total_time      = total_time      + excluded.total_time,
             updated_at      = excluded.updated_at",
          rusqlite::params![
            user_id,
            encode_kind(kind),
            post_id,
            topic_id,
            counters[0],
            counters[1],
            counters[2],
            counters[3],
            counters[4],
            now,
          ],
        )?;

        let stat_id = match existing {
          Some(id) => id,
          None => tx.last_insert_rowid(),
        };
        tx.commit()?;
        Ok(StatUpsert { stat_id, created: existing.is_none() })
      })
      .await?;

    debug!(stat_id = upsert.stat_id, created = upsert.created, %kind, "engagement upserted");
    Ok(upsert)
  }

  async fn list_stats(&self) -> Result<Vec<EngagementStat>> {
    let raws = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare(&format!("SELECT {STAT_COLUMNS} FROM engagement_stats ORDER BY stat_id"))?;
        let rows = stmt
          .query_map([], RawStat::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStat::into_stat).collect()
  }

  async fn stats_for_post(&self, post: &PostRef) -> Result<Vec<EngagementStat>> {
    let kind = encode_kind(post.kind);
    let id = post.id.clone();

    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {STAT_COLUMNS} FROM engagement_stats
            WHERE post_kind = ?1 AND post_id = ?2
            ORDER BY stat_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![kind, id], RawStat::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStat::into_stat).collect()
  }

  async fn max_counters(&self) -> Result<EngagementCounters> {
    let raw: [i64; 5] = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT COALESCE(MAX(clicks), 0),
                  COALESCE(MAX(keypresses), 0),
                  COALESCE(MAX(mouse_movements), 0),
                  COALESCE(MAX(scrolls), 0),
                  COALESCE(MAX(total_time), 0)
             FROM engagement_stats",
          [],
          |r| Ok([r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?]),
        )?)
      })
      .await?;

    decode_counters(raw)
  }

  async fn post_totals(&self, kind: PostKind) -> Result<Vec<PostTotals>> {
    let raws = self
      .conn
      .call(move |conn| Ok(query_totals(conn, kind, None)?))
      .await?;

    raws.into_iter().map(RawTotals::into_totals).collect()
  }

  async fn owned_post_totals(&self, user_id: &str) -> Result<Vec<PostTotals>> {
    let owner = user_id.to_owned();

    let raws = self
      .conn
      .call(move |conn| {
        let mut all = Vec::new();
        for kind in PostKind::PROBE_ORDER {
          all.extend(query_totals(conn, kind, Some(&owner))?);
        }
        Ok(all)
      })
      .await?;

    raws.into_iter().map(RawTotals::into_totals).collect()
  }

  // ── Social ────────────────────────────────────────────────────────────────

  async fn add_comment(&self, input: NewComment) -> Result<Comment> {
    let comment_id = Uuid::new_v4();
    let created_at = Utc::now();

    let params = (
      encode_uuid(comment_id),
      input.user_id.clone(),
      input.post.kind,
      input.post.id.clone(),
      input.content.clone(),
      encode_dt(created_at),
    );

    let topic_id = self
      .conn
      .call(move |conn| {
        let (id, user, kind, post_id, content, at) = params;
        let topic_id = row_topic_id(conn, kind, &post_id)?;
        conn.execute(
          "INSERT INTO comments
             (comment_id, user_id, post_kind, post_id, topic_id, content, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id, user, encode_kind(kind), post_id, topic_id, content, at],
        )?;
        Ok(topic_id)
      })
      .await?;

    Ok(Comment {
      comment_id,
      user_id: input.user_id,
      post: input.post,
      topic_id,
      content: input.content,
      created_at,
    })
  }

  async fn comment_locations(&self, post: &PostRef) -> Result<Vec<Option<String>>> {
    self.actor_locations("comments", post).await
  }

  async fn set_reaction(&self, input: ReactionInput) -> Result<ReactionChange> {
    let now = encode_dt(Utc::now());
    let new_id = encode_uuid(Uuid::new_v4());
    let kind = input.post.kind;
    let (user_id, post_id, is_like) = (input.user_id, input.post.id, input.is_like);

    let change = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existing: Option<String> = tx
          .query_row(
            "SELECT reaction_id FROM reactions
              WHERE user_id = ?1 AND post_kind = ?2 AND post_id = ?3",
            rusqlite::params![user_id, encode_kind(kind), post_id],
            |r| r.get(0),
          )
          .optional()?;

        let change = match (existing, is_like) {
          (None, None) => ReactionChange::NothingToRemove,
          (Some(id), None) => {
            tx.execute("DELETE FROM reactions WHERE reaction_id = ?1", rusqlite::params![id])?;
            ReactionChange::Removed
          }
          (Some(id), Some(like)) => {
            tx.execute(
              "UPDATE reactions SET is_like = ?2, updated_at = ?3 WHERE reaction_id = ?1",
              rusqlite::params![id, like, now],
            )?;
            ReactionChange::Updated
          }
          (None, Some(like)) => {
            let topic_id = row_topic_id(&tx, kind, &post_id)?;
            tx.execute(
              "INSERT INTO reactions
                 (reaction_id, user_id, post_kind, post_id, topic_id, is_like,
                  created_at, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
              rusqlite::params![new_id, user_id, encode_kind(kind), post_id, topic_id, like, now],
            )?;
            ReactionChange::Added
          }
        };

        tx.commit()?;
        Ok(change)
      })
      .await?;

    Ok(change)
  }

  async fn count_reactions(&self, post: &PostRef, is_like: bool) -> Result<u64> {
    let kind = encode_kind(post.kind);
    let id = post.id.clone();

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM reactions
            WHERE post_kind = ?1 AND post_id = ?2 AND is_like = ?3",
          rusqlite::params![kind, id, is_like],
          |r| r.get(0),
        )?)
      })
      .await?;

    decode_counter(count)
  }

  async fn reaction_locations(&self, post: &PostRef) -> Result<Vec<LocatedReaction>> {
    let kind = encode_kind(post.kind);
    let id = post.id.clone();

    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT u.location, r.is_like FROM reactions r
             LEFT JOIN users u ON u.user_id = r.user_id
            WHERE r.post_kind = ?1 AND r.post_id = ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![kind, id], |r| {
            Ok(LocatedReaction { location: r.get(0)?, is_like: r.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows)
  }

  async fn add_share(&self, input: NewShare) -> Result<Share> {
    let share_id = Uuid::new_v4();
    let created_at = Utc::now();

    let params = (
      encode_uuid(share_id),
      input.user_id.clone(),
      input.post.kind,
      input.post.id.clone(),
      input.social_media.clone(),
      encode_dt(created_at),
    );

    self
      .conn
      .call(move |conn| {
        let (id, user, kind, post_id, social_media, at) = params;
        let topic_id = row_topic_id(conn, kind, &post_id)?;
        conn.execute(
          "INSERT INTO shares
             (share_id, user_id, post_kind, post_id, topic_id, social_media, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id, user, encode_kind(kind), post_id, topic_id, social_media, at],
        )?;
        Ok(())
      })
      .await?;

    Ok(Share {
      share_id,
      user_id: input.user_id,
      post: input.post,
      social_media: input.social_media,
      created_at,
    })
  }

  async fn share_locations(&self, post: &PostRef) -> Result<Vec<Option<String>>> {
    self.actor_locations("shares", post).await
  }
}
