//! SQL schema for the Fanalyzer SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.
//!
//! Engagement and social rows address their post polymorphically through
//! `(post_kind, post_id)`. `topic_id` holds the parent topic of article rows
//! and the topic itself for topic rows, so topic rollups are a single filter.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    location    TEXT,            -- country / region code
    name        TEXT,
    bio         TEXT,
    image       TEXT,
    facebook    TEXT,
    instagram   TEXT,
    linkedin    TEXT,
    twitter     TEXT,
    eth_address TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS topics (
    topic_id    TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    title       TEXT NOT NULL,
    content     TEXT NOT NULL,
    categories  TEXT NOT NULL DEFAULT '[]',   -- JSON array of strings
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS articles (
    article_id  TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    topic_id    TEXT NOT NULL REFERENCES topics(topic_id) ON DELETE CASCADE,
    title       TEXT NOT NULL,
    content     TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS advertisements (
    ad_id       TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    title       TEXT NOT NULL,
    content     TEXT NOT NULL,
    budget      REAL,
    duration    TEXT,
    created_at  TEXT NOT NULL
);

-- One row per (user, post); submissions increment the counters in place.
CREATE TABLE IF NOT EXISTS engagement_stats (
    stat_id         INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id         TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    post_kind       TEXT NOT NULL CHECK (post_kind IN ('article', 'topic', 'advertisement')),
    post_id         TEXT NOT NULL,
    topic_id        TEXT,
    clicks          INTEGER NOT NULL DEFAULT 0 CHECK (clicks >= 0),
    keypresses      INTEGER NOT NULL DEFAULT 0 CHECK (keypresses >= 0),
    mouse_movements INTEGER NOT NULL DEFAULT 0 CHECK (mouse_movements >= 0),
    scrolls         INTEGER NOT NULL DEFAULT 0 CHECK (scrolls >= 0),
    total_time      INTEGER NOT NULL DEFAULT 0 CHECK (total_time >= 0),
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    UNIQUE (user_id, post_kind, post_id)
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id  TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    post_kind   TEXT NOT NULL,
    post_id     TEXT NOT NULL,
    topic_id    TEXT,
    content     TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

-- At most one reaction per (user, post); clearing deletes the row.
CREATE TABLE IF NOT EXISTS reactions (
    reaction_id TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    post_kind   TEXT NOT NULL,
    post_id     TEXT NOT NULL,
    topic_id    TEXT,
    is_like     INTEGER NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    UNIQUE (user_id, post_kind, post_id)
);

CREATE TABLE IF NOT EXISTS shares (
    share_id     TEXT PRIMARY KEY,
    user_id      TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    post_kind    TEXT NOT NULL,
    post_id      TEXT NOT NULL,
    topic_id     TEXT,
    social_media TEXT,
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS stats_post_idx     ON engagement_stats(post_kind, post_id);
CREATE INDEX IF NOT EXISTS comments_post_idx  ON comments(post_kind, post_id);
CREATE INDEX IF NOT EXISTS reactions_post_idx ON reactions(post_kind, post_id);
CREATE INDEX IF NOT EXISTS shares_post_idx    ON shares(post_kind, post_id);
CREATE INDEX IF NOT EXISTS articles_topic_idx ON articles(topic_id);
CREATE INDEX IF NOT EXISTS users_location_idx ON users(location);

PRAGMA user_version = 1;
";

/// Tables whose rows hang off a post through `(post_kind, post_id)`.
pub const POST_CHILD_TABLES: [&str; 4] =
  ["engagement_stats", "comments", "reactions", "shares"];
