//! Table definitions, applied idempotently on every connect.
//!
//! UUIDs are stored as 16-byte BLOBs, timestamps as RFC 3339 TEXT in UTC so
//! that range comparisons on the raw column are chronological.

pub(crate) const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS topics (
        id   BLOB PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS users (
        id        BLOB PRIMARY KEY,
        username  TEXT NOT NULL UNIQUE,
        full_name TEXT
    )",
    "CREATE TABLE IF NOT EXISTS user_topics (
        user_id  BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        topic_id BLOB NOT NULL REFERENCES topics(id) ON DELETE CASCADE,
        PRIMARY KEY (user_id, topic_id)
    )",
    "CREATE TABLE IF NOT EXISTS posts (
        id             BLOB PRIMARY KEY,
        author_id      BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        topic_id       BLOB REFERENCES topics(id) ON DELETE SET NULL,
        title          TEXT NOT NULL,
        content        TEXT NOT NULL,
        status         TEXT NOT NULL CHECK (status IN ('draft', 'published')),
        views          INTEGER NOT NULL DEFAULT 0 CHECK (views >= 0),
        comments_count INTEGER NOT NULL DEFAULT 0 CHECK (comments_count >= 0),
        saved_count    INTEGER NOT NULL DEFAULT 0 CHECK (saved_count >= 0),
        created_at     TEXT NOT NULL,
        updated_at     TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id)",
    "CREATE INDEX IF NOT EXISTS idx_posts_status_created ON posts(status, created_at)",
    "CREATE TABLE IF NOT EXISTS comments (
        id         BLOB PRIMARY KEY,
        author_id  BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        post_id    BLOB NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        content    TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id)",
    "CREATE INDEX IF NOT EXISTS idx_comments_author ON comments(author_id)",
    "CREATE TABLE IF NOT EXISTS saved_posts (
        user_id  BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        post_id  BLOB NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        saved_at TEXT NOT NULL,
        PRIMARY KEY (user_id, post_id)
    )",
    "CREATE TABLE IF NOT EXISTS post_views (
        id        INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id   BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        post_id   BLOB NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        viewed_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_post_views_user_time ON post_views(user_id, viewed_at)",
];
