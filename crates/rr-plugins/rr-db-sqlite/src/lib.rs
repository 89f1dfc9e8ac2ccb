//! # rr-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `rr-core` domain models, plus the write paths that keep the
//! denormalized post counters in step with the facts they count.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rr_core::filter::{Constraint, PostPredicate};
use rr_core::models::{
    AuthorTotals, Comment, Post, PostView, ReaderTotals, SavedPost, Topic, TopicCount, User,
};
use rr_core::traits::ContentStore;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use uuid::Uuid;

mod schema;

// SQLite caps bound parameters per statement (32766 since 3.32, 999 before).
const MAX_BOUND_IDS: usize = 900;

pub struct SqliteContentStore {
    pool: SqlitePool,
}

// Helper for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> anyhow::Result<Uuid> {
    Ok(Uuid::from_slice(blob)?)
}

fn uuid_column(row: &SqliteRow, column: &str) -> anyhow::Result<Uuid> {
    blob_to_uuid(&row.try_get::<Vec<u8>, _>(column)?)
}

fn counter_column(row: &SqliteRow, column: &str) -> anyhow::Result<u32> {
    Ok(u32::try_from(row.try_get::<i64, _>(column)?)?)
}

fn count_column(row: &SqliteRow, column: &str) -> anyhow::Result<u64> {
    Ok(u64::try_from(row.try_get::<i64, _>(column)?)?)
}

fn post_from_row(row: &SqliteRow) -> anyhow::Result<Post> {
    let topic_id: Option<Vec<u8>> = row.try_get("topic_id")?;
    let status: String = row.try_get("status")?;
    Ok(Post {
        id: uuid_column(row, "id")?,
        author_id: uuid_column(row, "author_id")?,
        topic_id: topic_id.as_deref().map(blob_to_uuid).transpose()?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        status: status.parse().map_err(anyhow::Error::msg)?,
        views: counter_column(row, "views")?,
        comments_count: counter_column(row, "comments_count")?,
        saved_count: counter_column(row, "saved_count")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn topic_count_from_row(row: &SqliteRow) -> anyhow::Result<TopicCount> {
    Ok(TopicCount {
        topic_id: uuid_column(row, "topic_id")?,
        topic_name: row.try_get("topic_name")?,
        count: count_column(row, "n")?,
    })
}

/// Appends one `AND` clause per constraint. Text constraints arrive lowercased.
///
/// SQLite's `lower()` only folds ASCII, so non-ASCII keywords match case-sensitively.
fn push_predicate(qb: &mut QueryBuilder<'_, Sqlite>, predicate: &PostPredicate) {
    for constraint in predicate.constraints() {
        match constraint {
            Constraint::Status(status) => {
                qb.push(" AND p.status = ").push_bind(status.as_str());
            }
            Constraint::Keyword(kw) => {
                qb.push(" AND (instr(lower(p.title), ")
                    .push_bind(kw.clone())
                    .push(") > 0 OR instr(lower(p.content), ")
                    .push_bind(kw.clone())
                    .push(") > 0)");
            }
            Constraint::Topic(topic_id) => {
                qb.push(" AND p.topic_id = ").push_bind(uuid_to_blob(*topic_id));
            }
            Constraint::AuthorName(name) => {
                qb.push(" AND instr(lower(coalesce(u.full_name, u.username)), ")
                    .push_bind(name.clone())
                    .push(") > 0");
            }
            Constraint::CreatedFrom(bound) => {
                qb.push(" AND p.created_at >= ").push_bind(*bound);
            }
            Constraint::CreatedBefore(bound) => {
                qb.push(" AND p.created_at < ").push_bind(*bound);
            }
            Constraint::MinViews(min) => {
                qb.push(" AND p.views >= ").push_bind(i64::from(*min));
            }
            Constraint::MinComments(min) => {
                qb.push(" AND p.comments_count >= ").push_bind(i64::from(*min));
            }
            Constraint::SavedBy(user_id) => {
                qb.push(" AND EXISTS (SELECT 1 FROM saved_posts sp WHERE sp.post_id = p.id AND sp.user_id = ")
                    .push_bind(uuid_to_blob(*user_id))
                    .push(")");
            }
        }
    }
}

impl SqliteContentStore {
    /// Opens (creating if needed) the database at `url` with a default pool size.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        Self::connect(url, 5).await
    }

    /// Opens the database and brings the schema up to date.
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to `:memory:` opens its own empty database, so
        // in-memory stores are pinned to one connection that never expires.
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<std::time::Duration>)
                .max_lifetime(None::<std::time::Duration>)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections)
                .connect_with(options)
                .await?
        };

        let store = Self { pool };
        store.migrate().await?;
        log::info!("SQLite content store ready at {url}");
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        for statement in schema::STATEMENTS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn create_topic(&self, topic: &Topic) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO topics (id, name) VALUES (?, ?)")
            .bind(uuid_to_blob(topic.id))
            .bind(&topic.name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Inserts a user together with their favorite topics.
    pub async fn create_user(&self, user: &User) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO users (id, username, full_name) VALUES (?, ?, ?)")
            .bind(uuid_to_blob(user.id))
            .bind(&user.username)
            .bind(&user.full_name)
            .execute(&mut *tx)
            .await?;

        for topic_id in &user.favorite_topics {
            sqlx::query("INSERT INTO user_topics (user_id, topic_id) VALUES (?, ?)")
                .bind(uuid_to_blob(user.id))
                .bind(uuid_to_blob(*topic_id))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn create_post(&self, post: &Post) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO posts (id, author_id, topic_id, title, content, status, views, comments_count, saved_count, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(post.id))
        .bind(uuid_to_blob(post.author_id))
        .bind(post.topic_id.map(uuid_to_blob))
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.status.as_str())
        .bind(i64::from(post.views))
        .bind(i64::from(post.comments_count))
        .bind(i64::from(post.saved_count))
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Stores a comment and bumps the post's comment counter atomically.
    pub async fn add_comment(&self, comment: &Comment) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO comments (id, author_id, post_id, content, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(uuid_to_blob(comment.id))
            .bind(uuid_to_blob(comment.author_id))
            .bind(uuid_to_blob(comment.post_id))
            .bind(&comment.content)
            .bind(comment.created_at)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE posts SET comments_count = comments_count + 1 WHERE id = ?")
            .bind(uuid_to_blob(comment.post_id))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Saves a post for a user. Returns `false` if it was already saved,
    /// in which case the counter is left untouched.
    pub async fn save_post(&self, saved: &SavedPost) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query("INSERT OR IGNORE INTO saved_posts (user_id, post_id, saved_at) VALUES (?, ?, ?)")
            .bind(uuid_to_blob(saved.user_id))
            .bind(uuid_to_blob(saved.post_id))
            .bind(saved.saved_at)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            == 1;

        if inserted {
            sqlx::query("UPDATE posts SET saved_count = saved_count + 1 WHERE id = ?")
                .bind(uuid_to_blob(saved.post_id))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// Removes a saved post. Returns `false` if it was not saved.
    pub async fn unsave_post(&self, user_id: Uuid, post_id: Uuid) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM saved_posts WHERE user_id = ? AND post_id = ?")
            .bind(uuid_to_blob(user_id))
            .bind(uuid_to_blob(post_id))
            .execute(&mut *tx)
            .await?
            .rows_affected()
            == 1;

        if removed {
            sqlx::query("UPDATE posts SET saved_count = saved_count - 1 WHERE id = ? AND saved_count > 0")
                .bind(uuid_to_blob(post_id))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(removed)
    }

    /// Logs one read of a post and bumps its view counter.
    pub async fn record_view(&self, view: &PostView) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO post_views (user_id, post_id, viewed_at) VALUES (?, ?, ?)")
            .bind(uuid_to_blob(view.user_id))
            .bind(uuid_to_blob(view.post_id))
            .bind(view.viewed_at)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE posts SET views = views + 1 WHERE id = ?")
            .bind(uuid_to_blob(view.post_id))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Counts rows of `table` per post, binding at most [`MAX_BOUND_IDS`] ids per query.
    async fn grouped_post_counts(&self, table: &str, post_ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, u64>> {
        let mut counts = HashMap::new();
        for chunk in post_ids.chunks(MAX_BOUND_IDS) {
            let mut qb: QueryBuilder<Sqlite> =
                QueryBuilder::new(format!("SELECT post_id, COUNT(*) AS n FROM {table} WHERE post_id IN ("));
            let mut ids = qb.separated(", ");
            for id in chunk {
                ids.push_bind(uuid_to_blob(*id));
            }
            ids.push_unseparated(") GROUP BY post_id");

            let rows = qb.build().fetch_all(&self.pool).await?;
            for row in &rows {
                counts.insert(uuid_column(row, "post_id")?, count_column(row, "n")?);
            }
        }
        Ok(counts)
    }

    async fn topic_counts(&self, sql: &str, user_id: Uuid) -> anyhow::Result<Vec<TopicCount>> {
        let rows = sqlx::query(sql)
            .bind(uuid_to_blob(user_id))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(topic_count_from_row).collect()
    }
}

#[async_trait]
impl ContentStore for SqliteContentStore {
    /// Retrieves a user and the ids of their favorite topics.
    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let row = sqlx::query("SELECT id, username, full_name FROM users WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let favorite_topics = sqlx::query("SELECT topic_id FROM user_topics WHERE user_id = ?")
            .bind(uuid_to_blob(id))
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|r| uuid_column(r, "topic_id"))
            .collect::<anyhow::Result<_>>()?;

        Ok(Some(User {
            id: uuid_column(&row, "id")?,
            username: row.try_get("username")?,
            full_name: row.try_get("full_name")?,
            favorite_topics,
        }))
    }

    async fn find_posts(&self, predicate: &PostPredicate) -> anyhow::Result<Vec<Post>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT p.* FROM posts p JOIN users u ON u.id = p.author_id WHERE 1 = 1");
        push_predicate(&mut qb, predicate);
        qb.push(" ORDER BY p.created_at DESC");

        let rows = qb.build().fetch_all(&self.pool).await?;
        log::debug!("find_posts: {} constraints, {} rows", predicate.constraints().len(), rows.len());
        rows.iter().map(post_from_row).collect()
    }

    async fn posts_by_author(&self, author_id: Uuid) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query("SELECT * FROM posts WHERE author_id = ? ORDER BY created_at DESC")
            .bind(uuid_to_blob(author_id))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(post_from_row).collect()
    }

    async fn comment_counts_for_posts(&self, post_ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, u64>> {
        self.grouped_post_counts("comments", post_ids).await
    }

    async fn save_counts_for_posts(&self, post_ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, u64>> {
        self.grouped_post_counts("saved_posts", post_ids).await
    }

    async fn saved_by_topic(&self, user_id: Uuid) -> anyhow::Result<Vec<TopicCount>> {
        self.topic_counts(
            "SELECT t.id AS topic_id, t.name AS topic_name, COUNT(*) AS n \
             FROM saved_posts sp JOIN posts p ON p.id = sp.post_id JOIN topics t ON t.id = p.topic_id \
             WHERE sp.user_id = ? GROUP BY t.id, t.name",
            user_id,
        )
        .await
    }

    async fn commented_by_topic(&self, user_id: Uuid) -> anyhow::Result<Vec<TopicCount>> {
        self.topic_counts(
            "SELECT t.id AS topic_id, t.name AS topic_name, COUNT(*) AS n \
             FROM comments c JOIN posts p ON p.id = c.post_id JOIN topics t ON t.id = p.topic_id \
             WHERE c.author_id = ? GROUP BY t.id, t.name",
            user_id,
        )
        .await
    }

    async fn viewed_by_topic(&self, user_id: Uuid) -> anyhow::Result<Vec<TopicCount>> {
        self.topic_counts(
            "SELECT t.id AS topic_id, t.name AS topic_name, COUNT(*) AS n \
             FROM post_views v JOIN posts p ON p.id = v.post_id JOIN topics t ON t.id = p.topic_id \
             WHERE v.user_id = ? GROUP BY t.id, t.name",
            user_id,
        )
        .await
    }

    async fn view_timestamps(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> anyhow::Result<Vec<DateTime<Utc>>> {
        let rows = sqlx::query("SELECT viewed_at FROM post_views WHERE user_id = ? AND viewed_at >= ? AND viewed_at < ?")
            .bind(uuid_to_blob(user_id))
            .bind(from)
            .bind(until)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| row.try_get("viewed_at"))
            .collect::<Result<_, sqlx::Error>>()?)
    }

    async fn author_totals(&self, author_id: Uuid) -> anyhow::Result<AuthorTotals> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total, \
                    COALESCE(SUM(CASE WHEN status = 'published' THEN 1 ELSE 0 END), 0) AS published, \
                    COALESCE(SUM(CASE WHEN status = 'draft' THEN 1 ELSE 0 END), 0) AS drafts, \
                    COALESCE(SUM(views), 0) AS views \
             FROM posts WHERE author_id = ?",
        )
        .bind(uuid_to_blob(author_id))
        .fetch_one(&self.pool)
        .await?;

        Ok(AuthorTotals {
            total_posts: count_column(&row, "total")?,
            published: count_column(&row, "published")?,
            drafts: count_column(&row, "drafts")?,
            total_views: count_column(&row, "views")?,
        })
    }

    async fn posts_per_topic(&self, author_id: Uuid) -> anyhow::Result<Vec<TopicCount>> {
        self.topic_counts(
            "SELECT t.id AS topic_id, t.name AS topic_name, COUNT(*) AS n \
             FROM posts p JOIN topics t ON t.id = p.topic_id \
             WHERE p.author_id = ? GROUP BY t.id, t.name",
            author_id,
        )
        .await
    }

    async fn reader_totals(&self, user_id: Uuid) -> anyhow::Result<ReaderTotals> {
        let id = uuid_to_blob(user_id);
        let row = sqlx::query(
            "SELECT (SELECT COUNT(*) FROM saved_posts WHERE user_id = ?) AS saved, \
                    (SELECT COUNT(*) FROM comments WHERE author_id = ?) AS comments_written, \
                    (SELECT COUNT(DISTINCT post_id) FROM comments WHERE author_id = ?) AS commented_posts, \
                    (SELECT COUNT(*) FROM post_views WHERE user_id = ?) AS views",
        )
        .bind(id.clone())
        .bind(id.clone())
        .bind(id.clone())
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ReaderTotals {
            saved_posts: count_column(&row, "saved")?,
            comments_written: count_column(&row, "comments_written")?,
            commented_posts: count_column(&row, "commented_posts")?,
            views: count_column(&row, "views")?,
        })
    }
}
