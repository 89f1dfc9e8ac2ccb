//! # Domain Models
//!
//! These structs represent the core entities of Rusty-Reader.
//! We use UUID v7 for time-ordered, globally unique identification.
//! The engine only ever reads these; writes belong to the store plugins.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Publication state of a post. Only `Published` posts reach the reader feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
}

impl PostStatus {
    /// The value stored in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(format!("unknown post status '{other}'")),
        }
    }
}

/// A content category (e.g., "Rust", "Travel"). Names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: Uuid,
    pub name: String,
}

/// A reader or blogger account, reduced to what ranking needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub full_name: Option<String>,
    /// Topic ids that get the affinity boost in the default feed.
    pub favorite_topics: BTreeSet<Uuid>,
}

impl User {
    /// Name used by the author filter: full name, falling back to username.
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.username)
    }
}

/// A blog post with its denormalized engagement counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    /// `None` for posts whose topic was removed; such posts never match a favorite.
    pub topic_id: Option<Uuid>,
    pub title: String,
    pub content: String,
    pub status: PostStatus,
    pub views: u32,
    pub comments_count: u32,
    pub saved_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A reader bookmarking a post. At most one per (user, post).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedPost {
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// One logged read of a post. Re-reads are logged again, never deduplicated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub viewed_at: DateTime<Utc>,
}

/// A grouped count keyed by topic, as returned by the store's aggregate reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCount {
    pub topic_id: Uuid,
    pub topic_name: String,
    pub count: u64,
}

/// Blogger-side totals over all of an author's posts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorTotals {
    pub total_posts: u64,
    pub published: u64,
    pub drafts: u64,
    pub total_views: u64,
}

/// Reader-side totals over a user's own activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderTotals {
    pub saved_posts: u64,
    pub comments_written: u64,
    /// Distinct posts the user commented on.
    pub commented_posts: u64,
    pub views: u64,
}
