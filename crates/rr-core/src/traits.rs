//! # Core Traits (Ports)
//!
//! Any store plugin must implement these traits to be used by the binary.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::filter::PostPredicate;
use crate::models::{AuthorTotals, Post, ReaderTotals, TopicCount, User};

/// Read contract the ranking and analytics engine needs from persistence.
///
/// Implementations return fully materialized values. Each call is an
/// independent point-in-time read; the engine never asks for a transaction
/// spanning several calls.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    // User Operations
    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>>;

    // Post Operations
    /// Posts matching every constraint of the predicate, in any order.
    async fn find_posts(&self, predicate: &PostPredicate) -> anyhow::Result<Vec<Post>>;
    /// All posts by an author regardless of status.
    async fn posts_by_author(&self, author_id: Uuid) -> anyhow::Result<Vec<Post>>;

    // Per-post fact aggregates. Posts without facts may be absent from the map.
    async fn comment_counts_for_posts(&self, post_ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, u64>>;
    async fn save_counts_for_posts(&self, post_ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, u64>>;

    // Per-reader fact aggregates grouped by the topic of the touched post.
    async fn saved_by_topic(&self, user_id: Uuid) -> anyhow::Result<Vec<TopicCount>>;
    async fn commented_by_topic(&self, user_id: Uuid) -> anyhow::Result<Vec<TopicCount>>;
    async fn viewed_by_topic(&self, user_id: Uuid) -> anyhow::Result<Vec<TopicCount>>;

    /// View timestamps of a user in the half-open range `[from, until)`.
    async fn view_timestamps(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> anyhow::Result<Vec<DateTime<Utc>>>;

    // Dashboard totals
    async fn author_totals(&self, author_id: Uuid) -> anyhow::Result<AuthorTotals>;
    async fn posts_per_topic(&self, author_id: Uuid) -> anyhow::Result<Vec<TopicCount>>;
    async fn reader_totals(&self, user_id: Uuid) -> anyhow::Result<ReaderTotals>;
}
