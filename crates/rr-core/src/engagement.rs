//! # Engagement Scorer
//!
//! Ranks an author's own posts by a weighted blend of views, comments and saves.

use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::Post;
use crate::traits::ContentStore;

pub const VIEW_WEIGHT: f64 = 0.5;
pub const COMMENT_WEIGHT: f64 = 2.0;
pub const SAVE_WEIGHT: f64 = 3.0;

pub fn engagement_score(views: u64, comments: u64, saved: u64) -> f64 {
    views as f64 * VIEW_WEIGHT + comments as f64 * COMMENT_WEIGHT + saved as f64 * SAVE_WEIGHT
}

/// One row of the author's "top posts" table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostEngagement {
    pub post: Post,
    pub views: u64,
    pub comments: u64,
    pub saved: u64,
    pub engagement: f64,
}

impl PostEngagement {
    pub fn new(post: Post, views: u64, comments: u64, saved: u64) -> Self {
        Self {
            post,
            views,
            comments,
            saved,
            engagement: engagement_score(views, comments, saved),
        }
    }
}

/// Stable sort by engagement, descending, truncated to `limit`.
pub fn top_by_engagement(mut stats: Vec<PostEngagement>, limit: usize) -> Vec<PostEngagement> {
    stats.sort_by(|a, b| b.engagement.total_cmp(&a.engagement));
    stats.truncate(limit);
    stats
}

/// The `limit` most engaging posts of `author_id`, any status.
///
/// Comment and save counts come from the facts themselves, not from the
/// post counters. A negative limit is a validation error.
pub async fn top_posts_by_engagement(
    store: &dyn ContentStore,
    author_id: Uuid,
    limit: i64,
) -> Result<Vec<PostEngagement>> {
    let limit = usize::try_from(limit)
        .map_err(|_| AppError::ValidationError(format!("limit must be non-negative, got {limit}")))?;
    if limit == 0 {
        return Ok(Vec::new());
    }

    let posts = store
        .posts_by_author(author_id)
        .await
        .map_err(|e| AppError::aggregation("top posts", e))?;
    if posts.is_empty() {
        return Ok(Vec::new());
    }

    let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
    let comments = store
        .comment_counts_for_posts(&post_ids)
        .await
        .map_err(|e| AppError::aggregation("top posts", e))?;
    let saves = store
        .save_counts_for_posts(&post_ids)
        .await
        .map_err(|e| AppError::aggregation("top posts", e))?;

    let stats = posts
        .into_iter()
        .map(|post| {
            let views = u64::from(post.views);
            let comment_count = comments.get(&post.id).copied().unwrap_or(0);
            let save_count = saves.get(&post.id).copied().unwrap_or(0);
            PostEngagement::new(post, views, comment_count, save_count)
        })
        .collect();

    let top = top_by_engagement(stats, limit);
    log::debug!("author {author_id}: {} top posts by engagement", top.len());
    Ok(top)
}
