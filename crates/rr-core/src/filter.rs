//! # Filter Predicate Builder
//!
//! Turns the sparse advanced-filter criteria of the reader screen into a
//! single [`PostPredicate`]. The predicate is a flat AND of [`Constraint`]s
//! so that every store can translate it one clause at a time.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Post, PostStatus};
use crate::temporal::start_of_day;

/// Optional criteria supplied by the caller. Absent fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedCriteria {
    /// Case-insensitive substring of title or body.
    pub keyword: Option<String>,
    pub topic_id: Option<Uuid>,
    /// Case-insensitive substring of the author's display name.
    pub author_name: Option<String>,
    /// First day included, from 00:00.
    pub from_date: Option<NaiveDate>,
    /// Last day included, up to the end of that day.
    pub to_date: Option<NaiveDate>,
    pub min_views: Option<u32>,
    pub min_comments: Option<u32>,
    /// Only honoured when a reader id accompanies the request.
    #[serde(default)]
    pub only_saved: bool,
}

/// One clause of a [`PostPredicate`]. Text values are already trimmed and lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Constraint {
    Status(PostStatus),
    Keyword(String),
    Topic(Uuid),
    AuthorName(String),
    /// `created_at >= bound`
    CreatedFrom(DateTime<Utc>),
    /// `created_at < bound`
    CreatedBefore(DateTime<Utc>),
    MinViews(u32),
    MinComments(u32),
    /// Post is in this user's saved posts.
    SavedBy(Uuid),
}

/// Conjunction of constraints over posts. Always restricted to published posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostPredicate {
    constraints: Vec<Constraint>,
}

impl PostPredicate {
    /// The default, unfiltered reader feed.
    pub fn published() -> Self {
        Self {
            constraints: vec![Constraint::Status(PostStatus::Published)],
        }
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// True when nothing but the status restriction applies.
    pub fn is_default_feed(&self) -> bool {
        self.constraints == [Constraint::Status(PostStatus::Published)]
    }

    /// Evaluates the predicate in memory.
    ///
    /// `author_name` is the display name of the post's author and
    /// `is_saved_by` answers whether a given user saved this post.
    pub fn matches<F>(&self, post: &Post, author_name: &str, is_saved_by: F) -> bool
    where
        F: Fn(Uuid) -> bool,
    {
        self.constraints.iter().all(|constraint| match constraint {
            Constraint::Status(status) => post.status == *status,
            Constraint::Keyword(kw) => {
                post.title.to_lowercase().contains(kw.as_str())
                    || post.content.to_lowercase().contains(kw.as_str())
            }
            Constraint::Topic(topic_id) => post.topic_id == Some(*topic_id),
            Constraint::AuthorName(name) => author_name.to_lowercase().contains(name.as_str()),
            Constraint::CreatedFrom(bound) => post.created_at >= *bound,
            Constraint::CreatedBefore(bound) => post.created_at < *bound,
            Constraint::MinViews(min) => post.views >= *min,
            Constraint::MinComments(min) => post.comments_count >= *min,
            Constraint::SavedBy(user_id) => is_saved_by(*user_id),
        })
    }
}

impl Default for PostPredicate {
    fn default() -> Self {
        Self::published()
    }
}

impl FeedCriteria {
    /// Builds the predicate for a request made by `reader_id` (if any).
    ///
    /// Fails only on a reversed date range.
    pub fn build(&self, reader_id: Option<Uuid>) -> Result<PostPredicate> {
        if let (Some(from), Some(to)) = (self.from_date, self.to_date) {
            if from > to {
                return Err(AppError::ValidationError(format!(
                    "from_date {from} is after to_date {to}"
                )));
            }
        }

        let mut predicate = PostPredicate::published();
        let constraints = &mut predicate.constraints;

        if let Some(kw) = normalized(&self.keyword) {
            constraints.push(Constraint::Keyword(kw));
        }
        if let Some(topic_id) = self.topic_id {
            constraints.push(Constraint::Topic(topic_id));
        }
        if let Some(name) = normalized(&self.author_name) {
            constraints.push(Constraint::AuthorName(name));
        }
        if let Some(from) = self.from_date {
            constraints.push(Constraint::CreatedFrom(start_of_day(from)));
        }
        // The last representable date has no successor; the range is then open-ended.
        if let Some(next_day) = self.to_date.and_then(|to| to.succ_opt()) {
            constraints.push(Constraint::CreatedBefore(start_of_day(next_day)));
        }
        if let Some(min) = self.min_views {
            constraints.push(Constraint::MinViews(min));
        }
        if let Some(min) = self.min_comments {
            constraints.push(Constraint::MinComments(min));
        }
        match (self.only_saved, reader_id) {
            (true, Some(reader)) => constraints.push(Constraint::SavedBy(reader)),
            (true, None) => log::debug!("only_saved requested without a reader; ignoring"),
            _ => {}
        }

        Ok(predicate)
    }
}

fn normalized(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}
