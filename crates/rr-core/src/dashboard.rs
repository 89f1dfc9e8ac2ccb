//! # Dashboard Summaries
//!
//! Headline numbers for the blogger and reader dashboards.

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{AuthorTotals, ReaderTotals, TopicCount};
use crate::temporal::reading_streak;
use crate::traits::ContentStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorSummary {
    #[serde(flatten)]
    pub totals: AuthorTotals,
    /// Post count per topic, largest first.
    pub posts_per_topic: Vec<TopicCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReaderSummary {
    #[serde(flatten)]
    pub totals: ReaderTotals,
    pub reading_streak: u32,
}

pub async fn author_summary(store: &dyn ContentStore, author_id: Uuid) -> Result<AuthorSummary> {
    let totals = store
        .author_totals(author_id)
        .await
        .map_err(|e| AppError::aggregation("author summary", e))?;
    let mut posts_per_topic = store
        .posts_per_topic(author_id)
        .await
        .map_err(|e| AppError::aggregation("author summary", e))?;

    posts_per_topic.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.topic_name.cmp(&b.topic_name)));

    Ok(AuthorSummary { totals, posts_per_topic })
}

pub async fn reader_summary(store: &dyn ContentStore, reader_id: Uuid, today: NaiveDate) -> Result<ReaderSummary> {
    let totals = store
        .reader_totals(reader_id)
        .await
        .map_err(|e| AppError::aggregation("reader summary", e))?;
    let reading_streak = reading_streak(store, reader_id, today).await?;

    Ok(ReaderSummary { totals, reading_streak })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockContentStore;
    use chrono::{TimeZone, Utc};

    fn topic_count(name: &str, count: u64) -> TopicCount {
        TopicCount {
            topic_id: Uuid::now_v7(),
            topic_name: name.to_string(),
            count,
        }
    }

    #[tokio::test]
    async fn author_topics_are_ordered_by_count_then_name() {
        let mut store = MockContentStore::new();
        store.expect_author_totals().returning(|_| {
            Ok(AuthorTotals {
                total_posts: 6,
                published: 4,
                drafts: 2,
                total_views: 120,
            })
        });
        store.expect_posts_per_topic().returning(|_| {
            Ok(vec![topic_count("Travel", 1), topic_count("Rust", 3), topic_count("Food", 1)])
        });

        let summary = author_summary(&store, Uuid::now_v7()).await.unwrap();
        assert_eq!(summary.totals.published + summary.totals.drafts, summary.totals.total_posts);
        let names: Vec<_> = summary.posts_per_topic.iter().map(|t| t.topic_name.as_str()).collect();
        assert_eq!(names, ["Rust", "Food", "Travel"]);
    }

    #[tokio::test]
    async fn reader_summary_includes_streak() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let mut store = MockContentStore::new();
        store.expect_reader_totals().returning(|_| {
            Ok(ReaderTotals {
                saved_posts: 3,
                comments_written: 5,
                commented_posts: 2,
                views: 40,
            })
        });
        store
            .expect_view_timestamps()
            .returning(|_, _, _| Ok(vec![Utc.with_ymd_and_hms(2024, 6, 10, 7, 30, 0).unwrap()]));

        let summary = reader_summary(&store, Uuid::now_v7(), today).await.unwrap();
        assert_eq!(summary.reading_streak, 1);
        assert_eq!(summary.totals.commented_posts, 2);
    }

    #[tokio::test]
    async fn failed_totals_read_fails_summary() {
        let mut store = MockContentStore::new();
        store
            .expect_reader_totals()
            .returning(|_| Err(anyhow::anyhow!("pool timed out")));

        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        assert!(reader_summary(&store, Uuid::now_v7(), today).await.is_err());
    }
}
