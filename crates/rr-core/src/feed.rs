//! # Reader Feed
//!
//! Glues the predicate builder, the store and the ranking engine together.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::filter::FeedCriteria;
use crate::models::Post;
use crate::ranking::{rank_posts, SortMode};
use crate::traits::ContentStore;

/// Published posts matching `criteria`, ordered for `reader_id`.
///
/// Anonymous requests get no favorite boost and cannot use `only_saved`.
pub async fn load_feed(
    store: &dyn ContentStore,
    reader_id: Option<Uuid>,
    criteria: &FeedCriteria,
    sort: Option<SortMode>,
) -> Result<Vec<Post>> {
    let predicate = criteria.build(reader_id)?;

    let favorites = match reader_id {
        Some(id) => {
            let reader = store
                .find_user(id)
                .await
                .map_err(|e| AppError::aggregation("feed", e))?
                .ok_or_else(|| AppError::NotFound("User".to_string(), id.to_string()))?;
            reader.favorite_topics
        }
        None => BTreeSet::new(),
    };

    let posts = store
        .find_posts(&predicate)
        .await
        .map_err(|e| AppError::aggregation("feed", e))?;
    log::debug!(
        "feed: {} posts (default feed: {}, sort: {:?}, favorites: {})",
        posts.len(),
        predicate.is_default_feed(),
        sort,
        favorites.len()
    );

    Ok(rank_posts(posts, sort, &favorites))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Constraint;
    use crate::models::{PostStatus, User};
    use crate::traits::MockContentStore;
    use chrono::{Duration, TimeZone, Utc};

    fn post(title: &str, topic: Uuid, day: i64) -> Post {
        Post {
            id: Uuid::now_v7(),
            author_id: Uuid::nil(),
            topic_id: Some(topic),
            title: title.to_string(),
            content: String::new(),
            status: PostStatus::Published,
            views: 0,
            comments_count: 0,
            saved_count: 0,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(day),
            updated_at: None,
        }
    }

    fn reader(favorites: &[Uuid]) -> User {
        User {
            id: Uuid::now_v7(),
            username: "reader".into(),
            full_name: None,
            favorite_topics: favorites.iter().copied().collect(),
        }
    }

    #[tokio::test]
    async fn favorites_partition_the_default_feed() {
        let topic_a = Uuid::now_v7();
        let topic_b = Uuid::now_v7();
        let user = reader(&[topic_a]);
        let posts = vec![post("X", topic_b, 3), post("Y", topic_a, 1), post("Z", topic_b, 2)];

        let mut store = MockContentStore::new();
        store.expect_find_user().returning(move |_| Ok(Some(user.clone())));
        store
            .expect_find_posts()
            .withf(|predicate| predicate.is_default_feed())
            .returning(move |_| Ok(posts.clone()));

        let feed = load_feed(&store, Some(Uuid::now_v7()), &FeedCriteria::default(), None)
            .await
            .unwrap();
        let titles: Vec<_> = feed.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["Y", "X", "Z"]);
    }

    #[tokio::test]
    async fn anonymous_feed_skips_user_lookup() {
        let topic = Uuid::now_v7();
        let posts = vec![post("old", topic, 1), post("new", topic, 5)];

        let mut store = MockContentStore::new();
        store.expect_find_user().never();
        store.expect_find_posts().returning(move |_| Ok(posts.clone()));

        let feed = load_feed(&store, None, &FeedCriteria::default(), Some(SortMode::Newest))
            .await
            .unwrap();
        assert_eq!(feed[0].title, "new");
    }

    #[tokio::test]
    async fn only_saved_is_scoped_to_the_reader() {
        let reader_id = Uuid::now_v7();
        let user = reader(&[]);

        let mut store = MockContentStore::new();
        store.expect_find_user().returning(move |_| Ok(Some(user.clone())));
        store
            .expect_find_posts()
            .withf(move |predicate| predicate.constraints().contains(&Constraint::SavedBy(reader_id)))
            .returning(|_| Ok(Vec::new()));

        let criteria = FeedCriteria { only_saved: true, ..Default::default() };
        assert!(load_feed(&store, Some(reader_id), &criteria, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_reader_is_not_found() {
        let mut store = MockContentStore::new();
        store.expect_find_user().returning(|_| Ok(None));

        let err = load_feed(&store, Some(Uuid::now_v7()), &FeedCriteria::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(..)));
    }

    #[tokio::test]
    async fn store_failure_returns_no_partial_feed() {
        let mut store = MockContentStore::new();
        store
            .expect_find_posts()
            .returning(|_| Err(anyhow::anyhow!("disk I/O error")));

        let err = load_feed(&store, None, &FeedCriteria::default(), None).await.unwrap_err();
        assert!(matches!(err, AppError::AggregationFailed(_)));
    }
}
