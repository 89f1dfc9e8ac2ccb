//! # Ranking Engine
//!
//! Orders a feed either by an explicit sort key or, when the reader did not
//! pick one, by moving posts from the reader's favorite topics to the front.
//! The favorite boost is a stable two-way partition, not a score re-rank:
//! within each group the incoming order is kept as-is.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Post;

/// Explicit orderings offered by the reader feed. All are descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    Newest,
    MostViewed,
    MostCommented,
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(SortMode::Newest),
            "most_viewed" => Ok(SortMode::MostViewed),
            "most_commented" => Ok(SortMode::MostCommented),
            other => Err(format!("unknown sort mode '{other}'")),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortMode::Newest => "newest",
            SortMode::MostViewed => "most_viewed",
            SortMode::MostCommented => "most_commented",
        })
    }
}

/// Applies the explicit sort if given, otherwise the favorite-topic partition.
pub fn rank_posts(posts: Vec<Post>, sort: Option<SortMode>, favorites: &BTreeSet<Uuid>) -> Vec<Post> {
    if posts.len() <= 1 {
        return posts;
    }
    match sort {
        Some(mode) => sort_posts(posts, mode),
        None => partition_by_favorites(posts, favorites),
    }
}

/// Stable descending sort; equal keys keep their input order.
pub fn sort_posts(mut posts: Vec<Post>, mode: SortMode) -> Vec<Post> {
    if posts.len() <= 1 {
        return posts;
    }
    match mode {
        SortMode::Newest => posts.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortMode::MostViewed => posts.sort_by(|a, b| b.views.cmp(&a.views)),
        SortMode::MostCommented => posts.sort_by(|a, b| b.comments_count.cmp(&a.comments_count)),
    }
    posts
}

/// Favorite-topic posts first, then the rest, each group in input order.
///
/// Posts without a topic always land in the second group.
pub fn partition_by_favorites(posts: Vec<Post>, favorites: &BTreeSet<Uuid>) -> Vec<Post> {
    if posts.len() <= 1 || favorites.is_empty() {
        return posts;
    }
    let (mut favored, others): (Vec<Post>, Vec<Post>) = posts
        .into_iter()
        .partition(|post| post.topic_id.is_some_and(|topic| favorites.contains(&topic)));
    log::debug!("favorite partition: {} favored, {} other", favored.len(), others.len());
    favored.extend(others);
    favored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostStatus;
    use chrono::{Duration, TimeZone, Utc};

    fn post(title: &str, topic: Option<Uuid>, day: u32, views: u32, comments: u32) -> Post {
        Post {
            id: Uuid::now_v7(),
            author_id: Uuid::nil(),
            topic_id: topic,
            title: title.to_string(),
            content: String::new(),
            status: PostStatus::Published,
            views,
            comments_count: comments,
            saved_count: 0,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + Duration::days(day as i64),
            updated_at: None,
        }
    }

    fn titles(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.title.as_str()).collect()
    }

    #[test]
    fn no_sort_and_no_favorites_is_identity() {
        let posts = vec![
            post("a", Some(Uuid::now_v7()), 2, 5, 0),
            post("b", None, 9, 1, 7),
            post("c", Some(Uuid::now_v7()), 1, 9, 3),
        ];
        let ranked = rank_posts(posts.clone(), None, &BTreeSet::new());
        assert_eq!(ranked, posts);
    }

    #[test]
    fn single_post_is_returned_unchanged() {
        let posts = vec![post("only", None, 0, 0, 0)];
        for mode in [None, Some(SortMode::Newest), Some(SortMode::MostViewed), Some(SortMode::MostCommented)] {
            assert_eq!(rank_posts(posts.clone(), mode, &BTreeSet::from([Uuid::now_v7()])), posts);
        }
        assert!(rank_posts(Vec::new(), Some(SortMode::Newest), &BTreeSet::new()).is_empty());
    }

    #[test]
    fn favorites_move_to_front_preserving_order() {
        let topic_a = Uuid::now_v7();
        let topic_b = Uuid::now_v7();
        let posts = vec![
            post("x", Some(topic_b), 3, 0, 0),
            post("y", Some(topic_a), 1, 0, 0),
            post("z", Some(topic_b), 2, 0, 0),
        ];
        let ranked = rank_posts(posts, None, &BTreeSet::from([topic_a]));
        assert_eq!(titles(&ranked), ["y", "x", "z"]);
    }

    #[test]
    fn partition_is_stable_within_groups() {
        let fav = Uuid::now_v7();
        let other = Uuid::now_v7();
        let posts = vec![
            post("o1", Some(other), 0, 0, 0),
            post("f1", Some(fav), 0, 0, 0),
            post("none", None, 0, 0, 0),
            post("f2", Some(fav), 0, 0, 0),
            post("o2", Some(other), 0, 0, 0),
            post("f3", Some(fav), 0, 0, 0),
        ];
        let ranked = partition_by_favorites(posts, &BTreeSet::from([fav]));
        assert_eq!(titles(&ranked), ["f1", "f2", "f3", "o1", "none", "o2"]);
    }

    #[test]
    fn explicit_sort_wins_over_favorites() {
        let fav = Uuid::now_v7();
        let posts = vec![
            post("old-fav", Some(fav), 1, 0, 0),
            post("new", None, 5, 0, 0),
        ];
        let ranked = rank_posts(posts, Some(SortMode::Newest), &BTreeSet::from([fav]));
        assert_eq!(titles(&ranked), ["new", "old-fav"]);
    }

    #[test]
    fn metric_sorts_are_descending_and_stable() {
        let posts = vec![
            post("a", None, 0, 10, 1),
            post("b", None, 0, 50, 1),
            post("c", None, 0, 10, 4),
        ];
        let by_views = sort_posts(posts.clone(), SortMode::MostViewed);
        assert_eq!(titles(&by_views), ["b", "a", "c"]);

        let by_comments = sort_posts(posts, SortMode::MostCommented);
        assert_eq!(titles(&by_comments), ["c", "a", "b"]);
    }

    #[test]
    fn newest_keeps_input_order_on_equal_timestamps() {
        let posts = vec![
            post("first", None, 2, 0, 0),
            post("older", None, 1, 0, 0),
            post("second", None, 2, 0, 0),
            post("third", None, 2, 0, 0),
        ];
        let ranked = sort_posts(posts, SortMode::Newest);
        assert_eq!(titles(&ranked), ["first", "second", "third", "older"]);
    }

    #[test]
    fn sort_mode_parses_query_values() {
        assert_eq!("most_viewed".parse::<SortMode>(), Ok(SortMode::MostViewed));
        assert_eq!(SortMode::MostCommented.to_string(), "most_commented");
        assert!("popular".parse::<SortMode>().is_err());
    }
}
