//! rusty-reader/crates/rr-core/src/lib.rs
//!
//! The feed ranking and engagement-analytics engine for Rusty-Reader,
//! plus the interface definitions store plugins implement.

pub mod models;
pub mod traits;
pub mod error;

pub mod filter;
pub mod ranking;
pub mod engagement;
pub mod affinity;
pub mod temporal;
pub mod dashboard;
pub mod feed;

// Re-exporting for easier access in other crates
pub use models::*;
pub use traits::*;
pub use error::*;

pub use affinity::{collapse_for_display, reader_topic_affinity, AffinitySlice, TopicAffinity};
pub use dashboard::{author_summary, reader_summary, AuthorSummary, ReaderSummary};
pub use engagement::{top_posts_by_engagement, PostEngagement};
pub use feed::load_feed;
pub use filter::{Constraint, FeedCriteria, PostPredicate};
pub use ranking::{rank_posts, SortMode};
pub use temporal::{daily_views, reading_streak};

#[cfg(test)]
mod tests {
    use super::models::*;
    use uuid::Uuid;

    #[test]
    fn test_post_status_round_trip_v7() {
        let post = Post {
            id: Uuid::now_v7(),
            author_id: Uuid::now_v7(),
            topic_id: None,
            title: "Hello Rust!".to_string(),
            content: "First post".to_string(),
            status: "published".parse().unwrap(),
            views: 0,
            comments_count: 0,
            saved_count: 0,
            created_at: chrono::Utc::now(),
            updated_at: None,
        };
        assert_eq!(post.status, PostStatus::Published);
        assert_eq!(post.status.as_str(), "published");
        assert!("archived".parse::<PostStatus>().is_err());
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let mut user = User {
            id: Uuid::now_v7(),
            username: "ada".to_string(),
            full_name: None,
            favorite_topics: Default::default(),
        };
        assert_eq!(user.display_name(), "ada");
        user.full_name = Some("Ada Lovelace".to_string());
        assert_eq!(user.display_name(), "Ada Lovelace");
    }
}
