//! # Topic Affinity Aggregator
//!
//! Blends how often a reader saved, commented on and viewed posts of each
//! topic into a single preference score. The three signals are read with
//! three independent store calls and merged here.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::TopicCount;
use crate::traits::ContentStore;

pub const SAVED_WEIGHT: u64 = 3;
pub const COMMENTED_WEIGHT: u64 = 2;
pub const VIEWED_WEIGHT: u64 = 1;

/// Entries kept by [`collapse_for_display`] before the rest become "Other".
pub const DISPLAY_TOPICS: usize = 6;
pub const OTHER_LABEL: &str = "Other";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicAffinity {
    pub topic_id: Uuid,
    pub topic_name: String,
    pub saved_count: u64,
    pub commented_count: u64,
    pub viewed_count: u64,
}

impl TopicAffinity {
    fn empty(topic_id: Uuid, topic_name: String) -> Self {
        Self {
            topic_id,
            topic_name,
            saved_count: 0,
            commented_count: 0,
            viewed_count: 0,
        }
    }

    pub fn score(&self) -> u64 {
        self.saved_count * SAVED_WEIGHT + self.commented_count * COMMENTED_WEIGHT + self.viewed_count * VIEWED_WEIGHT
    }
}

/// A labelled chart slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AffinitySlice {
    pub label: String,
    pub score: u64,
}

/// Merges the three grouped counts into one ranked list.
///
/// Topics with no signal at all are dropped. Order is score descending,
/// then topic name, then topic id, so equal scores always come out the same.
pub fn merge_topic_counts(
    saved: Vec<TopicCount>,
    commented: Vec<TopicCount>,
    viewed: Vec<TopicCount>,
) -> Vec<TopicAffinity> {
    let mut by_topic: HashMap<Uuid, TopicAffinity> = HashMap::new();

    let mut apply = |rows: Vec<TopicCount>, set: fn(&mut TopicAffinity, u64)| {
        for row in rows {
            let entry = by_topic
                .entry(row.topic_id)
                .or_insert_with(|| TopicAffinity::empty(row.topic_id, row.topic_name));
            set(entry, row.count);
        }
    };
    apply(saved, |a, n| a.saved_count += n);
    apply(commented, |a, n| a.commented_count += n);
    apply(viewed, |a, n| a.viewed_count += n);

    let mut ranked: Vec<TopicAffinity> = by_topic.into_values().filter(|a| a.score() > 0).collect();
    ranked.sort_by(|a, b| {
        b.score()
            .cmp(&a.score())
            .then_with(|| a.topic_name.cmp(&b.topic_name))
            .then_with(|| a.topic_id.cmp(&b.topic_id))
    });
    ranked
}

/// Top [`DISPLAY_TOPICS`] entries of an already ranked list, plus an
/// [`OTHER_LABEL`] slice summing the rest when that sum is positive.
pub fn collapse_for_display(ranked: &[TopicAffinity]) -> Vec<AffinitySlice> {
    let split = ranked.len().min(DISPLAY_TOPICS);
    let (head, tail) = ranked.split_at(split);

    let mut slices: Vec<AffinitySlice> = head
        .iter()
        .map(|a| AffinitySlice {
            label: a.topic_name.clone(),
            score: a.score(),
        })
        .collect();

    let other: u64 = tail.iter().map(TopicAffinity::score).sum();
    if other > 0 {
        slices.push(AffinitySlice {
            label: OTHER_LABEL.to_string(),
            score: other,
        });
    }
    slices
}

/// Ranked topic affinity of `reader_id`. Empty when the reader touched nothing.
pub async fn reader_topic_affinity(store: &dyn ContentStore, reader_id: Uuid) -> Result<Vec<TopicAffinity>> {
    let saved = store
        .saved_by_topic(reader_id)
        .await
        .map_err(|e| AppError::aggregation("topic affinity", e))?;
    let commented = store
        .commented_by_topic(reader_id)
        .await
        .map_err(|e| AppError::aggregation("topic affinity", e))?;
    let viewed = store
        .viewed_by_topic(reader_id)
        .await
        .map_err(|e| AppError::aggregation("topic affinity", e))?;

    let ranked = merge_topic_counts(saved, commented, viewed);
    log::debug!("reader {reader_id}: affinity over {} topics", ranked.len());
    Ok(ranked)
}
