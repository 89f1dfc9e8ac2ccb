//! # Temporal Aggregator
//!
//! Daily view histogram and consecutive-day reading streak, both computed
//! from raw view timestamps. A timestamp belongs to its UTC calendar date.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::traits::ContentStore;

/// How far back the streak scan looks, in days before today.
pub const STREAK_LOOKBACK_DAYS: u64 = 60;

/// Midnight UTC at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Midnight UTC after `date`, i.e. the exclusive end of that day.
fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    match date.succ_opt() {
        Some(next) => start_of_day(next),
        None => DateTime::<Utc>::MAX_UTC,
    }
}

/// Counts timestamps per calendar date. Only days with views appear.
pub fn histogram<I>(timestamps: I) -> BTreeMap<NaiveDate, u64>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let mut days = BTreeMap::new();
    for ts in timestamps {
        *days.entry(ts.date_naive()).or_insert(0) += 1;
    }
    days
}

/// Consecutive days ending at `today` that appear in `active_days`.
pub fn streak_from_dates(active_days: &HashSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut day = Some(today);
    while let Some(current) = day.filter(|d| active_days.contains(d)) {
        streak += 1;
        day = current.pred_opt();
    }
    streak
}

/// Views per day for `reader_id` over `[from, to]`, both days inclusive.
pub async fn daily_views(
    store: &dyn ContentStore,
    reader_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<BTreeMap<NaiveDate, u64>> {
    if from > to {
        return Err(AppError::ValidationError(format!("window start {from} is after end {to}")));
    }

    let timestamps = store
        .view_timestamps(reader_id, start_of_day(from), end_of_day(to))
        .await
        .map_err(|e| AppError::aggregation("daily views", e))?;

    let days = histogram(timestamps);
    log::debug!("reader {reader_id}: {} active days in {from}..={to}", days.len());
    Ok(days)
}

/// Current reading streak of `reader_id` as of `today`.
///
/// Zero when the reader has not viewed anything today.
pub async fn reading_streak(store: &dyn ContentStore, reader_id: Uuid, today: NaiveDate) -> Result<u32> {
    let from = today
        .checked_sub_days(Days::new(STREAK_LOOKBACK_DAYS))
        .unwrap_or(NaiveDate::MIN);

    let timestamps = store
        .view_timestamps(reader_id, start_of_day(from), end_of_day(today))
        .await
        .map_err(|e| AppError::aggregation("reading streak", e))?;

    let active_days: HashSet<NaiveDate> = timestamps.iter().map(DateTime::date_naive).collect();
    Ok(streak_from_dates(&active_days, today))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockContentStore;
    use chrono::{Duration, TimeZone};
    use mockall::predicate::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(date: NaiveDate, hour: u32) -> DateTime<Utc> {
        start_of_day(date) + Duration::hours(hour as i64)
    }

    #[test]
    fn histogram_is_sparse_and_ascending() {
        let d1 = date(2024, 6, 1);
        let d3 = date(2024, 6, 3);
        let days = histogram([at(d3, 9), at(d1, 23), at(d3, 0), at(d3, 22)]);

        assert_eq!(days.into_iter().collect::<Vec<_>>(), [(d1, 1), (d3, 3)]);
    }

    #[test]
    fn streak_counts_back_from_today() {
        let today = date(2024, 6, 10);
        let week: HashSet<_> = (0..7).map(|i| today - Duration::days(i)).collect();
        assert_eq!(streak_from_dates(&week, today), 7);
    }

    #[test]
    fn streak_is_zero_without_a_view_today() {
        let today = date(2024, 6, 10);
        let days = HashSet::from([today - Duration::days(1), today - Duration::days(2)]);
        assert_eq!(streak_from_dates(&days, today), 0);
    }

    #[test]
    fn streak_stops_at_first_gap() {
        let today = date(2024, 6, 10);
        let days = HashSet::from([
            today,
            today - Duration::days(1),
            today - Duration::days(3),
            today - Duration::days(4),
        ]);
        assert_eq!(streak_from_dates(&days, today), 2);
    }

    #[tokio::test]
    async fn daily_views_queries_whole_days() {
        let from = date(2024, 6, 1);
        let to = date(2024, 6, 30);

        let mut store = MockContentStore::new();
        store
            .expect_view_timestamps()
            .with(
                always(),
                eq(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
                eq(Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()),
            )
            .returning(move |_, _, _| Ok(vec![at(to, 23), at(to, 1)]));

        let days = daily_views(&store, Uuid::now_v7(), from, to).await.unwrap();
        assert_eq!(days.get(&to), Some(&2));
        assert_eq!(days.len(), 1);
    }

    #[tokio::test]
    async fn empty_window_is_not_an_error() {
        let mut store = MockContentStore::new();
        store.expect_view_timestamps().returning(|_, _, _| Ok(Vec::new()));

        let day = date(2024, 1, 1);
        assert!(daily_views(&store, Uuid::now_v7(), day, day).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reversed_window_is_rejected() {
        let store = MockContentStore::new();
        let err = daily_views(&store, Uuid::now_v7(), date(2024, 2, 2), date(2024, 2, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn streak_scans_sixty_days() {
        let today = date(2024, 6, 10);
        let mut store = MockContentStore::new();
        store
            .expect_view_timestamps()
            .with(always(), eq(start_of_day(date(2024, 4, 11))), eq(start_of_day(date(2024, 6, 11))))
            .returning(move |_, _, _| {
                // A full week plus an isolated day further back.
                let mut views: Vec<_> = (0..7).map(|i| at(today - Duration::days(i), 8)).collect();
                views.push(at(today - Duration::days(9), 8));
                Ok(views)
            });

        assert_eq!(reading_streak(&store, Uuid::now_v7(), today).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn streak_surfaces_store_failure() {
        let mut store = MockContentStore::new();
        store
            .expect_view_timestamps()
            .returning(|_, _, _| Err(anyhow::anyhow!("no such table: post_views")));

        let err = reading_streak(&store, Uuid::now_v7(), date(2024, 6, 10)).await.unwrap_err();
        assert!(err.is_retryable());
    }
}
