//! # rr-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the engine.
//! Every handler is a read: identifiers come from the path or query string,
//! never from a session.

use actix_web::{web, HttpResponse};
use chrono::{Days, NaiveDate, Utc};
use rr_core::{
    collapse_for_display, AffinitySlice, ContentStore, FeedCriteria, SortMode, TopicAffinity,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// Days shown by the reader's views chart when no window is given.
pub const DEFAULT_CHART_DAYS: u64 = 30;
pub const DEFAULT_TOP_POSTS: i64 = 5;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub store: Box<dyn ContentStore>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub reader: Option<Uuid>,
    pub keyword: Option<String>,
    pub topic: Option<Uuid>,
    pub author: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub min_views: Option<u32>,
    pub min_comments: Option<u32>,
    #[serde(default)]
    pub only_saved: bool,
    pub sort: Option<SortMode>,
}

impl FeedQuery {
    fn criteria(&self) -> FeedCriteria {
        FeedCriteria {
            keyword: self.keyword.clone(),
            topic_id: self.topic,
            author_name: self.author.clone(),
            from_date: self.from,
            to_date: self.to,
            min_views: self.min_views,
            min_comments: self.min_comments,
            only_saved: self.only_saved,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TopPostsQuery {
    #[serde(default = "default_top_posts")]
    pub limit: i64,
}

fn default_top_posts() -> i64 {
    DEFAULT_TOP_POSTS
}

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct TopicAffinityRow<'a> {
    #[serde(flatten)]
    affinity: &'a TopicAffinity,
    score: u64,
}

#[derive(Debug, Serialize)]
struct TopicAffinityResponse<'a> {
    topics: Vec<TopicAffinityRow<'a>>,
    chart: Vec<AffinitySlice>,
}

#[derive(Debug, Serialize)]
struct DailyViews {
    date: NaiveDate,
    views: u64,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// `GET /feed`: the reader feed, filtered and ranked.
pub async fn feed(data: web::Data<AppState>, query: web::Query<FeedQuery>) -> Result<HttpResponse, ApiError> {
    let criteria = query.criteria();
    let posts = rr_core::load_feed(data.store.as_ref(), query.reader, &criteria, query.sort).await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// `GET /authors/{id}/top-posts`: the author's posts by engagement score.
pub async fn top_posts(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<TopPostsQuery>,
) -> Result<HttpResponse, ApiError> {
    let author_id = path.into_inner();
    let top = rr_core::top_posts_by_engagement(data.store.as_ref(), author_id, query.limit).await?;
    Ok(HttpResponse::Ok().json(top))
}

/// `GET /authors/{id}/summary`
pub async fn author_summary(data: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, ApiError> {
    let summary = rr_core::author_summary(data.store.as_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// `GET /readers/{id}/topics`: ranked topic affinity plus the collapsed chart.
pub async fn reader_topics(data: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, ApiError> {
    let ranked = rr_core::reader_topic_affinity(data.store.as_ref(), path.into_inner()).await?;
    let response = TopicAffinityResponse {
        topics: ranked
            .iter()
            .map(|affinity| TopicAffinityRow { affinity, score: affinity.score() })
            .collect(),
        chart: collapse_for_display(&ranked),
    };
    Ok(HttpResponse::Ok().json(response))
}

/// `GET /readers/{id}/daily-views`: sparse per-day view counts.
pub async fn daily_views(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<WindowQuery>,
) -> Result<HttpResponse, ApiError> {
    let to = query.to.unwrap_or_else(today);
    let from = query.from.unwrap_or_else(|| {
        to.checked_sub_days(Days::new(DEFAULT_CHART_DAYS - 1))
            .unwrap_or(NaiveDate::MIN)
    });

    let days = rr_core::daily_views(data.store.as_ref(), path.into_inner(), from, to).await?;
    let body: Vec<DailyViews> = days
        .into_iter()
        .map(|(date, views)| DailyViews { date, views })
        .collect();
    Ok(HttpResponse::Ok().json(body))
}

/// `GET /readers/{id}/streak`
pub async fn reading_streak(data: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, ApiError> {
    let reader_id = path.into_inner();
    let as_of = today();
    let streak = rr_core::reading_streak(data.store.as_ref(), reader_id, as_of).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "reader_id": reader_id,
        "as_of": as_of,
        "streak": streak,
    })))
}

/// `GET /readers/{id}/summary`
pub async fn reader_summary(data: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, ApiError> {
    let summary = rr_core::reader_summary(data.store.as_ref(), path.into_inner(), today()).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// `GET /`: plain-text service banner.
pub async fn index() -> HttpResponse {
    HttpResponse::Ok().body("Rusty-Reader analytics API. Try GET /feed")
}
