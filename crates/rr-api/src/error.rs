//! Maps engine errors onto HTTP responses.
//!
//! Store failures become 503 with `retryable: true`.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use rr_core::AppError;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::AggregationFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.0.to_string(),
            "retryable": self.0.is_retryable(),
        }))
    }
}
