use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use marquee_enrich::EnrichError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("refresh failed: {0}")]
    Refresh(#[from] EnrichError),
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("request failed: {self}");
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
