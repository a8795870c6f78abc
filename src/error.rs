use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to fetch {what} after {attempts} attempt(s): {message}")]
    UpstreamFetch {
        what: String,
        attempts: u32,
        message: String,
    },

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Sentiment unavailable: {0}")]
    Sentiment(String),

    #[error("Narrative analysis failed: {0}")]
    NarrativeParse(String),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidInput(_) | AppError::SerdeJson(_) => StatusCode::BAD_REQUEST,
            AppError::UpstreamFetch { .. }
            | AppError::ExternalApi(_)
            | AppError::Sentiment(_)
            | AppError::NarrativeParse(_)
            | AppError::Reqwest(_) => StatusCode::BAD_GATEWAY,
        };

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
