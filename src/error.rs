use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Request-level failures surfaced to the client. The duplicate-vote
/// conflict is not represented here: it is an expected outcome of the vote
/// flow, not an error (see `vote::VoteOutcome`).
#[derive(Error, Debug)]
pub enum AppError {
    #[error("You must be logged in.")]
    Unauthorized,

    #[error("Only the poll creator may view results.")]
    Forbidden,

    #[error("Poll not found.")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("internal error")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(e) => {
                error!("database error: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Store error detail stays in the server logs.
        let message = match &self {
            AppError::Database(_) => "Something went wrong. Please try again.".to_string(),
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
