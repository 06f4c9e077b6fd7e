use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Unexpected failures that end the request with a generic 500.
///
/// Recoverable conditions (validation failures, bad credentials, a missing or
/// duplicate resume) never pass through here; handlers turn those into
/// re-renders or redirects.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Database(e) => tracing::error!(error = %e, "database error"),
            AppError::Serialization(e) => tracing::error!(error = %e, "serialization error"),
            AppError::Internal(e) => tracing::error!(error = ?e, "internal error"),
        }

        let body = Json(json!({
            "error": {
                "code": "INTERNAL_ERROR",
                "message": "Something went wrong"
            }
        }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
