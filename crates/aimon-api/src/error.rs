use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gemini_client::GeminiError;
use serde_json::json;

use crate::cache::CacheError;
use crate::images::ImageError;

/// Application error type that converts to HTTP responses
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
    Database(sqlx::Error),
    Generation(GeminiError),
    Cache(CacheError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                internal()
            }
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                internal()
            }
            AppError::Generation(e) => {
                tracing::error!(error = %e, "Generation failed");
                internal()
            }
            AppError::Cache(e) => {
                tracing::error!(error = %e, "Cache error");
                internal()
            }
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}

fn internal() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".into(),
    )
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e)
    }
}

impl From<GeminiError> for AppError {
    fn from(e: GeminiError) -> Self {
        AppError::Generation(e)
    }
}

impl From<CacheError> for AppError {
    fn from(e: CacheError) -> Self {
        AppError::Cache(e)
    }
}

impl From<ImageError> for AppError {
    fn from(e: ImageError) -> Self {
        match e {
            ImageError::InvalidData(msg) => AppError::BadRequest(format!("Invalid image: {msg}")),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::BadRequest(e.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(e: PathRejection) -> Self {
        AppError::BadRequest(e.body_text())
    }
}
