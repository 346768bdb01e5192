//! Error types for the Folio server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::document::DocumentError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Document(e) => match e {
                DocumentError::Network(_) => {
                    tracing::warn!("Fetch failed: {}", e);
                    (StatusCode::BAD_GATEWAY, "network_error", e.to_string())
                }
                DocumentError::PathEscape(_) => {
                    tracing::warn!("Path escape rejected: {}", e);
                    (
                        StatusCode::FORBIDDEN,
                        "forbidden",
                        "Path is outside the document".to_string(),
                    )
                }
                DocumentError::Corrupt(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "corrupt_document", e.to_string())
                }
                DocumentError::UnsupportedFormat(_) => (
                    StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    "unsupported_format",
                    e.to_string(),
                ),
                DocumentError::ChapterOutOfRange { .. } | DocumentError::NotFound(_) => {
                    (StatusCode::NOT_FOUND, "not_found", e.to_string())
                }
                DocumentError::Io(_) | DocumentError::Internal(_) => {
                    tracing::error!("Document error: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal_error",
                        "An internal error occurred".to_string(),
                    )
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = self.parts();

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) && status.is_server_error() {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}
