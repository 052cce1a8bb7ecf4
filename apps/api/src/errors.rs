use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::entitlement::gate::FREE_GENERATION_LIMIT;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every error body is the flat object `{"error": "<message>"}` the web client reads.
#[derive(Debug, Error)]
pub enum AppError {
    /// Anonymous caller whose free generation is already spent.
    #[error("Sign in required")]
    SignInRequired,

    /// Signed-in caller without a subscription who has used every free generation.
    #[error("Generation quota exceeded ({limit} generations)")]
    QuotaExceeded { limit: u32 },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn quota_exceeded() -> AppError {
        AppError::QuotaExceeded {
            limit: FREE_GENERATION_LIMIT,
        }
    }

    /// Collapses anything the client cannot act on into `Generation`, so the
    /// generation endpoint answers with a single generic 500.
    pub fn into_generation_failure(self) -> AppError {
        match self {
            actionable @ (AppError::SignInRequired
            | AppError::QuotaExceeded { .. }
            | AppError::Generation(_)) => actionable,
            other => AppError::Generation(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::SignInRequired => (
                StatusCode::UNAUTHORIZED,
                "Please sign in to generate cover letters".to_string(),
            ),
            AppError::QuotaExceeded { limit } => (
                StatusCode::FORBIDDEN,
                format!(
                    "You have reached your generation limit ({limit} generations). \
                     Please subscribe for unlimited generations."
                ),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Authentication required".to_string(),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Generation(msg) => {
                tracing::error!("Cover letter generation failed: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to generate cover letter".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
