use crate::common::response::ApiError;
use crate::config::settings::AppConfig;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Errors surfaced synchronously to HTTP callers.
///
/// Failures that happen inside a transcode worker never reach this type; they
/// are folded into the job's terminal state instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    ClientInput(String),

    #[error("Failed to save file: {0}")]
    Persistence(#[source] std::io::Error),

    #[error("Server is busy, try again later")]
    QueueSaturated,

    #[error("Server is shutting down")]
    ShuttingDown,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn file_too_large(config: &AppConfig) -> Self {
        AppError::ClientInput(format!(
            "File too large. Maximum size is {}",
            config.max_upload_label()
        ))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ClientInput(_) => StatusCode::BAD_REQUEST,
            AppError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::QueueSaturated | AppError::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        ApiError(self.to_string(), status).into_response()
    }
}
