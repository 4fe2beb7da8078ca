use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;
use tracing::error;

use crate::{auth::AuthError, cloudinary::CloudinaryError, models::ErrorResponse};

/// Request-level failures. Server-side variants carry the message the caller
/// sees; their source is only ever logged.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized(#[source] AuthError),

    #[error("{0}")]
    Validation(&'static str),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Configuration(&'static str),

    #[error("{message}")]
    Upstream {
        message: &'static str,
        #[source]
        source: CloudinaryError,
    },

    #[error("{message}")]
    Persistence {
        message: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Configuration(_)
            | AppError::Upstream { .. }
            | AppError::Persistence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            AppError::Upstream { message, source } => {
                error!(error = %source, "{}: media host call failed", message);
            }
            AppError::Persistence { message, source } => {
                error!(error = %source, "{}: database operation failed", message);
            }
            AppError::Configuration(message) => error!("{}", message),
            AppError::Unauthorized(reason) => tracing::debug!(%reason, "rejecting unauthenticated request"),
            _ => {}
        }

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
