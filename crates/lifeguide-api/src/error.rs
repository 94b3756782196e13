//! Error type shared by all REST handlers.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use lifeguide_db::StoreError;
use lifeguide_types::api::ErrorBody;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid parameter.
    #[error("{0}")]
    BadRequest(String),

    /// Body failed to deserialize.
    #[error("{message}")]
    Validation { message: String, details: String },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation {
            message: "Invalid request body".into(),
            details: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message, None),
            Self::Validation { message, details } => (StatusCode::BAD_REQUEST, message, Some(details)),
            Self::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message, None),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message, None),
            Self::Store(StoreError::Conflict(message)) => (StatusCode::CONFLICT, message, None),
            // Don't expose internal error details to clients
            err @ (Self::Store(_) | Self::Internal(_)) => {
                tracing::error!(error = %err, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string(), None)
            }
        };

        (status, Json(ErrorBody { error, details })).into_response()
    }
}
