//! Unified error handling for the dispatch service.
//!
//! Every error leaves the service as JSON `{"error": "<message>"}`. Server-side
//! failures are captured to Sentry and their details are hidden from clients.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::DispatchError;

/// Application-level error type for the HTTP layer.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Campaign dispatch failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Missing or incorrect API key.
    #[error("{0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// Request conflicts with the resource's current state.
    #[error("{0}")]
    Conflict(String),
}

const INTERNAL_MESSAGE: &str = "Internal server error";

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(e) | Self::Dispatch(DispatchError::Store(e)) => repository_status(e),
            Self::Dispatch(e) => match e {
                DispatchError::InvalidRequest | DispatchError::InvalidId(_) => {
                    StatusCode::BAD_REQUEST
                }
                DispatchError::CustomerNotFound
                | DispatchError::CampaignNotFound
                | DispatchError::EmptyAudience => StatusCode::NOT_FOUND,
                DispatchError::Mailer(_) | DispatchError::Store(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    /// Message safe to show to clients.
    fn public_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound)
            | Self::Dispatch(DispatchError::Store(RepositoryError::NotFound)) => {
                "Not found".to_string()
            }
            Self::Database(RepositoryError::Conflict(msg))
            | Self::Dispatch(DispatchError::Store(RepositoryError::Conflict(msg))) => msg.clone(),
            Self::Dispatch(DispatchError::Mailer(_)) => "Email delivery failed".to_string(),
            _ if self.status().is_server_error() => INTERNAL_MESSAGE.to_string(),
            _ => self.to_string(),
        }
    }
}

const fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Parse a path ID, turning garbage into a 400.
///
/// # Errors
///
/// Returns `AppError::BadRequest` naming `what` if `raw` is not a UUID.
pub fn parse_id<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid {what} id")))
}
