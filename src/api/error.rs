//! JSON error responses for handlers.
//!
//! Every error body has the shape `{"message": "..."}`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::domain::DomainError;

/// Error returned by handlers
#[derive(Debug)]
pub enum ApiError {
    /// Business-level failure from the service layer
    Domain(DomainError),
    /// The request could not be decoded (bad path segment, malformed body)
    Rejected { status: StatusCode, message: String },
}

/// JSON error response body
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub message: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Domain(DomainError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Domain(DomainError::AlreadyBorrowed | DomainError::NoCopiesLeft) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Domain(DomainError::Database(_) | DomainError::Internal(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Rejected { status, .. } => *status,
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        ApiError::Domain(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            ApiError::Domain(e) if status.is_server_error() => {
                // Details stay in the log, clients get a generic message
                tracing::error!("Request failed: {}", e);
                "Internal server error".to_string()
            }
            ApiError::Domain(e) => e.to_string(),
            ApiError::Rejected { message, .. } => {
                tracing::debug!("Request rejected ({}): {}", status, message);
                message
            }
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
