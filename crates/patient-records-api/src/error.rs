//! HTTP error responses.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use patient_records_core::RecordError;
use serde::Serialize;

/// Error body: `{"detail": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// An error that renders as a status code plus a JSON detail message.
#[derive(Debug, thiserror::Error)]
#[error("{status}: {detail}")]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }

    pub fn unprocessable(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

impl From<RecordError> for ApiError {
    fn from(e: RecordError) -> Self {
        match e {
            RecordError::NotFound(_) => {
                tracing::warn!(error = %e, "record not found");
                ApiError::not_found("Patient not found")
            }
            RecordError::AlreadyExists(_) => {
                tracing::warn!(error = %e, "duplicate patient id");
                ApiError::bad_request("Patient already exists")
            }
            RecordError::InvalidArgument(detail) => {
                tracing::warn!(error = %detail, "invalid argument");
                ApiError::bad_request(detail)
            }
            RecordError::Validation(v) => {
                tracing::warn!(error = %v, "validation failed");
                ApiError::unprocessable(v.to_string())
            }
            RecordError::PreconditionFailed(detail) => {
                ApiError::new(StatusCode::PRECONDITION_FAILED, detail)
            }
            RecordError::Storage(_) | RecordError::Poisoned(_) => {
                tracing::error!(error = %e, "storage failure");
                ApiError::internal()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}
