//! # API Errors
//!
//! Every failure leaves the server as a status code and a `{message}` body.
//!
//! ## Status Mapping
//! ```text
//! ┌─────────────────────────────────────────────┬──────────────────────────┐
//! │ Source                                      │ Response                 │
//! ├─────────────────────────────────────────────┼──────────────────────────┤
//! │ CoreError::Validation / malformed JSON      │ 400 + reason             │
//! │ CoreError::ProductNotFound (sale line)      │ 400 + product id         │
//! │ CoreError::InsufficientStock                │ 400 + offending SKUs     │
//! │ CoreError::is_retryable() / pool exhausted  │ 503 + generic text       │
//! │ PartialCommitDetected { restored: false }   │ 500 + generic text       │
//! │ DbError::NotFound                           │ 404                      │
//! │ DbError::UniqueViolation                    │ 409                      │
//! │ DbError::Immutable (SKU change)             │ 400                      │
//! │ anything else                               │ 500 + generic text       │
//! └─────────────────────────────────────────────┴──────────────────────────┘
//! ```
//!
//! Storage details are logged, never returned.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use shelf_core::{CoreError, ValidationError};
use shelf_db::DbError;
use thiserror::Error;
use tracing::error;

const UNAVAILABLE: &str = "Service temporarily unavailable, please retry";
const INTERNAL: &str = "Internal server error";

/// Error returned by every handler.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
}

impl ApiError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        ApiError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Status code and client-facing message.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Core(err) => match err {
                CoreError::Validation(_)
                | CoreError::ProductNotFound(_)
                | CoreError::InsufficientStock(_) => (StatusCode::BAD_REQUEST, err.to_string()),
                _ if err.is_retryable() => (StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE.into()),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.into()),
            },
            ApiError::Db(err) => match err {
                DbError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
                DbError::UniqueViolation { .. } => (StatusCode::CONFLICT, err.to_string()),
                DbError::Immutable(_) => (
                    StatusCode::BAD_REQUEST,
                    ValidationError::Immutable {
                        field: "sku".to_string(),
                    }
                    .to_string(),
                ),
                DbError::CheckViolation { .. } => {
                    (StatusCode::BAD_REQUEST, "Value out of range".to_string())
                }
                DbError::PoolExhausted | DbError::ConnectionFailed(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE.into())
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.into()),
            },
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            ApiError::NotFound { .. } => (StatusCode::NOT_FOUND, self.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Core(CoreError::Validation(err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            error!(error = %self, status = status.as_u16(), "Request failed");
        }

        (status, Json(ErrorBody { message })).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
