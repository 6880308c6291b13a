//! Request error taxonomy and its HTTP mapping.
//!
//! Every caller-input problem is surfaced as one or more [`FieldError`]s with
//! enough detail to correct the request; storage and other infrastructure
//! failures stay opaque to the caller and go to the log instead.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

// ---

/// What went wrong with a caller-supplied field or parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    // ---
    /// Shape, type, or parse failure.
    MalformedInput,
    /// Value outside its domain-specific physical bounds.
    OutOfRange,
    /// Required query parameter absent.
    MissingParameter,
    /// Recognized parameter carrying an unrecognized value.
    InvalidParameter,
}

/// One field-level problem, addressed to the request initiator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    // ---
    pub field: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl FieldError {
    fn new(kind: ErrorKind, field: impl Into<String>, message: impl Into<String>) -> Self {
        // ---
        FieldError {
            field: field.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn malformed(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedInput, field, message)
    }

    pub fn out_of_range(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OutOfRange, field, message)
    }

    pub fn missing(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingParameter, field, message)
    }

    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParameter, field, message)
    }
}

// ---

/// Top-level error type for request handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // ---
    /// Caller input rejected; answered with field-level detail.
    #[error("request rejected with {} field error(s)", .0.len())]
    Rejected(Vec<FieldError>),

    /// Infrastructure failure; answered opaquely, detail goes to the log.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<FieldError> for ApiError {
    fn from(error: FieldError) -> Self {
        ApiError::Rejected(vec![error])
    }
}

impl From<Vec<FieldError>> for ApiError {
    fn from(errors: Vec<FieldError>) -> Self {
        ApiError::Rejected(errors)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        ApiError::Internal(error.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // ---
        match self {
            ApiError::Rejected(errors) => {
                tracing::debug!("Rejecting request with {} field error(s)", errors.len());
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
            }
            ApiError::Internal(error) => {
                tracing::error!("Internal error serving request: {:#}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal error" })),
                )
                    .into_response()
            }
        }
    }
}
