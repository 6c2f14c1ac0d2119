//! Custom error types for the photo API
//!
//! Every failure leaving a handler is an [`ApiError`]. Each variant belongs to
//! exactly one [`ErrorKind`], and the kind alone decides the HTTP status.

use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Generic message returned for every internal failure
pub const INTERNAL_MESSAGE: &str = "it's our fault, not yours";

/// Error classification used at the HTTP boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or invalid input fields
    Validation,
    /// Body that could not be parsed at all
    MalformedBody,
    /// Missing or invalid credentials
    Authentication,
    /// Valid identity without the rights for the action
    Authorization,
    /// Request shape refused before any lookup
    Forbidden,
    /// Absent, or hidden by visibility rules
    NotFound,
    /// Unique-constraint violation
    Conflict,
    /// Anything unexpected
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::MalformedBody => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
            ErrorKind::Authorization => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Custom error type for the photo API
#[derive(Error, Debug)]
pub enum ApiError {
    /// Field validation failures, one `"<field> : <reason>"` entry each
    #[error("invalid request: {}", .0.join(", "))]
    Validation(Vec<String>),

    /// Bad request with message
    #[error("{0}")]
    BadRequest(String),

    /// Request body is not parseable JSON
    #[error("unable to parse JSON/invalid JSON format")]
    MalformedJson,

    /// Missing or invalid credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated caller is not the owner
    #[error("you're not allowed to perform this action")]
    NotAllowed,

    /// Request path refused by shape
    #[error("forbidden")]
    Forbidden,

    /// Resource not found (or not visible)
    #[error("{0}")]
    NotFound(String),

    /// Duplicate resource
    #[error("{0}")]
    Conflict(String),

    /// Internal server error
    #[error("{}", INTERNAL_MESSAGE)]
    InternalServerError,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => ErrorKind::Validation,
            ApiError::MalformedJson => ErrorKind::MalformedBody,
            ApiError::Unauthorized(_) => ErrorKind::Authentication,
            ApiError::NotAllowed => ErrorKind::Authorization,
            ApiError::Forbidden => ErrorKind::Forbidden,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::Conflict(_) => ErrorKind::Conflict,
            ApiError::InternalServerError => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.kind().status()
    }

    /// Build a validation error from `(field, check)` pairs, keeping only failures
    pub fn from_checks(checks: Vec<(&str, Result<(), String>)>) -> Result<(), ApiError> {
        let errors: Vec<String> = checks
            .into_iter()
            .filter_map(|(field, check)| check.err().map(|reason| format!("{} : {}", field, reason)))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation(errors) => json!({ "errors": errors }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonSyntaxError(_) => ApiError::MalformedJson,
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
