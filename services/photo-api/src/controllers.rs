//! Controllers orchestrating repositories, the file store and credentials
//!
//! Handlers stay thin: they parse the request, pass the caller's identity
//! explicitly, and turn the controller result into a response.

use std::fmt::Display;

use tracing::error;

use crate::error::ApiError;

pub mod photo;
pub mod user;

pub use photo::{PhotoController, PhotoUpload};
pub use user::UserController;

/// Log an unexpected failure with its operation tag and hide it from the caller
pub(crate) fn internal(operation: &str, err: impl Display) -> ApiError {
    error!(operation, error = %err, "Unexpected failure");
    ApiError::InternalServerError
}
