//! Typed identity of the caller, attached to each request by the auth middleware

use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Who is making the request
///
/// `Anonymous` is a normal state for public reads, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestIdentity {
    #[default]
    Anonymous,
    User(Uuid),
}

impl RequestIdentity {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            RequestIdentity::Anonymous => None,
            RequestIdentity::User(id) => Some(*id),
        }
    }

    /// The caller's id, or an authentication error for anonymous callers
    pub fn require(&self) -> ApiResult<Uuid> {
        self.user_id()
            .ok_or_else(|| ApiError::Unauthorized("authentication required".to_string()))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestIdentity>()
            .copied()
            .unwrap_or_default())
    }
}
