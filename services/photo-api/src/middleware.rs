//! Authentication middleware and the static photo access guard

use std::sync::OnceLock;

use auth::{JwtService, validation::is_well_formed_token};
use axum::{
    extract::{OriginalUri, Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use regex::Regex;
use tracing::warn;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    identity::RequestIdentity,
    state::AppState,
};

const INVALID_TOKEN_FORMAT: &str = r#"invalid token format: please use "Bearer <your-token-here>""#;

/// Whether a route demands a caller identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Required,
    Optional,
}

/// Resolve the caller's identity from the `Authorization` header
///
/// In optional mode only a missing header yields an anonymous caller; a header
/// that is present but malformed or invalid is always rejected.
pub fn authenticate(
    headers: &HeaderMap,
    jwt: &JwtService,
    mode: AuthMode,
) -> ApiResult<RequestIdentity> {
    let header = match headers.get(AUTHORIZATION) {
        Some(value) if !value.is_empty() => value
            .to_str()
            .map_err(|_| ApiError::BadRequest(INVALID_TOKEN_FORMAT.to_string()))?,
        _ => {
            return match mode {
                AuthMode::Required => Err(ApiError::Unauthorized("empty token".to_string())),
                AuthMode::Optional => Ok(RequestIdentity::Anonymous),
            };
        }
    };

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::BadRequest(INVALID_TOKEN_FORMAT.to_string()))?;

    if !is_well_formed_token(token) {
        return Err(ApiError::BadRequest("invalid token".to_string()));
    }

    let claims = jwt.validate_token(token).map_err(|e| {
        warn!("Failed to validate token: {}", e);
        ApiError::Unauthorized("invalid or expired token".to_string())
    })?;

    Ok(RequestIdentity::User(claims.sub))
}

/// Reject requests without a valid bearer token
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = authenticate(req.headers(), &state.jwt_service, AuthMode::Required)?;
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Attach the caller's identity when a token is supplied
pub async fn optional_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = authenticate(req.headers(), &state.jwt_service, AuthMode::Optional)?;
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Static file request that passed the shape check
#[derive(Debug, PartialEq, Eq)]
pub struct FileRequest {
    pub photo_id: Uuid,
    /// Path below the photo root, as stored on the photo row
    pub relative_path: String,
}

/// Match `/photos/<owner-id>/<photo-id>[.<ext>]` with canonical UUID segments
pub fn parse_file_path(path: &str) -> Option<FileRequest> {
    static FILE_PATH_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = FILE_PATH_REGEX.get_or_init(|| {
        let uuid = "[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}";
        Regex::new(&format!(
            r"^/photos/(?P<relative>{uuid}/(?P<photo>{uuid})(?:\.[A-Za-z0-9]{{1,10}})?)$"
        ))
        .expect("Failed to compile photo path regex")
    });

    let captures = regex.captures(path)?;
    let photo_id = Uuid::parse_str(captures.name("photo")?.as_str()).ok()?;

    Some(FileRequest {
        photo_id,
        relative_path: captures.name("relative")?.as_str().to_string(),
    })
}

/// Gate in front of the static photo files
///
/// Runs the shape check before any token or database work, then optional
/// authentication, then the visibility lookup.
pub async fn photo_access_guard(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.0.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let file = parse_file_path(&path).ok_or(ApiError::Forbidden)?;
    let identity = authenticate(req.headers(), &state.jwt_service, AuthMode::Optional)?;

    state
        .photo_controller
        .authorize_file(&identity, file.photo_id, &file.relative_path)
        .await?;

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth::JwtConfig;
    use axum::http::HeaderValue;

    fn jwt() -> JwtService {
        JwtService::new(JwtConfig {
            secret: "middleware-test-secret".to_string(),
            token_expiry: 3600,
        })
        .unwrap()
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_missing_header_depends_on_mode() {
        let jwt = jwt();
        let empty = HeaderMap::new();

        assert_eq!(
            authenticate(&empty, &jwt, AuthMode::Optional).unwrap(),
            RequestIdentity::Anonymous
        );
        match authenticate(&empty, &jwt, AuthMode::Required) {
            Err(ApiError::Unauthorized(message)) => assert_eq!(message, "empty token"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_valid_token_yields_user() {
        let jwt = jwt();
        let user_id = Uuid::new_v4();
        let token = jwt.issue_token(user_id).unwrap();

        for mode in [AuthMode::Required, AuthMode::Optional] {
            let identity =
                authenticate(&headers(&format!("Bearer {}", token)), &jwt, mode).unwrap();
            assert_eq!(identity, RequestIdentity::User(user_id));
        }
    }

    #[test]
    fn test_bad_tokens_are_rejected_even_when_optional() {
        let jwt = jwt();

        let err = authenticate(&headers("Token abc"), &jwt, AuthMode::Optional).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref m) if m == INVALID_TOKEN_FORMAT));

        let err = authenticate(&headers("Bearer not a token"), &jwt, AuthMode::Optional)
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref m) if m == "invalid token"));

        let err = authenticate(&headers("Bearer aaaa.bbbb.cccc"), &jwt, AuthMode::Optional)
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn test_parse_file_path() {
        let owner = Uuid::new_v4();
        let photo = Uuid::new_v4();

        let parsed = parse_file_path(&format!("/photos/{}/{}.jpg", owner, photo)).unwrap();
        assert_eq!(parsed.photo_id, photo);
        assert_eq!(parsed.relative_path, format!("{}/{}.jpg", owner, photo));

        let parsed = parse_file_path(&format!("/photos/{}/{}", owner, photo)).unwrap();
        assert_eq!(parsed.relative_path, format!("{}/{}", owner, photo));
    }

    #[test]
    fn test_parse_file_path_rejects_bad_shapes() {
        let owner = Uuid::new_v4();
        let photo = Uuid::new_v4();

        let rejected = [
            format!("/photos/{}", photo),
            format!("/photos/not-a-uuid/{}.jpg", photo),
            format!("/photos/{}/{}-extra.jpg", owner, photo),
            format!("/photos/{}/{}/../secret", owner, photo),
            format!("/photos/{}/{}.jp/g", owner, photo),
            format!("/elsewhere/{}/{}.jpg", owner, photo),
        ];

        for path in rejected {
            assert!(parse_file_path(&path).is_none(), "accepted {}", path);
        }
    }
}
