//! Photo endpoints under `/api/v1/photos`

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post, put},
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use crate::{
    controllers::PhotoUpload,
    error::{ApiError, ApiResult},
    identity::RequestIdentity,
    middleware::{optional_auth, require_auth},
    models::{CreatePhotoResponse, PhotoListResponse, non_blank, photo::PhotoPatch},
    state::AppState,
};

/// Create the photo router
pub fn router(state: AppState) -> Router<AppState> {
    let required = from_fn_with_state(state.clone(), require_auth);
    let optional = from_fn_with_state(state, optional_auth);

    Router::new()
        .route(
            "/",
            get(list_public).merge(post(create_photo).route_layer(required.clone())),
        )
        .route("/my", get(list_mine).route_layer(required.clone()))
        .route("/by/:username", get(list_by_username).route_layer(optional))
        .route(
            "/:id",
            put(update_photo).delete(delete_photo).route_layer(required),
        )
}

/// List every public photo
pub async fn list_public(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let photos = state.photo_controller.list_public().await?;

    Ok(Json(photos.into_iter().collect::<PhotoListResponse>()))
}

/// List one user's photos as seen by the caller
pub async fn list_by_username(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let photos = state
        .photo_controller
        .list_by_username(&identity, &username)
        .await?;

    Ok(Json(photos.into_iter().collect::<PhotoListResponse>()))
}

/// List the caller's own photos
pub async fn list_mine(
    State(state): State<AppState>,
    identity: RequestIdentity,
) -> ApiResult<impl IntoResponse> {
    let photos = state.photo_controller.list_mine(&identity).await?;

    Ok(Json(photos.into_iter().collect::<PhotoListResponse>()))
}

/// Upload a photo
pub async fn create_photo(
    State(state): State<AppState>,
    identity: RequestIdentity,
    WithRejection(multipart, _): WithRejection<Multipart, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let upload = read_upload(multipart).await?;
    let photo_id = state.photo_controller.create(&identity, upload).await?;

    Ok((StatusCode::CREATED, Json(CreatePhotoResponse { photo_id })))
}

/// Partially update a photo
pub async fn update_photo(
    State(state): State<AppState>,
    identity: RequestIdentity,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
    WithRejection(Json(patch), _): WithRejection<Json<PhotoPatch>, ApiError>,
) -> ApiResult<StatusCode> {
    state.photo_controller.update(&identity, id, patch).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Delete a photo and its file
pub async fn delete_photo(
    State(state): State<AppState>,
    identity: RequestIdentity,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> ApiResult<StatusCode> {
    state.photo_controller.delete(&identity, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Parse a boolean form value
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Some(true),
        "false" | "f" | "0" | "" => Some(false),
        _ => None,
    }
}

async fn read_upload(mut multipart: Multipart) -> ApiResult<PhotoUpload> {
    let mut upload = PhotoUpload::default();
    let mut has_photo = false;
    let mut is_private = Ok(());

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "title" => upload.title = field.text().await?,
            "caption" => upload.caption = non_blank(Some(field.text().await?)),
            "is_private" => match parse_bool(&field.text().await?) {
                Some(value) => upload.is_private = value,
                None => is_private = Err("must be a boolean".to_string()),
            },
            "photo" => {
                let is_image = field
                    .content_type()
                    .is_some_and(|content_type| content_type.starts_with("image/"));
                if !is_image {
                    return Err(ApiError::BadRequest("photo must be an image".to_string()));
                }

                upload.file_name = field.file_name().map(str::to_string);
                upload.bytes = field.bytes().await?.to_vec();
                has_photo = true;
            }
            _ => {}
        }
    }

    let photo = if has_photo {
        Ok(())
    } else {
        Err("can't be empty".to_string())
    };
    ApiError::from_checks(vec![("is_private", is_private), ("photo", photo)])?;

    Ok(upload)
}
