//! Photo operations: listing, upload, owner-only mutation and file access

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use super::internal;
use crate::{
    error::{ApiError, ApiResult},
    identity::RequestIdentity,
    models::photo::{NewPhoto, Photo, PhotoPatch, PhotoWithOwner},
    repositories::{PhotoRepository, UserRepository},
    storage::PhotoStorage,
};

const PHOTO_NOT_FOUND: &str = "photo with specified ID can't be found";
const USER_NOT_FOUND: &str = "user with specified username can't be found";

fn photo_not_found() -> ApiError {
    ApiError::NotFound(PHOTO_NOT_FOUND.to_string())
}

fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("can't be empty".to_string());
    }

    if title.chars().count() > 255 {
        return Err("must be at most 255 characters long".to_string());
    }

    Ok(())
}

/// Parsed upload ready to be stored
#[derive(Debug, Default)]
pub struct PhotoUpload {
    pub title: String,
    pub caption: Option<String>,
    pub is_private: bool,
    /// Client-side file name, only used for its extension
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// Photo controller
#[derive(Clone)]
pub struct PhotoController {
    photos: Arc<dyn PhotoRepository>,
    users: Arc<dyn UserRepository>,
    storage: PhotoStorage,
}

impl PhotoController {
    pub fn new(
        photos: Arc<dyn PhotoRepository>,
        users: Arc<dyn UserRepository>,
        storage: PhotoStorage,
    ) -> Self {
        Self {
            photos,
            users,
            storage,
        }
    }

    /// Every public photo with its owner's username
    pub async fn list_public(&self) -> ApiResult<Vec<PhotoWithOwner>> {
        self.photos
            .list_public()
            .await
            .map_err(|e| internal("Photos [LIST]", e))
    }

    /// Photos of the named user that `requester` may see
    pub async fn list_by_username(
        &self,
        requester: &RequestIdentity,
        username: &str,
    ) -> ApiResult<Vec<Photo>> {
        let owner = self
            .users
            .find_by_username(username)
            .await
            .map_err(|e| internal("Photos [LIST BY USER]", e))?
            .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.to_string()))?;

        self.photos
            .list_for_owner(requester, owner.id)
            .await
            .map_err(|e| internal("Photos [LIST BY USER]", e))
    }

    /// The caller's own photos, private ones included
    pub async fn list_mine(&self, requester: &RequestIdentity) -> ApiResult<Vec<Photo>> {
        let user_id = requester.require()?;

        self.photos
            .list_for_owner(requester, user_id)
            .await
            .map_err(|e| internal("Photos [LIST MINE]", e))
    }

    /// Store the bytes, then record the photo; returns the new photo id
    ///
    /// A failed insert leaves the written file behind. No read path can reach
    /// it since every read goes through a photo row.
    pub async fn create(&self, requester: &RequestIdentity, upload: PhotoUpload) -> ApiResult<Uuid> {
        let owner_id = requester.require()?;
        ApiError::from_checks(vec![("title", validate_title(&upload.title))])?;

        let photo_id = Uuid::new_v4();
        let extension = PhotoStorage::sanitize_extension(upload.file_name.as_deref());
        let photo_path = self
            .storage
            .save(owner_id, photo_id, extension.as_deref(), &upload.bytes)
            .await
            .map_err(|e| internal("Photos [CREATE]", e))?;

        let new_photo = NewPhoto {
            id: photo_id,
            title: upload.title.trim().to_string(),
            caption: upload.caption,
            photo_path,
            user_id: owner_id,
            is_private: upload.is_private,
        };

        self.photos
            .create(&new_photo)
            .await
            .map_err(|e| internal("Photos [CREATE]", e))?;

        info!(photo_id = %photo_id, user_id = %owner_id, "Photo uploaded");
        Ok(photo_id)
    }

    /// Apply a partial update to one of the caller's photos
    pub async fn update(
        &self,
        requester: &RequestIdentity,
        photo_id: Uuid,
        patch: PhotoPatch,
    ) -> ApiResult<()> {
        let user_id = requester.require()?;
        let photo = self.owned_photo(user_id, photo_id, "Photos [UPDATE]").await?;

        let patch = PhotoPatch {
            title: patch.title.map(|title| title.trim().to_string()),
            ..patch
        };
        if let Some(title) = &patch.title {
            ApiError::from_checks(vec![("title", validate_title(title))])?;
        }
        if patch.is_empty() {
            return Ok(());
        }

        let updated = self
            .photos
            .update(photo.id, &patch)
            .await
            .map_err(|e| internal("Photos [UPDATE]", e))?;

        if !updated {
            return Err(photo_not_found());
        }

        info!(photo_id = %photo_id, "Photo updated");
        Ok(())
    }

    /// Delete one of the caller's photos, file first
    ///
    /// When the file cannot be removed the row is kept and the caller gets an
    /// internal error.
    pub async fn delete(&self, requester: &RequestIdentity, photo_id: Uuid) -> ApiResult<()> {
        let user_id = requester.require()?;
        let photo = self.owned_photo(user_id, photo_id, "Photos [DELETE]").await?;

        self.storage
            .remove(&photo.photo_path)
            .await
            .map_err(|e| internal("Photos [DELETE]", e))?;

        self.photos
            .delete(photo.id)
            .await
            .map_err(|e| internal("Photos [DELETE]", e))?;

        info!(photo_id = %photo_id, "Photo deleted");
        Ok(())
    }

    /// Decide whether `requester` may download the file at `relative_path`
    ///
    /// Hidden and absent photos are indistinguishable, and a visible photo
    /// only unlocks its own stored file. A failed lookup is logged and
    /// answered the same way.
    pub async fn authorize_file(
        &self,
        requester: &RequestIdentity,
        photo_id: Uuid,
        relative_path: &str,
    ) -> ApiResult<()> {
        let photo = self
            .photos
            .find_viewable(requester, photo_id)
            .await
            .unwrap_or_else(|e| {
                error!(operation = "Photos [FILE]", error = %e, "Photo lookup failed");
                None
            })
            .filter(|photo| photo.is_visible_to(requester))
            .ok_or_else(photo_not_found)?;

        if photo.photo_path != relative_path {
            return Err(photo_not_found());
        }

        Ok(())
    }

    async fn owned_photo(&self, user_id: Uuid, photo_id: Uuid, operation: &str) -> ApiResult<Photo> {
        let photo = self
            .photos
            .find_by_id(photo_id)
            .await
            .map_err(|e| internal(operation, e))?
            .ok_or_else(photo_not_found)?;

        if photo.user_id != user_id {
            warn!(photo_id = %photo_id, user_id = %user_id, "{}: caller is not the owner", operation);
            return Err(ApiError::NotAllowed);
        }

        Ok(photo)
    }
}
