//! Photo model and related functionality

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::FromRow;
use uuid::Uuid;

/// URL prefix under which photo files are served
pub const PHOTO_URL_PREFIX: &str = "/photos";

/// Photo entity
#[derive(Debug, Clone, FromRow)]
pub struct Photo {
    pub id: Uuid,
    pub title: String,
    pub caption: Option<String>,
    /// Path relative to the photo root, forward-slash separated
    pub photo_path: String,
    pub user_id: Uuid,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Photo {
    /// Public URL of the photo file
    pub fn url_path(&self) -> String {
        format!("{}/{}", PHOTO_URL_PREFIX, self.photo_path)
    }
}

/// Photo joined with its owner's display name
#[derive(Debug, Clone, FromRow)]
pub struct PhotoWithOwner {
    #[sqlx(flatten)]
    pub photo: Photo,
    pub owner_username: String,
}

/// New photo creation payload
#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub id: Uuid,
    pub title: String,
    pub caption: Option<String>,
    pub photo_path: String,
    pub user_id: Uuid,
    pub is_private: bool,
}

/// Partial photo update; absent fields stay untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhotoPatch {
    pub title: Option<String>,
    pub caption: Option<String>,
    pub is_private: Option<bool>,
}

impl PhotoPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.caption.is_none() && self.is_private.is_none()
    }

    /// Apply the patch to an in-memory photo
    pub fn apply_to(&self, photo: &mut Photo) {
        if let Some(title) = &self.title {
            photo.title = title.clone();
        }
        if let Some(caption) = &self.caption {
            photo.caption = Some(caption.clone());
        }
        if let Some(is_private) = self.is_private {
            photo.is_private = is_private;
        }
    }
}
