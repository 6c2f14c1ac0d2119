//! Request and response payloads for the photo API

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod photo;
pub mod user;

use photo::{Photo, PhotoWithOwner};

/// Registration request
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Registration response
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Profile update request
///
/// `password` is the current password and is always required. Empty optional
/// fields are treated as absent.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub password: String,
    pub new_password: Option<String>,
}

/// Photo upload response
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePhotoResponse {
    pub photo_id: Uuid,
}

/// Owner summary attached to public listings
#[derive(Debug, Serialize, Deserialize)]
pub struct OwnerResponse {
    pub username: String,
}

/// Photo as returned by listing endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct PhotoResponse {
    pub photo_id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub photo_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerResponse>,
}

impl From<Photo> for PhotoResponse {
    fn from(photo: Photo) -> Self {
        Self {
            photo_id: photo.id,
            photo_path: photo.url_path(),
            title: photo.title,
            caption: photo.caption,
            owner: None,
        }
    }
}

impl From<PhotoWithOwner> for PhotoResponse {
    fn from(item: PhotoWithOwner) -> Self {
        let mut response = PhotoResponse::from(item.photo);
        response.owner = Some(OwnerResponse {
            username: item.owner_username,
        });
        response
    }
}

/// Photo listing response
#[derive(Debug, Serialize, Deserialize)]
pub struct PhotoListResponse {
    pub photos: Vec<PhotoResponse>,
}

impl<T: Into<PhotoResponse>> FromIterator<T> for PhotoListResponse {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            photos: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Trim an optional field, mapping blank values to `None`
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
