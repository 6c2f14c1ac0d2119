//! Repositories for database operations
//!
//! Controllers only see the traits below, so the HTTP layer can be exercised
//! against in-memory stores in tests.

use async_trait::async_trait;
use common::error::DatabaseResult;
use uuid::Uuid;

use crate::{
    identity::RequestIdentity,
    models::{
        photo::{NewPhoto, Photo, PhotoPatch, PhotoWithOwner},
        user::{NewUser, User, UserChanges},
    },
};

pub mod photo;
pub mod user;

pub use photo::PgPhotoRepository;
pub use user::PgUserRepository;

/// User persistence
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; duplicate username or email yields a conflict
    async fn create(&self, user: &NewUser) -> DatabaseResult<User>;

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>>;

    /// Apply profile changes, returns whether the user existed
    async fn update(&self, id: Uuid, changes: &UserChanges) -> DatabaseResult<bool>;

    /// Delete a user and, through the foreign key, all their photos
    async fn delete(&self, id: Uuid) -> DatabaseResult<bool>;
}

/// Photo persistence
///
/// Read operations take the requester's identity and filter by visibility
/// inside the query. Mutations are not filtered; ownership is checked by the
/// caller.
#[async_trait]
pub trait PhotoRepository: Send + Sync {
    async fn create(&self, photo: &NewPhoto) -> DatabaseResult<Photo>;

    /// All public photos with their owner's username, newest first
    async fn list_public(&self) -> DatabaseResult<Vec<PhotoWithOwner>>;

    /// Photos of `owner_id` that `requester` may see, newest first
    async fn list_for_owner(
        &self,
        requester: &RequestIdentity,
        owner_id: Uuid,
    ) -> DatabaseResult<Vec<Photo>>;

    /// Unfiltered lookup, for owner-only mutations
    async fn find_by_id(&self, photo_id: Uuid) -> DatabaseResult<Option<Photo>>;

    /// Fetch a photo by id only if `requester` may see it
    async fn find_viewable(
        &self,
        requester: &RequestIdentity,
        photo_id: Uuid,
    ) -> DatabaseResult<Option<Photo>>;

    /// Apply a partial update, returns whether the photo existed
    async fn update(&self, photo_id: Uuid, patch: &PhotoPatch) -> DatabaseResult<bool>;

    async fn delete(&self, photo_id: Uuid) -> DatabaseResult<bool>;
}
