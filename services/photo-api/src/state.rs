//! Application state shared across handlers

use std::sync::Arc;

use auth::JwtService;

use crate::{
    controllers::{PhotoController, UserController},
    repositories::{PhotoRepository, UserRepository},
    storage::PhotoStorage,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub jwt_service: Arc<JwtService>,
    pub photo_controller: PhotoController,
    pub user_controller: UserController,
}

impl AppState {
    /// Wire controllers over the given repositories and file store
    pub fn new(
        users: Arc<dyn UserRepository>,
        photos: Arc<dyn PhotoRepository>,
        storage: PhotoStorage,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        let photo_controller = PhotoController::new(photos, users.clone(), storage.clone());
        let user_controller = UserController::new(users, storage, jwt_service.clone());

        Self {
            jwt_service,
            photo_controller,
            user_controller,
        }
    }
}
