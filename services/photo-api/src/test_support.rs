//! In-memory repositories and an in-process app for router tests

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use auth::{JwtConfig, JwtService, password::hash_password};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::Utc;
use common::error::{DatabaseError, DatabaseResult};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    identity::RequestIdentity,
    models::{
        photo::{NewPhoto, Photo, PhotoPatch, PhotoWithOwner},
        user::{NewUser, User, UserChanges},
    },
    repositories::{PhotoRepository, UserRepository},
    routes::create_router,
    state::AppState,
    storage::PhotoStorage,
    visibility::can_view,
};

pub const TEST_PASSWORD: &str = "correct-horse";
pub const BOUNDARY: &str = "photo-test-boundary";

/// Users and photos held in memory, counting every repository call
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    photos: Mutex<Vec<Photo>>,
    queries: AtomicUsize,
}

impl MemoryStore {
    fn hit(&self) {
        self.queries.fetch_add(1, Ordering::SeqCst);
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn photo(&self, id: Uuid) -> Option<Photo> {
        self.photos.lock().unwrap().iter().find(|p| p.id == id).cloned()
    }

    pub fn user(&self, id: Uuid) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }

    pub fn insert_photo(&self, photo: Photo) {
        self.photos.lock().unwrap().push(photo);
    }

    pub fn insert_user(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }
}

fn newest_first(photos: &mut [Photo]) {
    photos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: &NewUser) -> DatabaseResult<User> {
        self.hit();
        let mut users = self.users.lock().unwrap();

        if users.iter().any(|u| u.username == user.username) {
            return Err(DatabaseError::Conflict("users_username_key".to_string()));
        }
        if users.iter().any(|u| u.email == user.email) {
            return Err(DatabaseError::Conflict("users_email_key".to_string()));
        }

        let created = User {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        self.hit();
        Ok(self.user(id))
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        self.hit();
        Ok(self.users.lock().unwrap().iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        self.hit();
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn update(&self, id: Uuid, changes: &UserChanges) -> DatabaseResult<bool> {
        self.hit();
        let mut users = self.users.lock().unwrap();

        let taken = users.iter().any(|u| {
            u.id != id
                && (changes.username.as_ref() == Some(&u.username)
                    || changes.email.as_ref() == Some(&u.email))
        });
        if taken {
            return Err(DatabaseError::Conflict("users_username_key".to_string()));
        }

        match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                changes.apply_to(user);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> DatabaseResult<bool> {
        self.hit();
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);

        self.photos.lock().unwrap().retain(|p| p.user_id != id);
        Ok(users.len() < before)
    }
}

#[async_trait]
impl PhotoRepository for MemoryStore {
    async fn create(&self, photo: &NewPhoto) -> DatabaseResult<Photo> {
        self.hit();
        let created = Photo {
            id: photo.id,
            title: photo.title.clone(),
            caption: photo.caption.clone(),
            photo_path: photo.photo_path.clone(),
            user_id: photo.user_id,
            is_private: photo.is_private,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.photos.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn list_public(&self) -> DatabaseResult<Vec<PhotoWithOwner>> {
        self.hit();
        let users = self.users.lock().unwrap();
        let mut photos: Vec<Photo> = self
            .photos
            .lock()
            .unwrap()
            .iter()
            .filter(|p| !p.is_private)
            .cloned()
            .collect();
        newest_first(&mut photos);

        Ok(photos
            .into_iter()
            .filter_map(|photo| {
                let owner = users.iter().find(|u| u.id == photo.user_id)?;
                Some(PhotoWithOwner {
                    owner_username: owner.username.clone(),
                    photo,
                })
            })
            .collect())
    }

    async fn list_for_owner(
        &self,
        requester: &RequestIdentity,
        owner_id: Uuid,
    ) -> DatabaseResult<Vec<Photo>> {
        self.hit();
        let mut photos: Vec<Photo> = self
            .photos
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.user_id == owner_id && can_view(requester, p.user_id, p.is_private))
            .cloned()
            .collect();
        newest_first(&mut photos);
        Ok(photos)
    }

    async fn find_by_id(&self, photo_id: Uuid) -> DatabaseResult<Option<Photo>> {
        self.hit();
        Ok(self.photo(photo_id))
    }

    async fn find_viewable(
        &self,
        requester: &RequestIdentity,
        photo_id: Uuid,
    ) -> DatabaseResult<Option<Photo>> {
        self.hit();
        Ok(self
            .photo(photo_id)
            .filter(|p| can_view(requester, p.user_id, p.is_private)))
    }

    async fn update(&self, photo_id: Uuid, patch: &PhotoPatch) -> DatabaseResult<bool> {
        self.hit();
        let mut photos = self.photos.lock().unwrap();

        match photos.iter_mut().find(|p| p.id == photo_id) {
            Some(photo) => {
                patch.apply_to(photo);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, photo_id: Uuid) -> DatabaseResult<bool> {
        self.hit();
        let mut photos = self.photos.lock().unwrap();
        let before = photos.len();
        photos.retain(|p| p.id != photo_id);
        Ok(photos.len() < before)
    }
}

/// Photo repository whose visibility lookup always fails; everything else
/// goes to the wrapped store
pub struct FailingLookups(pub Arc<MemoryStore>);

#[async_trait]
impl PhotoRepository for FailingLookups {
    async fn create(&self, photo: &NewPhoto) -> DatabaseResult<Photo> {
        PhotoRepository::create(self.0.as_ref(), photo).await
    }

    async fn list_public(&self) -> DatabaseResult<Vec<PhotoWithOwner>> {
        self.0.list_public().await
    }

    async fn list_for_owner(
        &self,
        requester: &RequestIdentity,
        owner_id: Uuid,
    ) -> DatabaseResult<Vec<Photo>> {
        self.0.list_for_owner(requester, owner_id).await
    }

    async fn find_by_id(&self, photo_id: Uuid) -> DatabaseResult<Option<Photo>> {
        PhotoRepository::find_by_id(self.0.as_ref(), photo_id).await
    }

    async fn find_viewable(
        &self,
        _requester: &RequestIdentity,
        _photo_id: Uuid,
    ) -> DatabaseResult<Option<Photo>> {
        Err(DatabaseError::Configuration("database unavailable".to_string()))
    }

    async fn update(&self, photo_id: Uuid, patch: &PhotoPatch) -> DatabaseResult<bool> {
        PhotoRepository::update(self.0.as_ref(), photo_id, patch).await
    }

    async fn delete(&self, photo_id: Uuid) -> DatabaseResult<bool> {
        PhotoRepository::delete(self.0.as_ref(), photo_id).await
    }
}

/// A seeded account with a valid session token
pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// The real router over in-memory repositories and a temporary photo root
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub storage: PhotoStorage,
    pub jwt: Arc<JwtService>,
    _dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_photos(|store| store as Arc<dyn PhotoRepository>)
    }

    /// Same app, with the photo repository swapped for a wrapper of the store
    pub fn with_photos(
        photos: impl FnOnce(Arc<MemoryStore>) -> Arc<dyn PhotoRepository>,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let storage = PhotoStorage::new(dir.path());
        let store = Arc::new(MemoryStore::default());
        let jwt = Arc::new(
            JwtService::new(JwtConfig {
                secret: "router-test-secret".to_string(),
                token_expiry: 3600,
            })
            .unwrap(),
        );

        let state = AppState::new(
            store.clone(),
            photos(store.clone()),
            storage.clone(),
            jwt.clone(),
        );
        let router = create_router(state, &storage, 1024 * 1024);

        Self {
            router,
            store,
            storage,
            jwt,
            _dir: dir,
        }
    }

    /// Insert a user directly, hashing [`TEST_PASSWORD`]
    pub fn seed_user(&self, username: &str) -> TestUser {
        let id = Uuid::new_v4();
        let email = format!("{}@example.com", username);
        self.store.insert_user(User {
            id,
            username: username.to_string(),
            email: email.clone(),
            password_hash: hash_password(TEST_PASSWORD).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });

        TestUser {
            id,
            username: username.to_string(),
            email,
            token: self.jwt.issue_token(id).unwrap(),
        }
    }

    /// Store a file and its row for `owner`
    pub async fn seed_photo(&self, owner: &TestUser, title: &str, is_private: bool) -> Photo {
        let id = Uuid::new_v4();
        let photo_path = self
            .storage
            .save(owner.id, id, Some("jpg"), title.as_bytes())
            .await
            .unwrap();

        let photo = Photo {
            id,
            title: title.to_string(),
            caption: None,
            photo_path,
            user_id: owner.id,
            is_private,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.store.insert_photo(photo.clone());
        photo
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, bytes) = self.send(request).await;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }
}

/// Build a request with an optional bearer header
pub fn request(method: &str, uri: &str, bearer: Option<&str>, body: Body) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(bearer) = bearer {
        builder = builder.header(header::AUTHORIZATION, bearer);
    }
    builder.body(body).unwrap()
}

/// Build a JSON request
pub fn json_request(method: &str, uri: &str, bearer: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(bearer) = bearer {
        builder = builder.header(header::AUTHORIZATION, bearer);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Encode text fields and an optional file part as multipart/form-data
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Body {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }

    if let Some((file_name, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, file_name, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    Body::from(body)
}

pub fn multipart_request(bearer: Option<&str>, body: Body) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/photos")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(bearer) = bearer {
        builder = builder.header(header::AUTHORIZATION, bearer);
    }
    builder.body(body).unwrap()
}
