//! PostgreSQL photo repository

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::PhotoRepository;
use crate::{
    identity::RequestIdentity,
    models::photo::{NewPhoto, Photo, PhotoPatch, PhotoWithOwner},
    visibility::visible_to_requester,
};

const PHOTO_COLUMNS: &str =
    "p.id, p.title, p.caption, p.photo_path, p.user_id, p.is_private, p.created_at, p.updated_at";

/// Photo repository backed by PostgreSQL
#[derive(Clone)]
pub struct PgPhotoRepository {
    pool: PgPool,
}

impl PgPhotoRepository {
    /// Create a new photo repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PhotoRepository for PgPhotoRepository {
    async fn create(&self, photo: &NewPhoto) -> DatabaseResult<Photo> {
        let query = format!(
            r#"
            INSERT INTO photos AS p (id, title, caption, photo_path, user_id, is_private)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            PHOTO_COLUMNS
        );

        sqlx::query_as::<_, Photo>(&query)
            .bind(photo.id)
            .bind(&photo.title)
            .bind(&photo.caption)
            .bind(&photo.photo_path)
            .bind(photo.user_id)
            .bind(photo.is_private)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn list_public(&self) -> DatabaseResult<Vec<PhotoWithOwner>> {
        let query = format!(
            r#"
            SELECT {}, u.username AS owner_username
            FROM photos p
            JOIN users u ON u.id = p.user_id
            WHERE NOT p.is_private
            ORDER BY p.created_at DESC
            "#,
            PHOTO_COLUMNS
        );

        sqlx::query_as::<_, PhotoWithOwner>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn list_for_owner(
        &self,
        requester: &RequestIdentity,
        owner_id: Uuid,
    ) -> DatabaseResult<Vec<Photo>> {
        let query = format!(
            r#"
            SELECT {}
            FROM photos p
            WHERE p.user_id = $1 AND {}
            ORDER BY p.created_at DESC
            "#,
            PHOTO_COLUMNS,
            visible_to_requester(2)
        );

        sqlx::query_as::<_, Photo>(&query)
            .bind(owner_id)
            .bind(requester.user_id())
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn find_by_id(&self, photo_id: Uuid) -> DatabaseResult<Option<Photo>> {
        let query = format!("SELECT {} FROM photos p WHERE p.id = $1", PHOTO_COLUMNS);

        sqlx::query_as::<_, Photo>(&query)
            .bind(photo_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn find_viewable(
        &self,
        requester: &RequestIdentity,
        photo_id: Uuid,
    ) -> DatabaseResult<Option<Photo>> {
        let query = format!(
            r#"
            SELECT {}
            FROM photos p
            WHERE p.id = $1 AND {}
            "#,
            PHOTO_COLUMNS,
            visible_to_requester(2)
        );

        sqlx::query_as::<_, Photo>(&query)
            .bind(photo_id)
            .bind(requester.user_id())
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn update(&self, photo_id: Uuid, patch: &PhotoPatch) -> DatabaseResult<bool> {
        if patch.is_empty() {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM photos WHERE id = $1)")
                    .bind(photo_id)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(DatabaseError::from_query)?;
            return Ok(exists);
        }

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE photos SET updated_at = NOW()");
        if let Some(title) = &patch.title {
            builder.push(", title = ").push_bind(title.clone());
        }
        if let Some(caption) = &patch.caption {
            builder.push(", caption = ").push_bind(caption.clone());
        }
        if let Some(is_private) = patch.is_private {
            builder.push(", is_private = ").push_bind(is_private);
        }
        builder.push(" WHERE id = ").push_bind(photo_id);

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, photo_id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM photos WHERE id = $1")
            .bind(photo_id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        Ok(result.rows_affected() > 0)
    }
}
