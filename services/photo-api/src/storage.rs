//! Local file store for photo bytes
//!
//! Files live under one root directory as `<owner-id>/<photo-id>[.<ext>]`.
//! Paths handed out and accepted by this module are always relative to the
//! root and forward-slash separated.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// Custom error type for file store operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Underlying filesystem failure
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Path that would leave the photo root
    #[error("Invalid photo path: {0}")]
    InvalidPath(String),
}

/// Type alias for Result with StorageError
pub type StorageResult<T> = Result<T, StorageError>;

/// Photo file store rooted at one directory
#[derive(Debug, Clone)]
pub struct PhotoStorage {
    root: PathBuf,
}

impl PhotoStorage {
    /// Create a new file store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Extension to keep from an uploaded file name, lower-cased
    ///
    /// Anything that is not 1 to 10 ASCII alphanumerics is dropped.
    pub fn sanitize_extension(file_name: Option<&str>) -> Option<String> {
        let extension = Path::new(file_name?).extension()?.to_str()?;

        if extension.is_empty()
            || extension.len() > 10
            || !extension.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return None;
        }

        Some(extension.to_ascii_lowercase())
    }

    /// Relative path for a photo file
    pub fn relative_path(owner_id: Uuid, photo_id: Uuid, extension: Option<&str>) -> String {
        match extension {
            Some(ext) => format!("{}/{}.{}", owner_id, photo_id, ext),
            None => format!("{}/{}", owner_id, photo_id),
        }
    }

    /// Join a relative path under the root, refusing anything but plain segments
    pub fn resolve(&self, relative: &str) -> StorageResult<PathBuf> {
        let path = Path::new(relative);
        let mut components = path.components().peekable();

        if components.peek().is_none() {
            return Err(StorageError::InvalidPath(relative.to_string()));
        }

        if !components.all(|c| matches!(c, Component::Normal(_))) {
            return Err(StorageError::InvalidPath(relative.to_string()));
        }

        Ok(self.root.join(path))
    }

    /// Write photo bytes and return their relative path
    pub async fn save(
        &self,
        owner_id: Uuid,
        photo_id: Uuid,
        extension: Option<&str>,
        bytes: &[u8],
    ) -> StorageResult<String> {
        let relative = Self::relative_path(owner_id, photo_id, extension);
        let full_path = self.resolve(&relative)?;

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, bytes).await?;

        info!(photo_id = %photo_id, path = %relative, "Stored photo file");
        Ok(relative)
    }

    /// Remove one photo file; a missing file is an error
    pub async fn remove(&self, relative: &str) -> StorageResult<()> {
        let full_path = self.resolve(relative)?;
        tokio::fs::remove_file(&full_path).await?;

        info!(path = %relative, "Removed photo file");
        Ok(())
    }

    /// Remove every file belonging to an owner
    pub async fn remove_owner(&self, owner_id: Uuid) -> StorageResult<()> {
        let dir = self.resolve(&owner_id.to_string())?;

        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                info!(user_id = %owner_id, "Removed photo directory");
                Ok(())
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
