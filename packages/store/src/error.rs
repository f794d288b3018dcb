use crate::model::{AppId, VersionId};
use crate::paths::PathError;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Application {0} not found")]
    AppNotFound(String),

    #[error("Version {0} not found")]
    VersionNotFound(VersionId),

    #[error("File '{path}' not found in version {version_id}")]
    FileNotFound { version_id: VersionId, path: String },

    #[error("Invalid path: {0}")]
    InvalidPath(#[from] PathError),

    #[error("'{path}' collides with existing file '{existing}'")]
    PathCollision { path: String, existing: String },

    #[error("File '{0}' already exists")]
    FileExists(String),

    #[error("Version {0} is read-only; only the draft can be modified")]
    ReadOnlyVersion(VersionId),

    #[error("Version {0} has not been published")]
    NotPublished(VersionId),

    #[error("Version {version_id} does not belong to application {app_id}")]
    ForeignVersion { version_id: VersionId, app_id: AppId },

    #[error("Application {0} has no draft")]
    NoDraft(AppId),

    #[error("Slug '{0}' is already taken")]
    DuplicateSlug(String),

    #[error("Slug '{0}' must be lowercase letters, digits and dashes")]
    InvalidSlug(String),
}

impl StoreError {
    /// Stable machine-readable identifier
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::AppNotFound(_) => "app_not_found",
            StoreError::VersionNotFound(_) => "version_not_found",
            StoreError::FileNotFound { .. } => "file_not_found",
            StoreError::InvalidPath(err) => err.code(),
            StoreError::PathCollision { .. } => "path_collision",
            StoreError::FileExists(_) => "file_exists",
            StoreError::ReadOnlyVersion(_) => "version_read_only",
            StoreError::NotPublished(_) => "version_not_published",
            StoreError::ForeignVersion { .. } => "version_not_in_app",
            StoreError::NoDraft(_) => "no_draft",
            StoreError::DuplicateSlug(_) => "slug_taken",
            StoreError::InvalidSlug(_) => "slug_invalid",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::AppNotFound(_) | StoreError::VersionNotFound(_) | StoreError::FileNotFound { .. }
        )
    }
}
