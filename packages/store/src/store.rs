use crate::error::StoreResult;
use crate::model::{
    AppFile, AppId, AppVersion, Application, MetadataUpdate, NewApplication, VersionId,
};

/// Persistence for applications, their versions and files.
///
/// Every file mutation is validated against the path rules and the
/// draft-only rule before anything is written. Non-draft versions are
/// read-only; writing to one is an error.
pub trait AppStore: Send + Sync {
    /// Create an application with a scaffolded draft and no active version
    fn create_application(&self, input: NewApplication) -> StoreResult<Application>;
    fn get_application(&self, id: AppId) -> StoreResult<Application>;
    fn get_application_by_slug(&self, slug: &str) -> StoreResult<Application>;
    fn list_applications(&self) -> Vec<Application>;
    fn update_metadata(&self, id: AppId, update: MetadataUpdate) -> StoreResult<Application>;
    /// Removes the application together with every version and file
    fn delete_application(&self, id: AppId) -> StoreResult<()>;

    fn get_version(&self, id: VersionId) -> StoreResult<AppVersion>;
    /// Versions of one application ordered by number (draft first)
    fn list_versions(&self, app_id: AppId) -> StoreResult<Vec<AppVersion>>;

    /// Files of one version ordered by path
    fn list_files(&self, version_id: VersionId) -> StoreResult<Vec<AppFile>>;
    fn get_file(&self, version_id: VersionId, path: &str) -> StoreResult<AppFile>;
    /// Create or overwrite a file; concurrent writers resolve last-write-wins
    fn put_file(&self, version_id: VersionId, path: &str, source: &str) -> StoreResult<AppFile>;
    /// Like `put_file` but fails when the path already exists
    fn create_file(&self, version_id: VersionId, path: &str, source: &str) -> StoreResult<AppFile>;
    fn delete_file(&self, version_id: VersionId, path: &str) -> StoreResult<()>;
    fn rename_file(&self, version_id: VersionId, from: &str, to: &str) -> StoreResult<AppFile>;

    /// Snapshot every draft file into a new published version and point
    /// the application at it, in one step. The draft stays open.
    fn publish(&self, app_id: AppId) -> StoreResult<AppVersion>;
    /// Point the application at an existing published version
    fn set_active(&self, app_id: AppId, version_id: VersionId) -> StoreResult<Application>;
}
