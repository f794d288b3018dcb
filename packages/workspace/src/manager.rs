use crate::error::{WorkspaceError, WorkspaceResult};
use crate::events::{draft_channel, live_channel, ChannelEvent, DraftEvent, FileChange, LiveEvent};
use crate::hub::BroadcastHub;
use chrono::Utc;
use pagewright_compiler::{CompileCache, CompileReport};
use pagewright_router::{build_routes, CollisionError, RouteTree};
use pagewright_store::{
    AppFile, AppId, AppStore, AppVersion, Application, MetadataUpdate, NewApplication, StoreError, VersionId,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, instrument};

/// Compile outcome of one file as reported to editors
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDiagnostic {
    pub path: String,
    #[serde(flatten)]
    pub report: CompileReport,
}

/// Draft/active lifecycle of applications on top of an [`AppStore`].
///
/// Every successful mutation is announced on the application's channels:
/// file changes on the draft channel, publish and rollback on the live
/// channel.
#[derive(Clone)]
pub struct VersionManager {
    store: Arc<dyn AppStore>,
    hub: BroadcastHub,
    cache: Arc<CompileCache>,
}

impl VersionManager {
    pub fn new(store: Arc<dyn AppStore>, hub: BroadcastHub, cache: Arc<CompileCache>) -> Self {
        Self { store, hub, cache }
    }

    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    pub fn cache(&self) -> &Arc<CompileCache> {
        &self.cache
    }

    pub fn store(&self) -> &Arc<dyn AppStore> {
        &self.store
    }

    // ---- applications ----

    #[instrument(skip(self, input), fields(slug = %input.slug))]
    pub fn create_application(&self, input: NewApplication) -> WorkspaceResult<Application> {
        let app = self.store.create_application(input)?;
        info!(app_id = %app.id, "Created application");
        Ok(app)
    }

    pub fn application(&self, id: AppId) -> WorkspaceResult<Application> {
        Ok(self.store.get_application(id)?)
    }

    pub fn application_by_slug(&self, slug: &str) -> WorkspaceResult<Application> {
        Ok(self.store.get_application_by_slug(slug)?)
    }

    pub fn applications(&self) -> Vec<Application> {
        self.store.list_applications()
    }

    pub fn update_metadata(&self, id: AppId, update: MetadataUpdate) -> WorkspaceResult<Application> {
        Ok(self.store.update_metadata(id, update)?)
    }

    pub fn delete_application(&self, id: AppId) -> WorkspaceResult<()> {
        self.store.delete_application(id)?;
        self.hub.close(&draft_channel(id));
        self.hub.close(&live_channel(id));
        info!(app_id = %id, "Deleted application");
        Ok(())
    }

    // ---- versions ----

    pub fn versions(&self, app_id: AppId) -> WorkspaceResult<Vec<AppVersion>> {
        Ok(self.store.list_versions(app_id)?)
    }

    pub fn version(&self, id: VersionId) -> WorkspaceResult<AppVersion> {
        Ok(self.store.get_version(id)?)
    }

    pub fn draft_version(&self, app_id: AppId) -> WorkspaceResult<VersionId> {
        self.application(app_id)?
            .draft_version_id
            .ok_or(WorkspaceError::Store(StoreError::NoDraft(app_id)))
    }

    pub fn active_version(&self, app_id: AppId) -> WorkspaceResult<VersionId> {
        self.application(app_id)?
            .active_version_id
            .ok_or(WorkspaceError::NotPublished(app_id))
    }

    pub fn files(&self, version_id: VersionId) -> WorkspaceResult<Vec<AppFile>> {
        Ok(self.store.list_files(version_id)?)
    }

    pub fn file(&self, version_id: VersionId, path: &str) -> WorkspaceResult<AppFile> {
        Ok(self.store.get_file(version_id, path)?)
    }

    /// `(path, source)` pairs of a version, the shape the shell mounts
    pub fn file_set(&self, version_id: VersionId) -> WorkspaceResult<Vec<(String, String)>> {
        Ok(self
            .files(version_id)?
            .into_iter()
            .map(|file| (file.path, file.source))
            .collect())
    }

    // ---- file mutations (draft only) ----

    /// Create or overwrite a file of the draft
    pub fn write_file(
        &self,
        version_id: VersionId,
        path: &str,
        source: &str,
        origin: Option<&str>,
    ) -> WorkspaceResult<AppFile> {
        let existed = self.store.get_file(version_id, path).is_ok();
        let file = self.store.put_file(version_id, path, source)?;
        let change = if existed { FileChange::Updated } else { FileChange::Created };
        self.file_changed(version_id, &file.path, change, Some(file.content_hash.clone()), origin)?;
        Ok(file)
    }

    /// Create a file that must not exist yet
    pub fn create_file(
        &self,
        version_id: VersionId,
        path: &str,
        source: &str,
        origin: Option<&str>,
    ) -> WorkspaceResult<AppFile> {
        let file = self.store.create_file(version_id, path, source)?;
        self.file_changed(version_id, &file.path, FileChange::Created, Some(file.content_hash.clone()), origin)?;
        Ok(file)
    }

    pub fn delete_file(&self, version_id: VersionId, path: &str, origin: Option<&str>) -> WorkspaceResult<()> {
        self.store.delete_file(version_id, path)?;
        self.file_changed(version_id, path, FileChange::Deleted, None, origin)
    }

    pub fn rename_file(
        &self,
        version_id: VersionId,
        from: &str,
        to: &str,
        origin: Option<&str>,
    ) -> WorkspaceResult<AppFile> {
        let file = self.store.rename_file(version_id, from, to)?;
        let change = FileChange::Renamed { from: from.to_string() };
        self.file_changed(version_id, &file.path, change, Some(file.content_hash.clone()), origin)?;
        Ok(file)
    }

    fn file_changed(
        &self,
        version_id: VersionId,
        path: &str,
        change: FileChange,
        content_hash: Option<String>,
        origin: Option<&str>,
    ) -> WorkspaceResult<()> {
        let app_id = self.store.get_version(version_id)?.app_id;
        let event = DraftEvent::FileChanged {
            app_id,
            version_id,
            path: path.to_string(),
            change,
            content_hash,
            origin: origin.map(str::to_string),
            at: Utc::now(),
        };
        self.hub.publish(&draft_channel(app_id), event);
        Ok(())
    }

    // ---- publish / rollback ----

    /// Snapshot the draft into a new active version. The draft stays open.
    #[instrument(skip(self))]
    pub fn publish(&self, app_id: AppId) -> WorkspaceResult<AppVersion> {
        let version = self.store.publish(app_id)?;
        let reached = self.hub.publish(
            &live_channel(app_id),
            LiveEvent::Published {
                app_id,
                version_id: version.id,
                number: version.number,
                at: Utc::now(),
            },
        );
        info!(version_id = %version.id, number = version.number, reached, "Published application");
        Ok(version)
    }

    /// Point the application back at an earlier published version
    #[instrument(skip(self))]
    pub fn rollback(&self, app_id: AppId, version_id: VersionId) -> WorkspaceResult<Application> {
        let app = self.store.set_active(app_id, version_id)?;
        self.hub.publish(
            &live_channel(app_id),
            LiveEvent::RolledBack {
                app_id,
                version_id,
                at: Utc::now(),
            },
        );
        info!(version_id = %version_id, "Rolled back application");
        Ok(app)
    }

    // ---- compilation and routing ----

    /// Compile every file of a version through the shared cache
    pub fn diagnostics(&self, version_id: VersionId) -> WorkspaceResult<Vec<FileDiagnostic>> {
        let files = self.file_set(version_id)?;
        let outcomes = self.cache.compile_files(&version_id.to_string(), &files);
        Ok(outcomes
            .into_iter()
            .map(|(path, outcome)| FileDiagnostic {
                path,
                report: CompileReport::from_result(outcome.as_deref()),
            })
            .collect())
    }

    /// Compile errors only, by path
    pub fn compile_errors(&self, version_id: VersionId) -> WorkspaceResult<BTreeMap<String, String>> {
        Ok(self
            .diagnostics(version_id)?
            .into_iter()
            .filter_map(|diagnostic| diagnostic.report.message.map(|message| (diagnostic.path, message)))
            .collect())
    }

    pub fn routes(&self, version_id: VersionId) -> WorkspaceResult<Result<RouteTree, CollisionError>> {
        let files = self.files(version_id)?;
        Ok(build_routes(files.iter().map(|file| file.path.as_str())))
    }

    // ---- channels ----

    pub fn subscribe_draft(&self, app_id: AppId) -> broadcast::Receiver<ChannelEvent> {
        self.hub.subscribe(&draft_channel(app_id))
    }

    pub fn subscribe_live(&self, app_id: AppId) -> broadcast::Receiver<ChannelEvent> {
        self.hub.subscribe(&live_channel(app_id))
    }
}
