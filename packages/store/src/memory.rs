use crate::error::{StoreError, StoreResult};
use crate::model::{
    is_valid_slug, AppFile, AppId, AppVersion, Application, MetadataUpdate, NewApplication,
    VersionId, VersionState,
};
use crate::paths::FilePath;
use crate::scaffold::scaffold_files;
use crate::store::AppStore;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument};
use uuid::Uuid;

#[derive(Default)]
struct State {
    apps: BTreeMap<AppId, Application>,
    versions: BTreeMap<VersionId, AppVersion>,
    files: BTreeMap<VersionId, BTreeMap<String, AppFile>>,
}

impl State {
    fn app(&self, id: AppId) -> StoreResult<&Application> {
        self.apps
            .get(&id)
            .ok_or_else(|| StoreError::AppNotFound(id.to_string()))
    }

    fn app_mut(&mut self, id: AppId) -> StoreResult<&mut Application> {
        self.apps
            .get_mut(&id)
            .ok_or_else(|| StoreError::AppNotFound(id.to_string()))
    }

    fn version(&self, id: VersionId) -> StoreResult<&AppVersion> {
        self.versions.get(&id).ok_or(StoreError::VersionNotFound(id))
    }

    /// File table of a version that may be written to
    fn draft_files(&mut self, version_id: VersionId) -> StoreResult<&mut BTreeMap<String, AppFile>> {
        if !self.version(version_id)?.is_draft() {
            return Err(StoreError::ReadOnlyVersion(version_id));
        }
        Ok(self.files.entry(version_id).or_default())
    }

    fn touch_owner(&mut self, version_id: VersionId) {
        if let Some(app_id) = self.versions.get(&version_id).map(|v| v.app_id) {
            if let Some(app) = self.apps.get_mut(&app_id) {
                app.updated_at = Utc::now();
            }
        }
    }
}

/// Same module key under a different extension
fn colliding_path<'a>(
    files: &'a BTreeMap<String, AppFile>,
    path: &FilePath,
    ignore: Option<&str>,
) -> Option<&'a str> {
    let key = path.module_key();
    files
        .keys()
        .map(String::as_str)
        .filter(|existing| *existing != path.as_str() && Some(*existing) != ignore)
        .find(|existing| pagewright_common::module_key(existing) == key)
}

/// Store kept entirely in memory. One mutex guards all tables, so every
/// operation (publish included) is a single critical section.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_file(
        &self,
        version_id: VersionId,
        path: &str,
        source: &str,
        create_only: bool,
    ) -> StoreResult<AppFile> {
        let path = FilePath::parse(path)?;
        let mut state = self.lock();
        let files = state.draft_files(version_id)?;
        if create_only && files.contains_key(path.as_str()) {
            return Err(StoreError::FileExists(path.to_string()));
        }
        if let Some(existing) = colliding_path(files, &path, None) {
            return Err(StoreError::PathCollision {
                path: path.to_string(),
                existing: existing.to_string(),
            });
        }

        let file = AppFile::new(version_id, path.as_str(), source);
        files.insert(path.to_string(), file.clone());
        state.touch_owner(version_id);
        debug!(version_id = %version_id, path = %path, hash = %file.content_hash, "Wrote file");
        Ok(file)
    }
}

impl AppStore for InMemoryStore {
    #[instrument(skip(self, input), fields(slug = %input.slug))]
    fn create_application(&self, input: NewApplication) -> StoreResult<Application> {
        if !is_valid_slug(&input.slug) {
            return Err(StoreError::InvalidSlug(input.slug));
        }

        let mut state = self.lock();
        if state.apps.values().any(|app| app.slug == input.slug) {
            return Err(StoreError::DuplicateSlug(input.slug));
        }

        let now = Utc::now();
        let app_id = Uuid::new_v4();
        let draft = AppVersion {
            id: Uuid::new_v4(),
            app_id,
            number: 0,
            state: VersionState::Draft,
            created_at: now,
            published_at: None,
        };
        let files = scaffold_files()
            .into_iter()
            .map(|(path, source)| (path.to_string(), AppFile::new(draft.id, path, source)))
            .collect();

        let app = Application {
            id: app_id,
            slug: input.slug,
            name: input.name,
            description: input.description,
            scope: input.scope,
            access: input.access,
            navigation: Vec::new(),
            active_version_id: None,
            draft_version_id: Some(draft.id),
            created_at: now,
            updated_at: now,
        };

        state.files.insert(draft.id, files);
        state.versions.insert(draft.id, draft);
        state.apps.insert(app_id, app.clone());
        info!(app_id = %app_id, "Created application");
        Ok(app)
    }

    fn get_application(&self, id: AppId) -> StoreResult<Application> {
        self.lock().app(id).cloned()
    }

    fn get_application_by_slug(&self, slug: &str) -> StoreResult<Application> {
        self.lock()
            .apps
            .values()
            .find(|app| app.slug == slug)
            .cloned()
            .ok_or_else(|| StoreError::AppNotFound(slug.to_string()))
    }

    fn list_applications(&self) -> Vec<Application> {
        let mut apps: Vec<_> = self.lock().apps.values().cloned().collect();
        apps.sort_by(|a, b| a.slug.cmp(&b.slug));
        apps
    }

    fn update_metadata(&self, id: AppId, update: MetadataUpdate) -> StoreResult<Application> {
        let mut state = self.lock();
        let app = state.app_mut(id)?;
        if let Some(name) = update.name {
            app.name = name;
        }
        if let Some(description) = update.description {
            app.description = Some(description);
        }
        if let Some(access) = update.access {
            app.access = access;
        }
        if let Some(navigation) = update.navigation {
            app.navigation = navigation;
        }
        app.updated_at = Utc::now();
        Ok(app.clone())
    }

    fn delete_application(&self, id: AppId) -> StoreResult<()> {
        let mut state = self.lock();
        state.app(id)?;
        let owned: Vec<VersionId> = state
            .versions
            .values()
            .filter(|v| v.app_id == id)
            .map(|v| v.id)
            .collect();
        for version_id in &owned {
            state.versions.remove(version_id);
            state.files.remove(version_id);
        }
        state.apps.remove(&id);
        info!(app_id = %id, versions = owned.len(), "Deleted application");
        Ok(())
    }

    fn get_version(&self, id: VersionId) -> StoreResult<AppVersion> {
        self.lock().version(id).cloned()
    }

    fn list_versions(&self, app_id: AppId) -> StoreResult<Vec<AppVersion>> {
        let state = self.lock();
        state.app(app_id)?;
        let mut versions: Vec<_> = state
            .versions
            .values()
            .filter(|v| v.app_id == app_id)
            .cloned()
            .collect();
        versions.sort_by_key(|v| v.number);
        Ok(versions)
    }

    fn list_files(&self, version_id: VersionId) -> StoreResult<Vec<AppFile>> {
        let state = self.lock();
        state.version(version_id)?;
        Ok(state
            .files
            .get(&version_id)
            .map(|files| files.values().cloned().collect())
            .unwrap_or_default())
    }

    fn get_file(&self, version_id: VersionId, path: &str) -> StoreResult<AppFile> {
        let state = self.lock();
        state.version(version_id)?;
        state
            .files
            .get(&version_id)
            .and_then(|files| files.get(path))
            .cloned()
            .ok_or_else(|| StoreError::FileNotFound {
                version_id,
                path: path.to_string(),
            })
    }

    fn put_file(&self, version_id: VersionId, path: &str, source: &str) -> StoreResult<AppFile> {
        self.write_file(version_id, path, source, false)
    }

    fn create_file(&self, version_id: VersionId, path: &str, source: &str) -> StoreResult<AppFile> {
        self.write_file(version_id, path, source, true)
    }

    fn delete_file(&self, version_id: VersionId, path: &str) -> StoreResult<()> {
        let mut state = self.lock();
        let files = state.draft_files(version_id)?;
        if files.remove(path).is_none() {
            return Err(StoreError::FileNotFound {
                version_id,
                path: path.to_string(),
            });
        }
        state.touch_owner(version_id);
        debug!(version_id = %version_id, path, "Deleted file");
        Ok(())
    }

    fn rename_file(&self, version_id: VersionId, from: &str, to: &str) -> StoreResult<AppFile> {
        let target = FilePath::parse(to)?;
        let mut state = self.lock();
        let files = state.draft_files(version_id)?;
        let source = files
            .get(from)
            .map(|file| file.source.clone())
            .ok_or_else(|| StoreError::FileNotFound {
                version_id,
                path: from.to_string(),
            })?;
        if from != target.as_str() && files.contains_key(target.as_str()) {
            return Err(StoreError::FileExists(target.to_string()));
        }
        if let Some(existing) = colliding_path(files, &target, Some(from)) {
            return Err(StoreError::PathCollision {
                path: target.to_string(),
                existing: existing.to_string(),
            });
        }

        files.remove(from);
        let file = AppFile::new(version_id, target.as_str(), source);
        files.insert(target.to_string(), file.clone());
        state.touch_owner(version_id);
        debug!(version_id = %version_id, from, to, "Renamed file");
        Ok(file)
    }

    #[instrument(skip(self))]
    fn publish(&self, app_id: AppId) -> StoreResult<AppVersion> {
        let mut state = self.lock();
        let draft_id = state
            .app(app_id)?
            .draft_version_id
            .ok_or(StoreError::NoDraft(app_id))?;

        let number = state
            .versions
            .values()
            .filter(|v| v.app_id == app_id)
            .map(|v| v.number)
            .max()
            .unwrap_or(0)
            + 1;
        let now = Utc::now();
        let version = AppVersion {
            id: Uuid::new_v4(),
            app_id,
            number,
            state: VersionState::Published,
            created_at: now,
            published_at: Some(now),
        };

        let snapshot: BTreeMap<String, AppFile> = state
            .files
            .get(&draft_id)
            .map(|files| {
                files
                    .iter()
                    .map(|(path, file)| {
                        let mut copy = file.clone();
                        copy.version_id = version.id;
                        (path.clone(), copy)
                    })
                    .collect()
            })
            .unwrap_or_default();
        let file_count = snapshot.len();

        state.files.insert(version.id, snapshot);
        state.versions.insert(version.id, version.clone());
        let app = state.app_mut(app_id)?;
        app.active_version_id = Some(version.id);
        app.updated_at = now;

        info!(version_id = %version.id, number, files = file_count, "Published version");
        Ok(version)
    }

    #[instrument(skip(self))]
    fn set_active(&self, app_id: AppId, version_id: VersionId) -> StoreResult<Application> {
        let mut state = self.lock();
        let version = state.version(version_id)?;
        if version.app_id != app_id {
            return Err(StoreError::ForeignVersion { version_id, app_id });
        }
        if version.state != VersionState::Published {
            return Err(StoreError::NotPublished(version_id));
        }

        let app = state.app_mut(app_id)?;
        app.active_version_id = Some(version_id);
        app.updated_at = Utc::now();
        info!(version_id = %version_id, "Active version changed");
        Ok(app.clone())
    }
}
