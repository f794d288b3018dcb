use crate::error::{WorkspaceError, WorkspaceResult};
use crate::events::{draft_channel, ChannelEvent, DraftEvent, FileChange};
use crate::manager::VersionManager;
use pagewright_store::{AppId, FilePath, StoreError, VersionId};
use std::collections::{BTreeMap, VecDeque};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::broadcast::Receiver;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// A local edit not yet stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingEdit {
    Write { path: String, source: String },
    Delete { path: String },
    Rename { from: String, to: String },
}

impl PendingEdit {
    fn touches(&self, path: &str) -> bool {
        match self {
            PendingEdit::Write { path: p, .. } | PendingEdit::Delete { path: p } => p == path,
            PendingEdit::Rename { from, to } => from == path || to == path,
        }
    }

    fn paths(&self) -> Vec<&str> {
        match self {
            PendingEdit::Write { path, .. } | PendingEdit::Delete { path } => vec![path.as_str()],
            PendingEdit::Rename { from, to } => vec![from.as_str(), to.as_str()],
        }
    }
}

/// One editor's view of an application's draft.
///
/// Edits land in the local file map immediately and are queued; `flush`
/// stores them through the [`VersionManager`]. Changes made by other
/// sessions arrive on the draft channel and are refetched, while this
/// session's own changes are recognised by their origin and skipped.
pub struct EditSession {
    id: String,
    app_id: AppId,
    version_id: VersionId,
    manager: VersionManager,
    files: BTreeMap<String, String>,
    pending: VecDeque<PendingEdit>,
    events: Receiver<ChannelEvent>,
}

impl EditSession {
    #[instrument(skip(manager))]
    pub fn open(manager: VersionManager, app_id: AppId) -> WorkspaceResult<Self> {
        // subscribe first so nothing stored after the fetch is missed
        let events = manager.subscribe_draft(app_id);
        let version_id = manager.draft_version(app_id)?;
        let files = manager.file_set(version_id)?.into_iter().collect();
        let session = Self {
            id: Uuid::new_v4().to_string(),
            app_id,
            version_id,
            manager,
            files,
            pending: VecDeque::new(),
            events,
        };
        debug!(session = %session.id, files = session.files.len(), "Opened edit session");
        Ok(session)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn app_id(&self) -> AppId {
        self.app_id
    }

    pub fn version_id(&self) -> VersionId {
        self.version_id
    }

    pub fn files(&self) -> &BTreeMap<String, String> {
        &self.files
    }

    pub fn source(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn pending(&self) -> impl Iterator<Item = &PendingEdit> {
        self.pending.iter()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// `(path, source)` pairs of the local view
    pub fn file_set(&self) -> Vec<(String, String)> {
        self.files.iter().map(|(path, source)| (path.clone(), source.clone())).collect()
    }

    /// Fails with the path rule's code when `path` is not a valid file path;
    /// nothing is applied or queued then
    pub fn write(&mut self, path: &str, source: &str) -> WorkspaceResult<()> {
        let path = FilePath::parse(path).map_err(StoreError::from)?;
        let edit = PendingEdit::Write {
            path: path.to_string(),
            source: source.to_string(),
        };
        apply_local(&mut self.files, &edit);
        // consecutive writes to one file collapse into the last
        if let Some(PendingEdit::Write { path: last, source: queued }) = self.pending.back_mut() {
            if last.as_str() == path.as_str() {
                *queued = source.to_string();
                return Ok(());
            }
        }
        self.pending.push_back(edit);
        Ok(())
    }

    /// Returns false when the file does not exist locally
    pub fn delete(&mut self, path: &str) -> bool {
        if !self.files.contains_key(path) {
            return false;
        }
        let edit = PendingEdit::Delete { path: path.to_string() };
        apply_local(&mut self.files, &edit);
        self.pending.push_back(edit);
        true
    }

    /// Returns false when `from` does not exist or `to` is taken locally.
    /// An invalid `to` is an error.
    pub fn rename(&mut self, from: &str, to: &str) -> WorkspaceResult<bool> {
        let to = FilePath::parse(to).map_err(StoreError::from)?;
        if !self.files.contains_key(from) || self.files.contains_key(to.as_str()) {
            return Ok(false);
        }
        let edit = PendingEdit::Rename {
            from: from.to_string(),
            to: to.to_string(),
        };
        apply_local(&mut self.files, &edit);
        self.pending.push_back(edit);
        Ok(true)
    }

    /// Store queued edits in order. The first rejected edit is dropped,
    /// its files are restored from the store and the error is returned;
    /// later edits stay queued.
    #[instrument(skip(self), fields(session = %self.id, pending = self.pending.len()))]
    pub fn flush(&mut self) -> WorkspaceResult<usize> {
        let mut stored = 0;
        while let Some(edit) = self.pending.pop_front() {
            let origin = Some(self.id.as_str());
            let result = match &edit {
                PendingEdit::Write { path, source } => self
                    .manager
                    .write_file(self.version_id, path, source, origin)
                    .map(|_| ()),
                PendingEdit::Delete { path } => self.manager.delete_file(self.version_id, path, origin),
                PendingEdit::Rename { from, to } => self
                    .manager
                    .rename_file(self.version_id, from, to, origin)
                    .map(|_| ()),
            };
            if let Err(err) = result {
                warn!(error = %err, code = err.code(), "Edit was rejected");
                for path in edit.paths() {
                    self.refetch(path)?;
                }
                return Err(err);
            }
            stored += 1;
        }
        Ok(stored)
    }

    /// Bring the local view up to date with a change from the draft
    /// channel. Returns whether anything was refetched.
    pub fn apply_remote(&mut self, event: &DraftEvent) -> WorkspaceResult<bool> {
        let DraftEvent::FileChanged {
            version_id,
            path,
            change,
            origin,
            ..
        } = event;
        if *version_id != self.version_id || origin.as_deref() == Some(self.id.as_str()) {
            return Ok(false);
        }

        let mut touched = vec![path.as_str()];
        if let FileChange::Renamed { from } = change {
            touched.push(from);
        }
        // queued local edits win until they are flushed
        if touched.iter().any(|p| self.pending.iter().any(|edit| edit.touches(p))) {
            debug!(path, "Keeping local edit over remote change");
            return Ok(false);
        }
        for path in touched {
            self.refetch(path)?;
        }
        Ok(true)
    }

    /// Apply every change already waiting on the draft channel; returns how
    /// many were refetched
    pub fn sync(&mut self) -> WorkspaceResult<usize> {
        let mut applied = 0;
        loop {
            match self.events.try_recv() {
                Ok(ChannelEvent::Draft(event)) => {
                    if self.apply_remote(&event)? {
                        applied += 1;
                    }
                }
                Ok(ChannelEvent::Live(_)) => {}
                Err(TryRecvError::Empty) => return Ok(applied),
                Err(TryRecvError::Lagged(missed)) => {
                    warn!(missed, "Edit session lagged; reloading draft");
                    self.reload()?;
                    applied += 1;
                }
                Err(TryRecvError::Closed) => return Err(WorkspaceError::ChannelClosed(draft_channel(self.app_id))),
            }
        }
    }

    /// Wait for the next change made by someone else and apply it
    pub async fn next_remote(&mut self) -> WorkspaceResult<DraftEvent> {
        loop {
            match self.events.recv().await {
                Ok(ChannelEvent::Draft(event)) => {
                    if event.origin() == Some(self.id.as_str()) {
                        continue;
                    }
                    self.apply_remote(&event)?;
                    return Ok(event);
                }
                Ok(ChannelEvent::Live(_)) => {}
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "Edit session lagged; reloading draft");
                    self.reload()?;
                }
                Err(RecvError::Closed) => return Err(WorkspaceError::ChannelClosed(draft_channel(self.app_id))),
            }
        }
    }

    /// Refetch the whole draft and replay queued edits on top
    pub fn reload(&mut self) -> WorkspaceResult<()> {
        self.files = self.manager.file_set(self.version_id)?.into_iter().collect();
        for edit in &self.pending {
            apply_local(&mut self.files, edit);
        }
        Ok(())
    }

    fn refetch(&mut self, path: &str) -> WorkspaceResult<()> {
        match self.manager.file(self.version_id, path) {
            Ok(file) => {
                self.files.insert(file.path, file.source);
            }
            Err(err) if err.is_not_found() => {
                self.files.remove(path);
            }
            Err(err) => return Err(err),
        }
        Ok(())
    }
}

fn apply_local(files: &mut BTreeMap<String, String>, edit: &PendingEdit) {
    match edit {
        PendingEdit::Write { path, source } => {
            files.insert(path.clone(), source.clone());
        }
        PendingEdit::Delete { path } => {
            files.remove(path);
        }
        PendingEdit::Rename { from, to } => {
            if let Some(source) = files.remove(from) {
                files.insert(to.clone(), source);
            }
        }
    }
}
