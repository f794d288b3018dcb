use chrono::{DateTime, Utc};
use pagewright_store::{AppId, VersionId};
use serde::{Deserialize, Serialize};

/// Name of an application's draft channel
pub fn draft_channel(app_id: AppId) -> String {
    format!("app:{}:draft", app_id)
}

/// Name of an application's live channel
pub fn live_channel(app_id: AppId) -> String {
    format!("app:{}:live", app_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Channel {
    Draft,
    Live,
}

impl Channel {
    pub fn name(self, app_id: AppId) -> String {
        match self {
            Channel::Draft => draft_channel(app_id),
            Channel::Live => live_channel(app_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FileChange {
    Created,
    Updated,
    Deleted,
    Renamed { from: String },
}

/// Published on the draft channel after a file mutation was stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DraftEvent {
    #[serde(rename_all = "camelCase")]
    FileChanged {
        app_id: AppId,
        version_id: VersionId,
        path: String,
        change: FileChange,
        /// Hash of the stored source; absent for deletions
        content_hash: Option<String>,
        /// Editing session that made the change
        origin: Option<String>,
        at: DateTime<Utc>,
    },
}

impl DraftEvent {
    pub fn path(&self) -> &str {
        match self {
            DraftEvent::FileChanged { path, .. } => path,
        }
    }

    pub fn origin(&self) -> Option<&str> {
        match self {
            DraftEvent::FileChanged { origin, .. } => origin.as_deref(),
        }
    }
}

/// Published on the live channel when the active version changes.
/// Listeners refetch the full file set; events never carry file content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LiveEvent {
    #[serde(rename_all = "camelCase")]
    Published {
        app_id: AppId,
        version_id: VersionId,
        number: u32,
        at: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    RolledBack {
        app_id: AppId,
        version_id: VersionId,
        at: DateTime<Utc>,
    },
}

impl LiveEvent {
    /// Version the application now serves
    pub fn version_id(&self) -> VersionId {
        match self {
            LiveEvent::Published { version_id, .. } | LiveEvent::RolledBack { version_id, .. } => *version_id,
        }
    }
}

/// Anything that travels over a hub channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelEvent {
    Draft(DraftEvent),
    Live(LiveEvent),
}

impl From<DraftEvent> for ChannelEvent {
    fn from(event: DraftEvent) -> Self {
        ChannelEvent::Draft(event)
    }
}

impl From<LiveEvent> for ChannelEvent {
    fn from(event: LiveEvent) -> Self {
        ChannelEvent::Live(event)
    }
}
