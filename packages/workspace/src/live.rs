use crate::error::{WorkspaceError, WorkspaceResult};
use crate::events::{Channel, ChannelEvent};
use crate::manager::VersionManager;
use pagewright_runtime::VNode;
use pagewright_shell::{AppInstance, InstanceOptions};
use pagewright_store::{AppId, VersionId};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tracing::{info, instrument, warn};

/// Keeps a running instance on the newest file set of its channel.
///
/// Following the live channel runs the active version; following the
/// draft channel runs the draft, as a preview does. Every notification
/// triggers a refetch of the whole file set so one instance never mixes
/// files of two versions.
pub struct LiveSync {
    manager: VersionManager,
    app_id: AppId,
    channel: Channel,
    events: Receiver<ChannelEvent>,
}

impl LiveSync {
    pub fn new(manager: VersionManager, app_id: AppId, channel: Channel) -> Self {
        let events = manager.hub().subscribe(&channel.name(app_id));
        Self {
            manager,
            app_id,
            channel,
            events,
        }
    }

    pub fn live(manager: VersionManager, app_id: AppId) -> Self {
        Self::new(manager, app_id, Channel::Live)
    }

    pub fn draft(manager: VersionManager, app_id: AppId) -> Self {
        Self::new(manager, app_id, Channel::Draft)
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Version the channel currently points at
    pub fn current_version(&self) -> WorkspaceResult<VersionId> {
        match self.channel {
            Channel::Live => self.manager.active_version(self.app_id),
            Channel::Draft => self.manager.draft_version(self.app_id),
        }
    }

    /// The full file set of the current version
    pub fn fetch(&self) -> WorkspaceResult<(VersionId, Vec<(String, String)>)> {
        let version_id = self.current_version()?;
        Ok((version_id, self.manager.file_set(version_id)?))
    }

    #[instrument(skip(self, options), fields(app_id = %self.app_id, channel = ?self.channel))]
    pub fn mount(&self, options: InstanceOptions) -> WorkspaceResult<AppInstance> {
        let (version_id, files) = self.fetch()?;
        let instance = AppInstance::mount(&version_id.to_string(), &files, self.manager.cache().clone(), options)?;
        Ok(instance)
    }

    /// Reload an instance with the current file set
    pub fn refresh(&self, instance: &mut AppInstance) -> WorkspaceResult<VNode> {
        let (version_id, files) = self.fetch()?;
        info!(app_id = %self.app_id, version_id = %version_id, files = files.len(), "Refreshing instance");
        Ok(instance.reload(&version_id.to_string(), &files))
    }

    /// Wait for the next notification on the channel. Missed notifications
    /// collapse into one, since every refresh fetches everything anyway.
    pub async fn changed(&mut self) -> WorkspaceResult<ChannelEvent> {
        loop {
            match self.events.recv().await {
                Ok(event) => return Ok(event),
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "Live sync lagged");
                    if let Some(event) = self.drain() {
                        return Ok(event);
                    }
                }
                Err(RecvError::Closed) => {
                    return Err(WorkspaceError::ChannelClosed(self.channel.name(self.app_id)));
                }
            }
        }
    }

    fn drain(&mut self) -> Option<ChannelEvent> {
        let mut last = None;
        while let Ok(event) = self.events.try_recv() {
            last = Some(event);
        }
        last
    }

    /// Wait for a notification and reload the instance with what it points at
    pub async fn follow(&mut self, instance: &mut AppInstance) -> WorkspaceResult<VNode> {
        self.changed().await?;
        self.drain();
        self.refresh(instance)
    }
}
