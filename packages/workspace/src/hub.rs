use crate::events::ChannelEvent;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Named publish/subscribe channels.
///
/// Channels are created on first use. Publishing to a channel nobody
/// listens on is not an error; the event is dropped.
#[derive(Clone)]
pub struct BroadcastHub {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<ChannelEvent>>>>,
    capacity: usize,
}

impl BroadcastHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::default(),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, broadcast::Sender<ChannelEvent>>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self, channel: &str) -> broadcast::Receiver<ChannelEvent> {
        let mut channels = self.lock();
        match channels.get(channel) {
            Some(sender) => sender.subscribe(),
            None => {
                let (sender, receiver) = broadcast::channel(self.capacity);
                channels.insert(channel.to_string(), sender);
                debug!(channel, "Opened channel");
                receiver
            }
        }
    }

    /// Send an event; returns how many subscribers received it
    pub fn publish(&self, channel: &str, event: impl Into<ChannelEvent>) -> usize {
        let event = event.into();
        let reached = self
            .lock()
            .get(channel)
            .and_then(|sender| sender.send(event).ok())
            .unwrap_or(0);
        trace!(channel, reached, "Published event");
        reached
    }

    pub fn subscribers(&self, channel: &str) -> usize {
        self.lock().get(channel).map_or(0, |sender| sender.receiver_count())
    }

    pub fn channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Drop a channel; its subscribers see it close
    pub fn close(&self, channel: &str) -> bool {
        self.lock().remove(channel).is_some()
    }

    /// Drop channels without subscribers; returns how many were removed
    pub fn prune(&self) -> usize {
        let mut channels = self.lock();
        let before = channels.len();
        channels.retain(|_, sender| sender.receiver_count() > 0);
        before - channels.len()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(256)
    }
}
