//! Version management and live updates for Pagewright applications.
//!
//! [`VersionManager`] owns the draft/active lifecycle on top of an
//! [`AppStore`](pagewright_store::AppStore) and announces every change on a
//! [`BroadcastHub`]. [`EditSession`] gives one editor an optimistic view of
//! the draft; [`LiveSync`] keeps a running
//! [`AppInstance`](pagewright_shell::AppInstance) on the newest file set.
//! [`server::router`] exposes all of it over HTTP and server-sent events.

pub mod config;
pub mod error;
pub mod events;
pub mod hub;
pub mod live;
pub mod manager;
pub mod server;
pub mod session;

pub use config::{Config, DEFAULT_CONFIG_NAME};
pub use error::{ConfigError, WorkspaceError, WorkspaceResult};
pub use events::{draft_channel, live_channel, Channel, ChannelEvent, DraftEvent, FileChange, LiveEvent};
pub use hub::BroadcastHub;
pub use live::LiveSync;
pub use manager::{FileDiagnostic, VersionManager};
pub use server::{router, AppState, SESSION_HEADER};
pub use session::{EditSession, PendingEdit};
