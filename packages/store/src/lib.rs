//! Applications, versions and source files.
//!
//! [`AppStore`] is the persistence boundary. It rejects invalid paths and
//! writes to non-draft versions before anything is stored.
//! [`InMemoryStore`] is the bundled implementation.

mod error;
mod memory;
mod model;
mod paths;
pub mod scaffold;
mod store;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use model::{
    is_valid_slug, AccessPolicy, AppFile, AppId, AppScope, AppVersion, Application,
    MetadataUpdate, NavItem, NewApplication, VersionId, VersionState,
};
pub use paths::{validate_path, FilePath, PathError};
pub use store::AppStore;
