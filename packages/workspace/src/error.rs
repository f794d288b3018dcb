use pagewright_shell::ShellError;
use pagewright_store::{AppId, StoreError};
use std::path::PathBuf;
use thiserror::Error;

pub type WorkspaceResult<T> = Result<T, WorkspaceError>;

#[derive(Error, Debug, Clone)]
pub enum WorkspaceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A running instance could not be created or driven. Kept as text
    /// since runtime errors are not `Send`.
    #[error("{message}")]
    Shell { code: &'static str, message: String },

    #[error("Application {0} has not been published")]
    NotPublished(AppId),

    #[error("Channel '{0}' is closed")]
    ChannelClosed(String),

    #[error("Preview task failed: {0}")]
    Preview(String),
}

impl WorkspaceError {
    /// Stable machine-readable identifier
    pub fn code(&self) -> &'static str {
        match self {
            WorkspaceError::Store(err) => err.code(),
            WorkspaceError::Shell { code, .. } => code,
            WorkspaceError::NotPublished(_) => "app_not_published",
            WorkspaceError::ChannelClosed(_) => "channel_closed",
            WorkspaceError::Preview(_) => "preview_failed",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, WorkspaceError::Store(err) if err.is_not_found())
    }
}

impl From<ShellError> for WorkspaceError {
    fn from(err: ShellError) -> Self {
        WorkspaceError::Shell {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// `pagewright.config.json` could not be used
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
