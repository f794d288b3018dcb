use pagewright_runtime::{RuntimeError, ScopeError};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ShellError {
    #[error("URL '{url}' is outside the mount prefix '{prefix}'")]
    OutsidePrefix { url: String, prefix: String },

    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl ShellError {
    pub fn code(&self) -> &'static str {
        match self {
            ShellError::OutsidePrefix { .. } => "outside_prefix",
            ShellError::Scope(_) => "scope_error",
            ShellError::Runtime(_) => "runtime_error",
        }
    }
}
