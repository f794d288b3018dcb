use crate::value::Value;
use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Failure while executing user code. Every variant is contained by the
/// nearest component boundary.
#[derive(Error, Debug, Clone)]
pub enum RuntimeError {
    /// A value thrown by user code
    #[error("Uncaught {}", .0.describe_thrown())]
    Thrown(Value),

    #[error("ReferenceError: {0} is not defined")]
    Reference(String),

    #[error("TypeError: {0}")]
    Type(String),

    #[error("TypeError: Assignment to constant variable '{0}'")]
    ConstAssign(String),

    #[error("RangeError: Maximum call depth of {0} exceeded")]
    DepthExceeded(usize),

    #[error("RangeError: Loop exceeded {0} iterations")]
    LoopLimit(usize),

    #[error("{0} is not supported")]
    Unsupported(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Scope(#[from] ScopeError),
}

impl RuntimeError {
    pub fn type_error(message: impl Into<String>) -> Self {
        RuntimeError::Type(message.into())
    }
}

/// A cross-file reference could not be turned into a value
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("Cannot resolve '{specifier}' from '{from}'")]
    BadSpecifier { from: String, specifier: String },

    #[error("Module '{0}' does not exist")]
    ModuleNotFound(String),

    #[error("Module '{module}' failed to compile: {message}")]
    CompileFailed { module: String, message: String },

    #[error("Module '{module}' has no export named '{export}'")]
    ExportNotFound { module: String, export: String },

    #[error("Module '{0}' has no default export and cannot be rendered")]
    NoDefaultExport(String),

    #[error("Default export of '{0}' is not a component")]
    NotAComponent(String),

    #[error("Circular import during initialization: {}", .0.join(" -> "))]
    Cycle(Vec<String>),
}

/// The platform scope is inconsistent or lacks a name user code imports
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScopeError {
    #[error("'{name}' from the {layer} layer collides with the {existing} layer")]
    Collision {
        name: String,
        layer: String,
        existing: String,
    },

    #[error("'{name}' is overridden by the {layer} layer but is not on its override list")]
    UnlistedOverride { name: String, layer: String },

    #[error("'{name}' is on the {layer} override list but replaces nothing")]
    MissingOverride { name: String, layer: String },

    #[error("Required capability '{0}' is missing")]
    MissingRequired(String),

    #[error("'{name}' is not provided by the platform (imported by '{module}')")]
    Unknown { name: String, module: String },
}
