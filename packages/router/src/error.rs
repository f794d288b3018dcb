use thiserror::Error;

/// Two files claim the same place in the route tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollisionError {
    #[error("Route '{route}' is defined by both '{first}' and '{second}'")]
    DuplicateRoute {
        route: String,
        first: String,
        second: String,
    },

    #[error("Layout for '{route}' is defined by both '{first}' and '{second}'")]
    DuplicateLayout {
        route: String,
        first: String,
        second: String,
    },

    #[error("'{name}' is defined by both '{first}' and '{second}'")]
    DuplicateSpecialFile {
        name: String,
        first: String,
        second: String,
    },
}

impl CollisionError {
    /// Stable machine-readable identifier
    pub fn code(&self) -> &'static str {
        match self {
            CollisionError::DuplicateRoute { .. } => "route_collision",
            CollisionError::DuplicateLayout { .. } => "layout_collision",
            CollisionError::DuplicateSpecialFile { .. } => "special_file_collision",
        }
    }

    /// The two files involved, in sorted order
    pub fn files(&self) -> (&str, &str) {
        match self {
            CollisionError::DuplicateRoute { first, second, .. }
            | CollisionError::DuplicateLayout { first, second, .. }
            | CollisionError::DuplicateSpecialFile { first, second, .. } => (first, second),
        }
    }
}
