//! Route tree derivation.
//!
//! [`build_routes`] turns the file paths of one version into a
//! [`RouteTree`]; [`RouteTree::match_path`] resolves URLs against it. The
//! tree is plain data and is rebuilt whenever the file set changes.

mod builder;
mod error;
mod matcher;
mod segment;

pub use builder::{build_routes, route_pattern, RouteKind, RouteNode, RouteTree};
pub use error::CollisionError;
pub use matcher::RouteMatch;
pub use segment::{pattern_string, Segment};
