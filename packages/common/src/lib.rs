pub mod hash;
pub mod paths;

pub use hash::content_hash;
pub use paths::*;
