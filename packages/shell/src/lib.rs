//! Runtime shell for one version of an application.
//!
//! [`AppInstance`] compiles a version's files through a shared
//! [`CompileCache`](pagewright_compiler::CompileCache), derives the route
//! tree, and renders the matched layout chain. Every URL user code produces
//! is rewritten onto the instance's [`MountPrefix`], so the same files run
//! unchanged in a preview and under `/apps/{slug}`.

mod error;
mod instance;
mod prefix;

#[cfg(test)]
mod tests_instance;

pub use error::ShellError;
pub use instance::{AppInstance, InstanceOptions, DEFAULT_RENDER_PASSES, MAX_HISTORY};
pub use prefix::MountPrefix;
