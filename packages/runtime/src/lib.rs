//! Runtime for compiled application files.
//!
//! An [`Interpreter`] executes [`ExecutableUnit`](pagewright_compiler::ExecutableUnit)s
//! against a [`PlatformScope`], resolves imports between files lazily
//! through its [`ModuleRegistry`], and renders component trees to
//! [`VNode`]s with hook state kept per tree position.

mod builtins;
pub mod elements;
pub mod env;
pub mod error;
mod hooks;
mod host;
pub mod interpreter;
pub mod json;
pub mod module;
pub mod nav;
mod render;
mod routing;
pub mod scope;
pub mod session;
mod ui;
pub mod value;
pub mod vdom;
pub mod workflow;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod tests_hooks;
#[cfg(test)]
mod tests_interpreter;
#[cfg(test)]
mod tests_navigation;
#[cfg(test)]
mod tests_render;

pub use elements::{component_element, route_element};
pub use env::Env;
pub use error::{ResolveError, RuntimeError, RuntimeResult, ScopeError};
pub use host::HostServices;
pub use interpreter::{Interpreter, Limits};
pub use module::{component_ref, ModuleInstance, ModuleRegistry};
pub use nav::{Location, NavigationRequest, RootUrls, UrlRewriter};
pub use scope::{PlatformScope, NAVIGATION_OVERRIDES};
pub use session::{SessionProvider, StaticSession, UserInfo};
pub use ui::merge_classes;
pub use value::{Object, Value};
pub use vdom::VNode;
pub use workflow::{
    InvocationId, InvocationState, NoWorkflows, WorkflowEvent, WorkflowManager, WorkflowReply, WorkflowService,
    WorkflowSink, WorkflowStatus, WorkflowStream,
};
