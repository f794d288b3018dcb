use crate::error::ShellError;
use crate::prefix::MountPrefix;
use pagewright_common::module_key;
use pagewright_compiler::{CompileCache, CompileError};
use pagewright_router::{build_routes, CollisionError, RouteTree};
use pagewright_runtime::elements::intrinsic;
use pagewright_runtime::{
    component_element, component_ref, route_element, HostServices, Interpreter, Limits, Location, NavigationRequest,
    NoWorkflows, Object, PlatformScope, SessionProvider, StaticSession, VNode, Value, WorkflowService,
};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Renders before a render that keeps queuing navigation or state changes
/// is cut off.
pub const DEFAULT_RENDER_PASSES: usize = 8;

/// Entries kept for `back`; the oldest are forgotten first.
pub const MAX_HISTORY: usize = 100;

pub struct InstanceOptions {
    pub prefix: MountPrefix,
    pub limits: Limits,
    pub render_passes: usize,
    pub session: Arc<dyn SessionProvider>,
    pub workflows: Arc<dyn WorkflowService>,
}

impl Default for InstanceOptions {
    fn default() -> Self {
        Self {
            prefix: MountPrefix::root(),
            limits: Limits::default(),
            render_passes: DEFAULT_RENDER_PASSES,
            session: Arc::new(StaticSession::anonymous()),
            workflows: Arc::new(NoWorkflows),
        }
    }
}

/// One running version of an application.
///
/// Owns the interpreter, the route tree derived from the file set and the
/// navigation history. Everything here runs on the thread that mounted
/// the instance.
pub struct AppInstance {
    interp: Interpreter,
    cache: Arc<CompileCache>,
    prefix: MountPrefix,
    version_id: String,
    routes: Result<RouteTree, CollisionError>,
    history: Vec<Location>,
    render_passes: usize,
    last: Option<VNode>,
}

impl AppInstance {
    /// Compile and register every file of a version, then build its routes.
    /// Nothing renders until [`AppInstance::open`] or [`AppInstance::render`].
    #[instrument(skip(files, cache, options), fields(files = files.len(), prefix = %options.prefix))]
    pub fn mount(
        version_id: &str,
        files: &[(String, String)],
        cache: Arc<CompileCache>,
        options: InstanceOptions,
    ) -> Result<AppInstance, ShellError> {
        let scope = PlatformScope::standard()?;
        let services = HostServices {
            session: options.session,
            workflows: options.workflows,
            urls: Rc::new(options.prefix.clone()),
        };
        let mut instance = AppInstance {
            interp: Interpreter::new(scope, services, options.limits),
            cache,
            prefix: options.prefix,
            version_id: String::new(),
            routes: build_routes(Vec::<String>::new()),
            history: vec![Location::parse("/")],
            render_passes: options.render_passes.max(1),
            last: None,
        };
        instance.load(version_id, files);
        Ok(instance)
    }

    fn load(&mut self, version_id: &str, files: &[(String, String)]) {
        let outcomes = self.cache.compile_files(version_id, files);
        let modules = self.interp.modules_mut();
        modules.clear();
        for (path, outcome) in outcomes {
            modules.insert(&path, outcome);
        }

        let paths: Vec<String> = files.iter().map(|(path, _)| path.clone()).collect();
        self.routes = build_routes(&paths);
        self.version_id = version_id.to_string();
        self.last = None;

        let failed = self.interp.modules().diagnostics().len();
        match &self.routes {
            Ok(tree) => info!(version = %version_id, pages = tree.pages().len(), failed, "Loaded application files"),
            Err(err) => warn!(version = %version_id, error = %err, "Route tree could not be built"),
        }
    }

    pub fn version_id(&self) -> &str {
        &self.version_id
    }

    pub fn prefix(&self) -> &MountPrefix {
        &self.prefix
    }

    pub fn location(&self) -> &Location {
        self.current()
    }

    /// Browser URL of the current location
    pub fn url(&self) -> String {
        self.prefix.external(&self.current().href())
    }

    /// Compile errors of the loaded version by file path
    pub fn diagnostics(&self) -> BTreeMap<String, CompileError> {
        self.interp.modules().diagnostics()
    }

    pub fn routes(&self) -> Result<&RouteTree, &CollisionError> {
        self.routes.as_ref()
    }

    /// Output of the most recent settled render
    pub fn last_render(&self) -> Option<&VNode> {
        self.last.as_ref()
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interp
    }

    /// Open a browser URL, which must live under the mount prefix
    pub fn open(&mut self, url: &str) -> Result<VNode, ShellError> {
        let internal = self.prefix.to_internal(url)?;
        self.go(&internal, false);
        Ok(self.render())
    }

    /// Navigate to a target written the way user code writes it, relative
    /// to the current location
    pub fn navigate(&mut self, to: &str) -> VNode {
        self.go(to, false);
        self.render()
    }

    pub fn back(&mut self) -> VNode {
        self.pop();
        self.render()
    }

    /// Invoke an event handler of the last render and re-render
    pub fn dispatch(&mut self, handler: &str, payload: &serde_json::Value) -> Result<VNode, ShellError> {
        if let Err(err) = self.interp.dispatch(handler, payload) {
            warn!(handler, error = %err, "Event handler failed");
            return Err(err.into());
        }
        Ok(self.render())
    }

    /// Apply workflow events that arrived since the last call. Returns the
    /// new output when any of them changed state.
    pub fn pump(&mut self) -> Option<VNode> {
        if self.interp.pump_workflows() == 0 {
            return None;
        }
        Some(self.render())
    }

    /// Replace the whole file set with another version's. Component state
    /// is dropped; the location is kept.
    #[instrument(skip(self, files), fields(from = %self.version_id, files = files.len()))]
    pub fn reload(&mut self, version_id: &str, files: &[(String, String)]) -> VNode {
        self.interp.reset_state();
        self.load(version_id, files);
        self.render()
    }

    /// Render the current location, then settle effects and queued
    /// navigation until nothing changes or the pass limit is hit
    #[instrument(skip(self), fields(location = %self.current()))]
    pub fn render(&mut self) -> VNode {
        let mut node = self.render_once();
        for pass in 1..=self.render_passes {
            self.interp.commit_effects();
            let navigated = match self.interp.take_navigation() {
                Some(request) => {
                    self.apply(request);
                    true
                }
                None => false,
            };
            let dirty = self.interp.take_dirty();
            if !navigated && !dirty {
                debug!(passes = pass, "Render settled");
                break;
            }
            if pass == self.render_passes {
                warn!(passes = pass, "Render did not settle");
                break;
            }
            node = self.render_once();
        }
        self.last = Some(node.clone());
        node
    }

    fn render_once(&mut self) -> VNode {
        let tree = match &self.routes {
            Ok(tree) => tree,
            Err(err) => {
                return VNode::error(None, format!("Routes could not be built: {}", err));
            }
        };

        let location = self.current().clone();
        let (outlet, params) = match tree.match_path(&location.path) {
            Some(matched) => {
                let mut element = route_element(component_ref(&module_key(&matched.page)), None);
                for layout in matched.layouts.iter().rev() {
                    element = route_element(component_ref(&module_key(layout)), Some(element));
                }
                (element, matched.params)
            }
            None => (not_found(&location.path), BTreeMap::new()),
        };

        let mut root = outlet;
        if let Some(layout) = &tree.root_layout {
            root = route_element(component_ref(&module_key(layout)), Some(root));
        }
        if let Some(providers) = &tree.providers {
            let mut props = Object::new();
            props.set("children", root);
            root = component_element(component_ref(&module_key(providers)), props);
        }

        self.interp.set_location(location, params);
        self.interp.render(&root)
    }

    fn current(&self) -> &Location {
        // history always holds at least the initial location
        &self.history[self.history.len() - 1]
    }

    fn go(&mut self, to: &str, replace: bool) {
        let target = self.current().resolve(to);
        debug!(to = %target, replace, "Navigating");
        if replace {
            self.history.pop();
        }
        self.history.push(target);
        if self.history.len() > MAX_HISTORY {
            let excess = self.history.len() - MAX_HISTORY;
            self.history.drain(..excess);
        }
    }

    fn pop(&mut self) {
        if self.history.len() > 1 {
            self.history.pop();
        }
    }

    fn apply(&mut self, request: NavigationRequest) {
        match request {
            NavigationRequest::Internal { to, replace } => self.go(&to, replace),
            NavigationRequest::External { url, replace } => match self.prefix.to_internal(&url) {
                Ok(internal) => self.go(&internal, replace),
                Err(err) => warn!(error = %err, "Ignoring navigation that leaves the application"),
            },
            NavigationRequest::Back => self.pop(),
        }
    }
}

fn not_found(path: &str) -> Value {
    let mut props = Object::new();
    props.set("className", Value::string("pw-not-found"));
    props.set("role", Value::string("alert"));
    props.set("children", Value::string(format!("Page not found: {}", path)));
    intrinsic("div", props)
}
