use crate::error::{RuntimeError, RuntimeResult};
use crate::hooks::HookStore;
use crate::interpreter::Interpreter;
use crate::json::from_json;
use crate::nav::{Location, NavigationRequest, RootUrls, UrlRewriter};
use crate::session::{SessionProvider, StaticSession};
use crate::value::Value;
use crate::workflow::{NoWorkflows, WorkflowManager, WorkflowService};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

/// Collaborators a running application talks to
#[derive(Clone)]
pub struct HostServices {
    pub session: Arc<dyn SessionProvider>,
    pub workflows: Arc<dyn WorkflowService>,
    pub urls: Rc<dyn UrlRewriter>,
}

impl Default for HostServices {
    fn default() -> Self {
        Self {
            session: Arc::new(StaticSession::anonymous()),
            workflows: Arc::new(NoWorkflows),
            urls: Rc::new(RootUrls),
        }
    }
}

/// Per-instance state reached by platform natives
pub(crate) struct Host {
    pub hooks: HookStore,
    pub location: Location,
    pub params: BTreeMap<String, String>,
    pub pending_navigation: Option<NavigationRequest>,
    /// `useAppState` entries: value and its cached setter
    pub app_state: BTreeMap<String, (Value, Value)>,
    pub contexts: Vec<(u64, Value)>,
    pub outlets: Vec<Option<Value>>,
    pub handlers: Vec<Value>,
    pub workflows: WorkflowManager,
    pub session: Arc<dyn SessionProvider>,
    pub urls: Rc<dyn UrlRewriter>,
    pub dirty: bool,
    /// Component nesting of the render in progress
    pub render_depth: usize,
    next_context: u64,
}

impl Host {
    pub fn new(services: HostServices) -> Self {
        Self {
            hooks: HookStore::default(),
            location: Location::parse("/"),
            params: BTreeMap::new(),
            pending_navigation: None,
            app_state: BTreeMap::new(),
            contexts: Vec::new(),
            outlets: Vec::new(),
            handlers: Vec::new(),
            workflows: WorkflowManager::new(services.workflows),
            session: services.session,
            urls: services.urls,
            dirty: false,
            render_depth: 0,
            next_context: 1,
        }
    }

    pub fn next_context_id(&mut self) -> u64 {
        let id = self.next_context;
        self.next_context += 1;
        id
    }

    /// Register an event handler for the current render; returns its id
    pub fn register_handler(&mut self, handler: Value) -> String {
        self.handlers.push(handler);
        format!("h{}", self.handlers.len() - 1)
    }

    pub fn request_navigation(&mut self, request: NavigationRequest) {
        self.pending_navigation = Some(request);
    }
}

impl Interpreter {
    /// Location and route params seen by the next render
    pub fn set_location(&mut self, location: Location, params: BTreeMap<String, String>) {
        self.host.location = location;
        self.host.params = params;
    }

    pub fn location(&self) -> &Location {
        &self.host.location
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.host.params
    }

    /// Navigation queued by user code since the last call
    pub fn take_navigation(&mut self) -> Option<NavigationRequest> {
        self.host.pending_navigation.take()
    }

    /// Whether state changed since the last call
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.host.dirty)
    }

    /// Apply pending workflow events; returns how many changed state
    pub fn pump_workflows(&mut self) -> usize {
        let applied = self.host.workflows.pump();
        if applied > 0 {
            self.host.dirty = true;
        }
        applied
    }

    pub fn workflows(&self) -> &WorkflowManager {
        &self.host.workflows
    }

    /// Invoke an event handler registered by the last render. The payload
    /// becomes the handler's single argument.
    pub fn dispatch(&mut self, handler_id: &str, payload: &serde_json::Value) -> RuntimeResult<()> {
        let handler = handler_id
            .strip_prefix('h')
            .and_then(|index| index.parse::<usize>().ok())
            .and_then(|index| self.host.handlers.get(index).cloned())
            .ok_or_else(|| RuntimeError::type_error(format!("Unknown event handler '{}'", handler_id)))?;
        self.call(&handler, vec![from_json(payload)])?;
        Ok(())
    }

    /// Current value of a `useAppState` entry
    pub fn app_state(&self, key: &str) -> Option<Value> {
        self.host.app_state.get(key).map(|(value, _)| value.clone())
    }

    /// Forget every component and cross-page state, keeping location and
    /// running workflows. Used when the whole file set is replaced.
    pub fn reset_state(&mut self) {
        let unmounted = self.host.hooks.take_all();
        self.run_cleanups(unmounted);
        self.host.app_state.clear();
        self.host.contexts.clear();
        self.host.outlets.clear();
        self.host.handlers.clear();
        self.host.pending_navigation = None;
        self.module_stack.clear();
    }
}
