//! Hook state, keyed by each component's position in the render tree.
//!
//! A component is identified by its render path. Hooks are addressed by
//! (path, call index); a component whose path is not visited during a
//! render pass is unmounted and its effect cleanups run. Workflow
//! invocations live in the workflow manager and survive unmounting.

use crate::elements::arg;
use crate::error::{RuntimeError, RuntimeResult};
use crate::interpreter::Interpreter;
use crate::json::{from_json, to_json};
use crate::value::{ContextRef, Object, Value};
use crate::workflow::InvocationId;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tracing::warn;

pub(crate) enum HookSlot {
    State { value: Value, setter: Value },
    Memo { deps: Option<Vec<Value>>, value: Value },
    Ref(Value),
    Effect { deps: Option<Vec<Value>>, cleanup: Option<Value> },
    Workflow(Option<InvocationId>),
}

struct Cursor {
    path: String,
    index: usize,
}

pub(crate) struct PendingEffect {
    path: String,
    index: usize,
    effect: Value,
    deps: Option<Vec<Value>>,
}

#[derive(Default)]
pub(crate) struct HookStore {
    components: HashMap<String, Vec<HookSlot>>,
    stack: Vec<Cursor>,
    rendered: HashSet<String>,
    pending_effects: Vec<PendingEffect>,
}

impl HookStore {
    pub fn begin_pass(&mut self) {
        self.rendered.clear();
        self.pending_effects.clear();
        self.stack.clear();
    }

    pub fn enter(&mut self, path: &str) {
        self.rendered.insert(path.to_string());
        self.stack.push(Cursor {
            path: path.to_string(),
            index: 0,
        });
    }

    pub fn exit(&mut self) {
        self.stack.pop();
    }

    fn next(&mut self) -> RuntimeResult<(String, usize)> {
        let cursor = self
            .stack
            .last_mut()
            .ok_or_else(|| RuntimeError::type_error("Hooks can only be called while a component renders"))?;
        let address = (cursor.path.clone(), cursor.index);
        cursor.index += 1;
        Ok(address)
    }

    fn slot(&self, path: &str, index: usize) -> Option<&HookSlot> {
        self.components.get(path)?.get(index)
    }

    fn slot_mut(&mut self, path: &str, index: usize) -> Option<&mut HookSlot> {
        self.components.get_mut(path)?.get_mut(index)
    }

    fn store(&mut self, path: &str, index: usize, slot: HookSlot) {
        let slots = self.components.entry(path.to_string()).or_default();
        if index < slots.len() {
            slots[index] = slot;
        } else {
            slots.push(slot);
        }
    }

    /// Remove components that were not rendered in this pass
    pub fn take_unmounted(&mut self) -> Vec<Vec<HookSlot>> {
        let stale: Vec<String> = self
            .components
            .keys()
            .filter(|path| !self.rendered.contains(*path))
            .cloned()
            .collect();
        stale
            .into_iter()
            .filter_map(|path| self.components.remove(&path))
            .collect()
    }

    pub fn take_all(&mut self) -> Vec<Vec<HookSlot>> {
        self.stack.clear();
        self.pending_effects.clear();
        self.components.drain().map(|(_, slots)| slots).collect()
    }

    pub fn effects_mark(&self) -> usize {
        self.pending_effects.len()
    }

    /// Drop effects scheduled after `mark`, used when a component fails
    pub fn discard_effects(&mut self, mark: usize) {
        self.pending_effects.truncate(mark);
    }

    pub fn mounted(&self) -> usize {
        self.components.len()
    }
}

fn order_error() -> RuntimeError {
    RuntimeError::type_error("Hooks were called in a different order than during the previous render")
}

fn deps_arg(value: Option<&Value>) -> Option<Vec<Value>> {
    match value {
        Some(Value::Array(items)) => Some(items.borrow().clone()),
        _ => None,
    }
}

fn deps_changed(old: &Option<Vec<Value>>, new: &Option<Vec<Value>>) -> bool {
    match (old, new) {
        (Some(old), Some(new)) => {
            old.len() != new.len() || old.iter().zip(new).any(|(a, b)| !a.same_value(b))
        }
        _ => true,
    }
}

fn address(bound: &[Value]) -> Option<(String, usize)> {
    match bound {
        [Value::String(path), Value::Number(index), ..] => Some((path.to_string(), *index as usize)),
        _ => None,
    }
}

fn address_values(path: &str, index: usize) -> Vec<Value> {
    vec![Value::string(path), Value::Number(index as f64)]
}

pub(crate) fn use_state(interp: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let (path, index) = interp.host.hooks.next()?;
    match interp.host.hooks.slot(&path, index) {
        Some(HookSlot::State { value, setter }) => return Ok(Value::array(vec![value.clone(), setter.clone()])),
        Some(_) => return Err(order_error()),
        None => {}
    }

    let initial = arg(args, 0);
    let value = if initial.is_callable() {
        interp.call(&initial, Vec::new())?
    } else {
        initial
    };
    let setter = Value::bound_native("setState", set_state, address_values(&path, index));
    interp.host.hooks.store(
        &path,
        index,
        HookSlot::State {
            value: value.clone(),
            setter: setter.clone(),
        },
    );
    Ok(Value::array(vec![value, setter]))
}

fn set_state(interp: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let Some((path, index)) = address(bound) else {
        return Ok(Value::Undefined);
    };
    // updates after unmount are dropped
    let current = match interp.host.hooks.slot(&path, index) {
        Some(HookSlot::State { value, .. }) => value.clone(),
        _ => return Ok(Value::Undefined),
    };
    let next = arg(args, 0);
    let next = if next.is_callable() {
        interp.call(&next, vec![current.clone()])?
    } else {
        next
    };
    if !next.same_value(&current) {
        if let Some(HookSlot::State { value, .. }) = interp.host.hooks.slot_mut(&path, index) {
            *value = next;
        }
        interp.host.dirty = true;
    }
    Ok(Value::Undefined)
}

pub(crate) fn use_effect(interp: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let effect = arg(args, 0);
    if !effect.is_callable() {
        return Err(RuntimeError::type_error("useEffect expects a function"));
    }
    let deps = deps_arg(args.get(1));
    let (path, index) = interp.host.hooks.next()?;
    let changed = match interp.host.hooks.slot(&path, index) {
        Some(HookSlot::Effect { deps: old, .. }) => deps_changed(old, &deps),
        Some(_) => return Err(order_error()),
        None => {
            interp.host.hooks.store(
                &path,
                index,
                HookSlot::Effect {
                    deps: None,
                    cleanup: None,
                },
            );
            true
        }
    };
    if changed {
        interp.host.hooks.pending_effects.push(PendingEffect {
            path,
            index,
            effect,
            deps,
        });
    }
    Ok(Value::Undefined)
}

pub(crate) fn use_memo(interp: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let factory = arg(args, 0);
    memoize(interp, args, |interp| interp.call(&factory, Vec::new()))
}

pub(crate) fn use_callback(interp: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let callback = arg(args, 0);
    memoize(interp, args, |_| Ok(callback.clone()))
}

fn memoize(
    interp: &mut Interpreter,
    args: &[Value],
    compute: impl FnOnce(&mut Interpreter) -> RuntimeResult<Value>,
) -> RuntimeResult<Value> {
    let deps = deps_arg(args.get(1));
    let (path, index) = interp.host.hooks.next()?;
    match interp.host.hooks.slot(&path, index) {
        Some(HookSlot::Memo { deps: old, value }) if !deps_changed(old, &deps) => return Ok(value.clone()),
        Some(HookSlot::Memo { .. }) | None => {}
        Some(_) => return Err(order_error()),
    }
    let value = compute(interp)?;
    interp.host.hooks.store(
        &path,
        index,
        HookSlot::Memo {
            deps,
            value: value.clone(),
        },
    );
    Ok(value)
}

pub(crate) fn use_ref(interp: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let (path, index) = interp.host.hooks.next()?;
    match interp.host.hooks.slot(&path, index) {
        Some(HookSlot::Ref(object)) => return Ok(object.clone()),
        Some(_) => return Err(order_error()),
        None => {}
    }
    let object = Value::object(Object::from_iter([("current", arg(args, 0))]));
    interp.host.hooks.store(&path, index, HookSlot::Ref(object.clone()));
    Ok(object)
}

pub(crate) fn create_context(interp: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let id = interp.host.next_context_id();
    Ok(Value::Context(Rc::new(ContextRef {
        id,
        default: arg(args, 0),
    })))
}

pub(crate) fn use_context(interp: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    match arg(args, 0) {
        Value::Context(context) => Ok(interp
            .host
            .contexts
            .iter()
            .rev()
            .find(|(id, _)| *id == context.id)
            .map(|(_, value)| value.clone())
            .unwrap_or_else(|| context.default.clone())),
        other => Err(RuntimeError::type_error(format!(
            "useContext expects a context, got {}",
            other.type_of()
        ))),
    }
}

/// State shared by every page of the running application
pub(crate) fn use_app_state(interp: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let key = arg(args, 0).display();
    if let Some((value, setter)) = interp.host.app_state.get(&key) {
        return Ok(Value::array(vec![value.clone(), setter.clone()]));
    }
    let initial = arg(args, 1);
    let value = if initial.is_callable() {
        interp.call(&initial, Vec::new())?
    } else {
        initial
    };
    let setter = Value::bound_native("setAppState", set_app_state, vec![Value::from(key.clone())]);
    interp
        .host
        .app_state
        .insert(key, (value.clone(), setter.clone()));
    Ok(Value::array(vec![value, setter]))
}

fn set_app_state(interp: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let key = arg(bound, 0).display();
    let Some((current, _)) = interp.host.app_state.get(&key) else {
        return Ok(Value::Undefined);
    };
    let current = current.clone();
    let next = arg(args, 0);
    let next = if next.is_callable() {
        interp.call(&next, vec![current.clone()])?
    } else {
        next
    };
    if !next.same_value(&current) {
        if let Some(entry) = interp.host.app_state.get_mut(&key) {
            entry.0 = next;
        }
        interp.host.dirty = true;
    }
    Ok(Value::Undefined)
}

pub(crate) fn use_user(interp: &mut Interpreter, _: &[Value], _: &[Value]) -> RuntimeResult<Value> {
    let user = interp.host.session.current_user();
    let mut object = Object::new();
    match user {
        Some(user) => {
            object.set("id", Value::from(user.id));
            object.set("name", Value::from(user.name));
            object.set("email", user.email.map(Value::from).unwrap_or(Value::Null));
            object.set(
                "roles",
                Value::array(user.roles.into_iter().map(Value::from).collect()),
            );
            object.set("isAuthenticated", Value::Bool(true));
        }
        None => {
            object.set("id", Value::Null);
            object.set("name", Value::Null);
            object.set("email", Value::Null);
            object.set("roles", Value::array(Vec::new()));
            object.set("isAuthenticated", Value::Bool(false));
        }
    }
    object.set("hasRole", Value::native("hasRole", has_role));
    Ok(Value::object(object))
}

fn has_role(interp: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let role = arg(args, 0).display();
    Ok(Value::Bool(interp.host.session.has_role(&role)))
}

/// `useWorkflow(name)`: `{ status, isRunning, message, logs, result,
/// error, run(params), cancel() }`
pub(crate) fn use_workflow(interp: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let name = arg(args, 0).display();
    let (path, index) = interp.host.hooks.next()?;
    let invocation = match interp.host.hooks.slot(&path, index) {
        Some(HookSlot::Workflow(invocation)) => *invocation,
        Some(_) => return Err(order_error()),
        None => {
            interp.host.hooks.store(&path, index, HookSlot::Workflow(None));
            None
        }
    };

    let state = invocation.and_then(|id| interp.host.workflows.state(id).cloned());
    let mut object = Object::new();
    let status = state.as_ref().map_or("idle", |state| state.status.as_str());
    object.set("status", Value::string(status));
    object.set("isRunning", Value::Bool(status == "running"));
    object.set(
        "message",
        state
            .as_ref()
            .and_then(|state| state.message.clone())
            .map(Value::from)
            .unwrap_or(Value::Null),
    );
    object.set(
        "logs",
        Value::array(
            state
                .as_ref()
                .map(|state| state.logs.iter().map(|line| Value::string(line)).collect())
                .unwrap_or_default(),
        ),
    );
    object.set(
        "result",
        state
            .as_ref()
            .and_then(|state| state.result.as_ref())
            .map(from_json)
            .unwrap_or(Value::Undefined),
    );
    object.set(
        "error",
        state
            .as_ref()
            .and_then(|state| state.error.clone())
            .map(Value::from)
            .unwrap_or(Value::Null),
    );

    let mut bound = address_values(&path, index);
    bound.push(Value::from(name));
    object.set("run", Value::bound_native("run", workflow_run, bound));
    object.set(
        "cancel",
        Value::bound_native("cancel", workflow_cancel, address_values(&path, index)),
    );
    Ok(Value::object(object))
}

fn workflow_run(interp: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let Some((path, index)) = address(bound) else {
        return Ok(Value::Undefined);
    };
    let name = arg(bound, 2).display();
    let params = to_json(&arg(args, 0)).unwrap_or(serde_json::Value::Object(Default::default()));
    let id = interp.host.workflows.start(&name, params);
    let previous = match interp.host.hooks.slot_mut(&path, index) {
        Some(HookSlot::Workflow(invocation)) => invocation.replace(id),
        _ => None,
    };
    if let Some(previous) = previous {
        interp.host.workflows.release(previous);
    }
    interp.host.dirty = true;
    Ok(Value::Undefined)
}

fn workflow_cancel(interp: &mut Interpreter, bound: &[Value], _: &[Value]) -> RuntimeResult<Value> {
    let Some((path, index)) = address(bound) else {
        return Ok(Value::Bool(false));
    };
    let invocation = match interp.host.hooks.slot(&path, index) {
        Some(HookSlot::Workflow(invocation)) => *invocation,
        _ => None,
    };
    let cancelled = invocation.map_or(false, |id| interp.host.workflows.cancel(id));
    if cancelled {
        interp.host.dirty = true;
    }
    Ok(Value::Bool(cancelled))
}

impl Interpreter {
    /// Run the effects scheduled by the last render; returns how many ran.
    /// A failing effect is logged and does not stop the others.
    pub fn commit_effects(&mut self) -> usize {
        let effects = std::mem::take(&mut self.host.hooks.pending_effects);
        let count = effects.len();
        for pending in effects {
            let previous = match self.host.hooks.slot_mut(&pending.path, pending.index) {
                Some(HookSlot::Effect { cleanup, .. }) => cleanup.take(),
                _ => continue,
            };
            if let Some(cleanup) = previous {
                if let Err(err) = self.call(&cleanup, Vec::new()) {
                    warn!(component = %pending.path, error = %err, "Effect cleanup failed");
                }
            }
            let cleanup = match self.call(&pending.effect, Vec::new()) {
                Ok(value) if value.is_callable() => Some(value),
                Ok(_) => None,
                Err(err) => {
                    warn!(component = %pending.path, error = %err, "Effect failed");
                    None
                }
            };
            if let Some(HookSlot::Effect {
                deps,
                cleanup: slot_cleanup,
            }) = self.host.hooks.slot_mut(&pending.path, pending.index)
            {
                *deps = pending.deps;
                *slot_cleanup = cleanup;
            }
        }
        count
    }

    /// Run cleanups of the given unmounted hook slots
    pub(crate) fn run_cleanups(&mut self, unmounted: Vec<Vec<HookSlot>>) {
        for slots in unmounted {
            for slot in slots {
                if let HookSlot::Effect {
                    cleanup: Some(cleanup),
                    ..
                } = slot
                {
                    if let Err(err) = self.call(&cleanup, Vec::new()) {
                        warn!(error = %err, "Effect cleanup failed on unmount");
                    }
                }
            }
        }
    }

    /// Components currently holding hook state
    pub fn mounted_components(&self) -> usize {
        self.host.hooks.mounted()
    }
}
