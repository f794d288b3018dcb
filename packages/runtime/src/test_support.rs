use crate::{component_element, component_ref, HostServices, Interpreter, Limits, Object, PlatformScope, RuntimeResult, VNode, Value};
use pagewright_compiler::compile;
use std::sync::Arc;

pub fn interpreter_with(services: HostServices) -> Interpreter {
    let limits = Limits {
        max_call_depth: 32,
        ..Limits::default()
    };
    Interpreter::new(PlatformScope::standard().unwrap(), services, limits)
}

pub fn interpreter() -> Interpreter {
    interpreter_with(HostServices::default())
}

/// Run a script and return its top-level `result` binding
pub fn run(source: &str) -> RuntimeResult<Value> {
    let mut interp = interpreter();
    let unit = compile(source).unwrap();
    let env = interp.run_unit(&unit)?;
    Ok(env.lookup("result").unwrap_or(Value::Undefined))
}

pub fn register(interp: &mut Interpreter, files: &[(&str, &str)]) {
    for (path, source) in files {
        interp.modules_mut().insert(path, compile(source).map(Arc::new));
    }
}

pub fn with_files(files: &[(&str, &str)]) -> Interpreter {
    let mut interp = interpreter();
    register(&mut interp, files);
    interp
}

/// Render the default export of a module with no props
pub fn render(interp: &mut Interpreter, key: &str) -> VNode {
    let root = component_element(component_ref(key), Object::new());
    let node = interp.render(&root);
    interp.commit_effects();
    node
}

/// Dispatch the handler a node registered for `event`
pub fn fire(interp: &mut Interpreter, node: &VNode, event: &str) {
    let handler = node.handler(event).unwrap().to_string();
    interp.dispatch(&handler, &serde_json::Value::Null).unwrap();
}

pub fn export(interp: &mut Interpreter, key: &str, name: &str) -> Value {
    let instance = interp.load_module(key).unwrap();
    interp.export_value(&instance, name).unwrap()
}
