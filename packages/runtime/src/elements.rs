use crate::error::{RuntimeError, RuntimeResult};
use crate::interpreter::Interpreter;
use crate::json::key_of;
use crate::value::{Element, ElementKind, Object, Value};
use std::rc::Rc;

pub(crate) fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Undefined)
}

pub(crate) fn create_element_value() -> Value {
    Value::native("createElement", create_element)
}

pub(crate) fn fragment_value() -> Value {
    Value::native("Fragment", fragment)
}

/// `createElement(type, props, ...children)`
pub(crate) fn create_element(_: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let mut props = match args.get(1) {
        Some(Value::Object(object)) => object.borrow().clone(),
        None | Some(Value::Null) | Some(Value::Undefined) => Object::new(),
        Some(other) => {
            return Err(RuntimeError::type_error(format!(
                "Element props must be an object, got {}",
                other.type_of()
            )))
        }
    };
    let key = props.remove("key").filter(|k| !k.is_nullish()).map(|k| key_of(&k));

    match args.get(2..) {
        Some([child]) => props.set("children", child.clone()),
        Some(children) if !children.is_empty() => props.set("children", Value::array(children.to_vec())),
        _ => {}
    }

    let kind = match arg(args, 0) {
        Value::String(tag) => ElementKind::Intrinsic(tag.to_string()),
        Value::Context(context) => ElementKind::Provider(context),
        component if component.is_callable() => ElementKind::Component(component),
        other => {
            return Err(RuntimeError::type_error(format!(
                "Element type is invalid: expected a tag name or a component but got {}",
                other.type_of()
            )))
        }
    };
    Ok(element(kind, props, key))
}

/// Fragments render their children in place
fn fragment(_: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    match args.first() {
        Some(Value::Object(props)) => Ok(props.borrow().get("children").cloned().unwrap_or(Value::Undefined)),
        _ => Ok(Value::Undefined),
    }
}

pub fn element(kind: ElementKind, props: Object, key: Option<String>) -> Value {
    Value::Element(Rc::new(Element {
        kind,
        props: Value::object(props),
        key,
    }))
}

pub fn intrinsic(tag: &str, props: Object) -> Value {
    element(ElementKind::Intrinsic(tag.to_string()), props, None)
}

/// Component element with the given props
pub fn component_element(component: Value, props: Object) -> Value {
    element(ElementKind::Component(component), props, None)
}

/// Routed component whose `Outlet` renders `outlet`
pub fn route_element(component: Value, outlet: Option<Value>) -> Value {
    element(ElementKind::Route { component, outlet }, Object::new(), None)
}

/// Copy of a props object without the listed keys
pub(crate) fn props_without(props: &Value, skip: &[&str]) -> Object {
    match props {
        Value::Object(object) => object
            .borrow()
            .iter()
            .filter(|(key, _)| !skip.contains(key))
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect(),
        _ => Object::new(),
    }
}

pub(crate) fn prop(props: &Value, key: &str) -> Value {
    match props {
        Value::Object(object) => object.borrow().get(key).cloned().unwrap_or(Value::Undefined),
        _ => Value::Undefined,
    }
}
