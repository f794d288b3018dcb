use crate::env::Env;
use crate::error::RuntimeResult;
use crate::interpreter::Interpreter;
use crate::scope::PlatformScope;
use pagewright_compiler::ast::{Function, ImportedName};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Native function: receives the interpreter, the values bound when the
/// function was created (method receiver, hook address...) and the call
/// arguments.
pub type NativeFn = fn(&mut Interpreter, &[Value], &[Value]) -> RuntimeResult<Value>;

#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<Object>>),
    Function(Rc<Closure>),
    Native(Rc<Native>),
    Element(Rc<Element>),
    Context(Rc<ContextRef>),
    /// The platform scope handed to a unit at instantiation
    Scope(Rc<PlatformScope>),
    /// Unforced reference to another module's export
    Lazy(Rc<LazyImport>),
}

/// Insertion-ordered property map
#[derive(Clone, Default)]
pub struct Object {
    entries: Vec<(String, Value)>,
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Object {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        let mut object = Object::new();
        for (key, value) in iter {
            object.set(key, value);
        }
        object
    }
}

pub struct Closure {
    pub function: Arc<Function>,
    pub env: Env,
}

pub struct Native {
    pub name: &'static str,
    pub func: NativeFn,
    pub bound: Vec<Value>,
}

/// Result of `createElement`
pub struct Element {
    pub kind: ElementKind,
    pub props: Value,
    pub key: Option<String>,
}

pub enum ElementKind {
    /// Lowercase tag rendered as a DOM element
    Intrinsic(String),
    Component(Value),
    /// Supplies a context value to its children
    Provider(Rc<ContextRef>),
    /// A routed component whose `Outlet` renders `outlet`
    Route { component: Value, outlet: Option<Value> },
}

pub struct ContextRef {
    pub id: u64,
    pub default: Value,
}

pub struct LazyImport {
    pub target: LazyTarget,
    pub export: ImportedName,
}

pub enum LazyTarget {
    /// Specifier as written, resolved against the importing module
    Specifier { from: String, specifier: String },
    /// Module key, used by the shell for routed files
    Module(String),
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Value {
        Value::String(Rc::from(s.as_ref()))
    }

    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(object: Object) -> Value {
        Value::Object(Rc::new(RefCell::new(object)))
    }

    pub fn native(name: &'static str, func: NativeFn) -> Value {
        Value::bound_native(name, func, Vec::new())
    }

    pub fn bound_native(name: &'static str, func: NativeFn, bound: Vec<Value>) -> Value {
        Value::Native(Rc::new(Native { name, func, bound }))
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Native(_) | Value::Lazy(_))
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) | Value::Native(_) | Value::Lazy(_) => "function",
            Value::Null
            | Value::Array(_)
            | Value::Object(_)
            | Value::Element(_)
            | Value::Context(_)
            | Value::Scope(_) => "object",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric conversion as used by arithmetic operators
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else if let Some(hex) = trimmed.strip_prefix("0x") {
                    i64::from_str_radix(hex, 16).map(|n| n as f64).unwrap_or(f64::NAN)
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            Value::Array(items) => {
                let items = items.borrow();
                match items.len() {
                    0 => 0.0,
                    1 => items[0].to_number(),
                    _ => f64::NAN,
                }
            }
            _ => f64::NAN,
        }
    }

    /// String conversion as used by templates and concatenation
    pub fn display(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.to_string(),
            Value::Array(items) => items
                .borrow()
                .iter()
                .map(|item| if item.is_nullish() { String::new() } else { item.display() })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(object) => {
                let object = object.borrow();
                if let (Some(name), Some(message)) = (object.get("name"), object.get("message")) {
                    if object.contains("stack") {
                        return format!("{}: {}", name.display(), message.display());
                    }
                }
                "[object Object]".to_string()
            }
            Value::Function(closure) => format!(
                "function {}() {{ [code] }}",
                closure.function.name.as_deref().unwrap_or("")
            ),
            Value::Native(native) => format!("function {}() {{ [native code] }}", native.name),
            Value::Element(_) => "[object Element]".to_string(),
            Value::Context(_) => "[object Context]".to_string(),
            Value::Scope(_) => "[object Platform]".to_string(),
            Value::Lazy(_) => "[object Module]".to_string(),
        }
    }

    /// Text shown for an uncaught throw
    pub fn describe_thrown(&self) -> String {
        match self {
            Value::String(s) => s.to_string(),
            other => other.display(),
        }
    }

    /// Name used for error nodes and debugging
    pub fn callable_name(&self) -> String {
        match self {
            Value::Function(closure) => closure
                .function
                .name
                .clone()
                .unwrap_or_else(|| "Anonymous".to_string()),
            Value::Native(native) => native.name.to_string(),
            Value::Lazy(lazy) => match (&lazy.target, &lazy.export) {
                (_, ImportedName::Named(name)) => name.clone(),
                (LazyTarget::Module(key), _) => key.clone(),
                (LazyTarget::Specifier { specifier, .. }, _) => specifier.clone(),
            },
            other => other.type_of().to_string(),
        }
    }

    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            (Value::Element(a), Value::Element(b)) => Rc::ptr_eq(a, b),
            (Value::Context(a), Value::Context(b)) => Rc::ptr_eq(a, b),
            (Value::Scope(a), Value::Scope(b)) => Rc::ptr_eq(a, b),
            (Value::Lazy(a), Value::Lazy(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, b) if a.is_nullish() || b.is_nullish() => false,
            (Value::Number(_), Value::String(_))
            | (Value::String(_), Value::Number(_))
            | (Value::Bool(_), _)
            | (_, Value::Bool(_)) => self.to_number() == other.to_number(),
            _ => self.strict_equals(other),
        }
    }

    /// Identity used for hook dependencies and state updates (NaN equals NaN)
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan() => true,
            _ => self.strict_equals(other),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            Value::Array(items) => f.debug_list().entries(items.borrow().iter()).finish(),
            Value::Object(object) => f
                .debug_map()
                .entries(object.borrow().iter().map(|(k, v)| (k.to_string(), v.clone())))
                .finish(),
            other => write!(f, "{}", other.display()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(1e3), "1000");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::string("").truthy());
        assert!(Value::string("0").truthy());
        assert!(!Value::Number(0.0).truthy());
        assert!(Value::array(vec![]).truthy());
    }

    #[test]
    fn test_equality() {
        assert!(Value::Null.loose_equals(&Value::Undefined));
        assert!(!Value::Null.strict_equals(&Value::Undefined));
        assert!(Value::string("1").loose_equals(&Value::Number(1.0)));
        let a = Value::array(vec![]);
        assert!(a.strict_equals(&a.clone()));
        assert!(!a.strict_equals(&Value::array(vec![])));
        assert!(Value::Number(f64::NAN).same_value(&Value::Number(f64::NAN)));
    }

    #[test]
    fn test_array_display() {
        let v = Value::array(vec![Value::Number(1.0), Value::Null, Value::string("x")]);
        assert_eq!(v.display(), "1,,x");
    }

    #[test]
    fn test_object_keeps_insertion_order() {
        let mut object = Object::new();
        object.set("b", Value::Number(1.0));
        object.set("a", Value::Number(2.0));
        object.set("b", Value::Number(3.0));
        assert_eq!(object.keys().collect::<Vec<_>>(), vec!["b", "a"]);
    }
}
