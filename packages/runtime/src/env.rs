use crate::error::{RuntimeError, RuntimeResult};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

struct Binding {
    value: Value,
    mutable: bool,
}

#[derive(Default)]
struct Frame {
    vars: HashMap<String, Binding>,
    parent: Option<Env>,
}

/// Lexical environment: a chain of frames shared by closures
#[derive(Clone, Default)]
pub struct Env(Rc<RefCell<Frame>>);

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child(&self) -> Env {
        Env(Rc::new(RefCell::new(Frame {
            vars: HashMap::new(),
            parent: Some(self.clone()),
        })))
    }

    /// Bind a name in this frame, shadowing outer frames
    pub fn declare(&self, name: &str, value: Value, mutable: bool) {
        self.0
            .borrow_mut()
            .vars
            .insert(name.to_string(), Binding { value, mutable });
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        let frame = self.0.borrow();
        match frame.vars.get(name) {
            Some(binding) => Some(binding.value.clone()),
            None => frame.parent.as_ref()?.lookup(name),
        }
    }

    pub fn assign(&self, name: &str, value: Value) -> RuntimeResult<()> {
        let mut frame = self.0.borrow_mut();
        if let Some(binding) = frame.vars.get_mut(name) {
            if !binding.mutable {
                return Err(RuntimeError::ConstAssign(name.to_string()));
            }
            binding.value = value;
            return Ok(());
        }
        match &frame.parent {
            Some(parent) => parent.assign(name, value),
            None => Err(RuntimeError::Reference(name.to_string())),
        }
    }
}
