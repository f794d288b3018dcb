//! Tree-walking evaluation of executable units.
//!
//! The interpreter owns everything one running application needs: the
//! global built-ins, the platform scope, the module registry and the host
//! state hooks read from. It is single-threaded; values are `Rc`-shared.

use crate::builtins;
use crate::elements;
use crate::env::Env;
use crate::error::{RuntimeError, RuntimeResult, ScopeError};
use crate::host::{Host, HostServices};
use crate::module::ModuleRegistry;
use crate::scope::PlatformScope;
use crate::value::{Closure, LazyImport, LazyTarget, Object, Value};
use pagewright_compiler::ast::*;
use pagewright_compiler::ExecutableUnit;
use std::rc::Rc;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Nested user function calls before a RangeError
    pub max_call_depth: usize,
    /// Iterations of a single loop before a RangeError
    pub max_loop_iterations: usize,
    /// Longest array or padded string user code may create
    pub max_array_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_call_depth: 64,
            max_loop_iterations: 100_000,
            max_array_length: 1 << 20,
        }
    }
}

pub(crate) enum Completion {
    Normal,
    Return(Value),
    Break,
    Continue,
}

pub struct Interpreter {
    globals: Env,
    scope: Rc<PlatformScope>,
    pub(crate) modules: ModuleRegistry,
    pub(crate) host: Host,
    limits: Limits,
    depth: usize,
    pub(crate) module_stack: Vec<String>,
}

impl Interpreter {
    pub fn new(scope: PlatformScope, services: HostServices, limits: Limits) -> Self {
        Self {
            globals: builtins::globals(),
            scope: Rc::new(scope),
            modules: ModuleRegistry::default(),
            host: Host::new(services),
            limits,
            depth: 0,
            module_stack: Vec::new(),
        }
    }

    pub fn scope(&self) -> &PlatformScope {
        &self.scope
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// A length requested by user code, within `max_array_length`
    pub(crate) fn checked_length(&self, len: f64) -> RuntimeResult<usize> {
        if !(0.0..=self.limits.max_array_length as f64).contains(&len) || len.fract() != 0.0 {
            return Err(RuntimeError::type_error("Invalid array length"));
        }
        Ok(len as usize)
    }

    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    pub fn modules_mut(&mut self) -> &mut ModuleRegistry {
        &mut self.modules
    }

    pub(crate) fn current_module(&self) -> &str {
        self.module_stack.last().map(String::as_str).unwrap_or("")
    }

    /// Execute a unit outside the module registry and return its top-level
    /// environment
    pub fn run_unit(&mut self, unit: &ExecutableUnit) -> RuntimeResult<Env> {
        self.check_platform_names(unit, "<script>")?;
        let env = self.globals.child();
        self.exec_block(unit.body(), &env)?;
        Ok(env)
    }

    pub(crate) fn module_env(&self) -> Env {
        self.globals.child()
    }

    pub(crate) fn check_platform_names(&self, unit: &ExecutableUnit, module: &str) -> Result<(), ScopeError> {
        match unit.platform_names().find(|name| !self.scope.contains(name)) {
            Some(name) => Err(ScopeError::Unknown {
                name: name.to_string(),
                module: module.to_string(),
            }),
            None => Ok(()),
        }
    }

    // ---- statements ----

    pub(crate) fn exec_block(&mut self, stmts: &[Stmt], env: &Env) -> RuntimeResult<Completion> {
        for stmt in stmts {
            if let Stmt::Function(function) = stmt {
                if let Some(name) = &function.name {
                    env.declare(name, self.closure(function, env), true);
                }
            }
        }
        for stmt in stmts {
            match self.exec(stmt, env)? {
                Completion::Normal => {}
                abrupt => return Ok(abrupt),
            }
        }
        Ok(Completion::Normal)
    }

    fn exec(&mut self, stmt: &Stmt, env: &Env) -> RuntimeResult<Completion> {
        match stmt {
            Stmt::Var(decl) => {
                let mutable = decl.kind != DeclKind::Const;
                for declarator in &decl.declarators {
                    let value = match &declarator.init {
                        Some(init) => self.eval(init, env)?,
                        None => Value::Undefined,
                    };
                    self.bind_pattern(&declarator.pattern, value, env, mutable)?;
                }
                Ok(Completion::Normal)
            }
            Stmt::Function(_) | Stmt::Empty => Ok(Completion::Normal),
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Undefined,
                };
                Ok(Completion::Return(value))
            }
            Stmt::If {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test, env)?.truthy() {
                    self.exec_scoped(consequent, env)
                } else if let Some(alternate) = alternate {
                    self.exec_scoped(alternate, env)
                } else {
                    Ok(Completion::Normal)
                }
            }
            Stmt::Block(stmts) => self.exec_block(stmts, &env.child()),
            Stmt::Loop {
                kind,
                each,
                pattern,
                iterable,
                body,
            } => {
                let source = self.eval(iterable, env)?;
                let items = match each {
                    LoopEach::Of => self.iterate(&source)?,
                    LoopEach::In => keys_of(&source).into_iter().map(Value::from).collect(),
                };
                let mutable = *kind != DeclKind::Const;
                for (count, item) in items.into_iter().enumerate() {
                    self.check_iterations(count)?;
                    let scope = env.child();
                    self.bind_pattern(pattern, item, &scope, mutable)?;
                    match self.exec_scoped(body, &scope)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal | Completion::Continue => {}
                    }
                }
                Ok(Completion::Normal)
            }
            Stmt::While { test, body } => {
                let mut count = 0;
                while self.eval(test, env)?.truthy() {
                    self.check_iterations(count)?;
                    count += 1;
                    match self.exec_scoped(body, env)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal | Completion::Continue => {}
                    }
                }
                Ok(Completion::Normal)
            }
            Stmt::Break => Ok(Completion::Break),
            Stmt::Continue => Ok(Completion::Continue),
            Stmt::Throw(expr) => Err(RuntimeError::Thrown(self.eval(expr, env)?)),
            Stmt::Try {
                block,
                param,
                handler,
                finalizer,
            } => self.exec_try(block, param.as_ref(), handler.as_deref(), finalizer.as_deref(), env),
            Stmt::Expr(expr) => {
                self.eval(expr, env)?;
                Ok(Completion::Normal)
            }
            Stmt::Import(_) | Stmt::Export(_) => {
                Err(RuntimeError::Unsupported("Module declaration inside a body".to_string()))
            }
        }
    }

    fn exec_scoped(&mut self, stmt: &Stmt, env: &Env) -> RuntimeResult<Completion> {
        match stmt {
            Stmt::Block(stmts) => self.exec_block(stmts, &env.child()),
            other => self.exec(other, env),
        }
    }

    fn exec_try(
        &mut self,
        block: &[Stmt],
        param: Option<&Pattern>,
        handler: Option<&[Stmt]>,
        finalizer: Option<&[Stmt]>,
        env: &Env,
    ) -> RuntimeResult<Completion> {
        let mut result = self.exec_block(block, &env.child());
        if let Some(handler) = handler {
            let caught = match &result {
                Err(err) if err.is_catchable() => Some(error_value(err.clone())),
                _ => None,
            };
            if let Some(caught) = caught {
                let scope = env.child();
                result = match param {
                    Some(pattern) => self
                        .bind_pattern(pattern, caught, &scope, true)
                        .and_then(|_| self.exec_block(handler, &scope)),
                    None => self.exec_block(handler, &scope),
                };
            }
        }
        if let Some(finalizer) = finalizer {
            match self.exec_block(finalizer, &env.child())? {
                Completion::Normal => {}
                abrupt => return Ok(abrupt),
            }
        }
        result
    }

    fn check_iterations(&self, count: usize) -> RuntimeResult<()> {
        if count >= self.limits.max_loop_iterations {
            return Err(RuntimeError::LoopLimit(self.limits.max_loop_iterations));
        }
        Ok(())
    }

    pub(crate) fn bind_pattern(
        &mut self,
        pattern: &Pattern,
        value: Value,
        env: &Env,
        mutable: bool,
    ) -> RuntimeResult<()> {
        match pattern {
            Pattern::Ident(name) => {
                env.declare(name, value, mutable);
                Ok(())
            }
            Pattern::Object { props, rest } => {
                if value.is_nullish() {
                    return Err(RuntimeError::type_error(format!(
                        "Cannot destructure '{}' as it is {}",
                        value.display(),
                        value.type_of()
                    )));
                }
                for (key, elem) in props {
                    let mut item = self.get_property(&value, key)?;
                    if let (Value::Undefined, Some(default)) = (&item, &elem.default) {
                        item = self.eval(default, env)?;
                    }
                    self.bind_pattern(&elem.pattern, item, env, mutable)?;
                }
                if let Some(rest) = rest {
                    let remaining: Object = match &value {
                        Value::Object(object) => object
                            .borrow()
                            .iter()
                            .filter(|(k, _)| !props.iter().any(|(taken, _)| taken == k))
                            .map(|(k, v)| (k.to_string(), v.clone()))
                            .collect(),
                        _ => Object::new(),
                    };
                    env.declare(rest, Value::object(remaining), mutable);
                }
                Ok(())
            }
            Pattern::Array { elements, rest } => {
                let items = self.iterate(&value)?;
                for (i, elem) in elements.iter().enumerate() {
                    let Some(elem) = elem else { continue };
                    let mut item = items.get(i).cloned().unwrap_or(Value::Undefined);
                    if let (Value::Undefined, Some(default)) = (&item, &elem.default) {
                        item = self.eval(default, env)?;
                    }
                    self.bind_pattern(&elem.pattern, item, env, mutable)?;
                }
                if let Some(rest) = rest {
                    let tail = items.get(elements.len()..).map(<[Value]>::to_vec).unwrap_or_default();
                    self.bind_pattern(rest, Value::array(tail), env, mutable)?;
                }
                Ok(())
            }
        }
    }

    // ---- expressions ----

    pub(crate) fn eval(&mut self, expr: &Expr, env: &Env) -> RuntimeResult<Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::String(s) => Ok(Value::string(s)),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Undefined => Ok(Value::Undefined),
            Expr::Template(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Str(s) => out.push_str(s),
                        TemplatePart::Expr(expr) => out.push_str(&self.eval(expr, env)?.display()),
                    }
                }
                Ok(Value::from(out))
            }
            Expr::Ident(name) => self.read_ident(name, env),
            Expr::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        ArrayItem::Item(expr) => values.push(self.eval(expr, env)?),
                        ArrayItem::Spread(expr) => {
                            let source = self.eval(expr, env)?;
                            values.extend(self.iterate(&source)?);
                        }
                    }
                }
                Ok(Value::array(values))
            }
            Expr::Object(props) => self.eval_object(props, env),
            Expr::Function(function) => Ok(self.closure(function, env)),
            Expr::Unary { op, arg } => self.eval_unary(*op, arg, env),
            Expr::Binary { op, left, right } => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                Ok(binary(*op, &left, &right))
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left, env)?;
                let short_circuit = match op {
                    LogicalOp::And => !left.truthy(),
                    LogicalOp::Or => left.truthy(),
                    LogicalOp::Nullish => !left.is_nullish(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.eval(right, env)
                }
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test, env)?.truthy() {
                    self.eval(consequent, env)
                } else {
                    self.eval(alternate, env)
                }
            }
            Expr::Assign { op, target, value } => self.eval_assign(*op, target, value, env),
            Expr::Member { .. } | Expr::Call { .. } | Expr::OptionalChain(_) => {
                let inner = match expr {
                    Expr::OptionalChain(inner) => inner.as_ref(),
                    other => other,
                };
                Ok(self.eval_link(inner, env)?.unwrap_or(Value::Undefined))
            }
            Expr::New { callee, args } => {
                let constructor = self.eval(callee, env)?;
                let args = self.eval_args(args, env)?;
                match constructor {
                    Value::Native(_) => self.call(&constructor, args),
                    _ => Err(RuntimeError::Unsupported(format!(
                        "'new {}'",
                        describe_expr(callee)
                    ))),
                }
            }
            Expr::Markup(_) => Err(RuntimeError::Unsupported("Unlowered markup".to_string())),
            Expr::Intrinsic(Intrinsic::CreateElement) => Ok(elements::create_element_value()),
            Expr::Intrinsic(Intrinsic::Fragment) => Ok(elements::fragment_value()),
            Expr::PlatformScope => Ok(Value::Scope(self.scope.clone())),
            Expr::ModuleRef(module_ref) => Ok(Value::Lazy(Rc::new(LazyImport {
                target: LazyTarget::Specifier {
                    from: self.current_module().to_string(),
                    specifier: module_ref.specifier.clone(),
                },
                export: module_ref.export.clone(),
            }))),
        }
    }

    fn closure(&self, function: &Arc<Function>, env: &Env) -> Value {
        Value::Function(Rc::new(Closure {
            function: function.clone(),
            env: env.clone(),
        }))
    }

    fn read_ident(&mut self, name: &str, env: &Env) -> RuntimeResult<Value> {
        match env.lookup(name) {
            Some(value) => self.force(value),
            None => Err(RuntimeError::Reference(name.to_string())),
        }
    }

    fn eval_object(&mut self, props: &[Property], env: &Env) -> RuntimeResult<Value> {
        let mut object = Object::new();
        for prop in props {
            match prop {
                Property::KeyValue { key, value } => {
                    let key = match key {
                        PropKey::Named(name) => name.clone(),
                        PropKey::Computed(expr) => self.eval(expr, env)?.display(),
                    };
                    let value = self.eval(value, env)?;
                    object.set(key, value);
                }
                Property::Shorthand(name) => {
                    let value = self.read_ident(name, env)?;
                    object.set(name.clone(), value);
                }
                Property::Spread(expr) => {
                    let source = self.eval(expr, env)?;
                    match &source {
                        Value::Object(other) => {
                            for (k, v) in other.borrow().iter() {
                                object.set(k, v.clone());
                            }
                        }
                        Value::Array(items) => {
                            for (i, v) in items.borrow().iter().enumerate() {
                                object.set(i.to_string(), v.clone());
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
        Ok(Value::object(object))
    }

    fn eval_unary(&mut self, op: UnaryOp, arg: &Expr, env: &Env) -> RuntimeResult<Value> {
        if let (UnaryOp::Typeof, Expr::Ident(name)) = (op, arg) {
            return Ok(match env.lookup(name) {
                Some(value) => Value::string(self.force(value)?.type_of()),
                None => Value::string("undefined"),
            });
        }
        let value = self.eval(arg, env)?;
        Ok(match op {
            UnaryOp::Not => Value::Bool(!value.truthy()),
            UnaryOp::Neg => Value::Number(-value.to_number()),
            UnaryOp::Plus => Value::Number(value.to_number()),
            UnaryOp::Typeof => Value::string(value.type_of()),
            UnaryOp::Void => Value::Undefined,
        })
    }

    fn eval_assign(&mut self, op: AssignOp, target: &Expr, value: &Expr, env: &Env) -> RuntimeResult<Value> {
        match target {
            Expr::Ident(name) => {
                let value = self.eval(value, env)?;
                let value = match op {
                    AssignOp::Assign => value,
                    _ => combine(op, &self.read_ident(name, env)?, &value),
                };
                env.assign(name, value.clone())?;
                Ok(value)
            }
            Expr::Member { object, property, .. } => {
                let object = self.eval(object, env)?;
                let key = self.property_key(property, env)?;
                let value = self.eval(value, env)?;
                let value = match op {
                    AssignOp::Assign => value,
                    _ => combine(op, &self.get_property(&object, &key)?, &value),
                };
                self.set_property(&object, &key, value.clone())?;
                Ok(value)
            }
            _ => Err(RuntimeError::type_error("Invalid assignment target")),
        }
    }

    /// One link of a member/call chain; `None` when an optional link
    /// short-circuited
    fn eval_link(&mut self, expr: &Expr, env: &Env) -> RuntimeResult<Option<Value>> {
        match expr {
            Expr::Member {
                object,
                property,
                optional,
            } => {
                let Some(target) = self.eval_link(object, env)? else {
                    return Ok(None);
                };
                if *optional && target.is_nullish() {
                    return Ok(None);
                }
                let key = self.property_key(property, env)?;
                if target.is_nullish() {
                    return Err(RuntimeError::type_error(format!(
                        "Cannot read properties of {} (reading '{}')",
                        target.display(),
                        key
                    )));
                }
                self.get_property(&target, &key).map(Some)
            }
            Expr::Call {
                callee,
                args,
                optional,
            } => {
                let Some(function) = self.eval_link(callee, env)? else {
                    return Ok(None);
                };
                if *optional && function.is_nullish() {
                    return Ok(None);
                }
                if !function.is_callable() {
                    return Err(RuntimeError::type_error(format!(
                        "{} is not a function",
                        describe_expr(callee)
                    )));
                }
                let args = self.eval_args(args, env)?;
                self.call(&function, args).map(Some)
            }
            other => self.eval(other, env).map(Some),
        }
    }

    fn property_key(&mut self, property: &MemberProp, env: &Env) -> RuntimeResult<String> {
        match property {
            MemberProp::Named(name) => Ok(name.clone()),
            MemberProp::Computed(expr) => Ok(self.eval(expr, env)?.display()),
        }
    }

    fn eval_args(&mut self, args: &[Argument], env: &Env) -> RuntimeResult<Vec<Value>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Argument::Expr(expr) => values.push(self.eval(expr, env)?),
                Argument::Spread(expr) => {
                    let source = self.eval(expr, env)?;
                    values.extend(self.iterate(&source)?);
                }
            }
        }
        Ok(values)
    }

    // ---- calls and properties ----

    pub fn call(&mut self, callee: &Value, args: Vec<Value>) -> RuntimeResult<Value> {
        match callee {
            Value::Function(closure) => {
                if self.depth >= self.limits.max_call_depth {
                    return Err(RuntimeError::DepthExceeded(self.limits.max_call_depth));
                }
                self.depth += 1;
                let result = self.invoke(closure, args);
                self.depth -= 1;
                result
            }
            Value::Native(native) => (native.func)(self, &native.bound, &args),
            Value::Lazy(_) => {
                let forced = self.force(callee.clone())?;
                self.call(&forced, args)
            }
            other => Err(RuntimeError::type_error(format!(
                "{} is not a function",
                other.type_of()
            ))),
        }
    }

    fn invoke(&mut self, closure: &Closure, args: Vec<Value>) -> RuntimeResult<Value> {
        let function = &closure.function;
        let env = closure.env.child();
        for (i, param) in function.params.iter().enumerate() {
            let value = if param.rest {
                Value::array(args.get(i..).map(<[Value]>::to_vec).unwrap_or_default())
            } else {
                match (args.get(i).cloned().unwrap_or(Value::Undefined), &param.default) {
                    (Value::Undefined, Some(default)) => self.eval(default, &env)?,
                    (value, _) => value,
                }
            };
            self.bind_pattern(&param.pattern, value, &env, true)?;
        }
        match &function.body {
            FunctionBody::Expr(expr) => self.eval(expr, &env),
            FunctionBody::Block(stmts) => match self.exec_block(stmts, &env)? {
                Completion::Return(value) => Ok(value),
                _ => Ok(Value::Undefined),
            },
        }
    }

    /// Replace an unforced module reference by the export it names
    pub fn force(&mut self, mut value: Value) -> RuntimeResult<Value> {
        while let Value::Lazy(lazy) = &value {
            let lazy = lazy.clone();
            value = self.resolve_lazy(&lazy)?;
        }
        Ok(value)
    }

    pub fn get_property(&mut self, target: &Value, key: &str) -> RuntimeResult<Value> {
        match target {
            Value::Object(object) => Ok(object.borrow().get(key).cloned().unwrap_or(Value::Undefined)),
            Value::Array(items) => {
                if key == "length" {
                    return Ok(Value::Number(items.borrow().len() as f64));
                }
                if let Ok(index) = key.parse::<usize>() {
                    return Ok(items.borrow().get(index).cloned().unwrap_or(Value::Undefined));
                }
                Ok(builtins::array_method(key)
                    .map(|(name, func)| Value::bound_native(name, func, vec![target.clone()]))
                    .unwrap_or(Value::Undefined))
            }
            Value::String(s) => {
                if key == "length" {
                    return Ok(Value::Number(s.chars().count() as f64));
                }
                if let Ok(index) = key.parse::<usize>() {
                    return Ok(s
                        .chars()
                        .nth(index)
                        .map(|c| Value::from(c.to_string()))
                        .unwrap_or(Value::Undefined));
                }
                Ok(builtins::string_method(key)
                    .map(|(name, func)| Value::bound_native(name, func, vec![target.clone()]))
                    .unwrap_or(Value::Undefined))
            }
            Value::Number(_) => Ok(builtins::number_method(key)
                .map(|(name, func)| Value::bound_native(name, func, vec![target.clone()]))
                .unwrap_or(Value::Undefined)),
            Value::Element(element) => Ok(match key {
                "props" => element.props.clone(),
                "key" => element.key.clone().map(Value::from).unwrap_or(Value::Null),
                _ => Value::Undefined,
            }),
            Value::Context(_) if key == "Provider" => Ok(target.clone()),
            Value::Scope(scope) => scope.get(key).cloned().ok_or_else(|| {
                ScopeError::Unknown {
                    name: key.to_string(),
                    module: self.current_module().to_string(),
                }
                .into()
            }),
            Value::Lazy(_) => {
                let forced = self.force(target.clone())?;
                self.get_property(&forced, key)
            }
            Value::Function(_) | Value::Native(_) if key == "name" => Ok(Value::from(target.callable_name())),
            Value::Undefined | Value::Null => Err(RuntimeError::type_error(format!(
                "Cannot read properties of {} (reading '{}')",
                target.display(),
                key
            ))),
            _ => Ok(Value::Undefined),
        }
    }

    pub fn set_property(&mut self, target: &Value, key: &str, value: Value) -> RuntimeResult<()> {
        match target {
            Value::Object(object) => {
                object.borrow_mut().set(key, value);
                Ok(())
            }
            Value::Array(items) => {
                if key == "length" {
                    let len = self.checked_length(value.to_number())?;
                    items.borrow_mut().resize(len, Value::Undefined);
                    return Ok(());
                }
                let index: usize = key
                    .parse()
                    .map_err(|_| RuntimeError::type_error(format!("Cannot set property '{}' of an array", key)))?;
                let mut items = items.borrow_mut();
                if index >= items.len() {
                    let len = index
                        .checked_add(1)
                        .filter(|len| *len <= self.limits.max_array_length)
                        .ok_or_else(|| RuntimeError::type_error("Invalid array length"))?;
                    items.resize(len, Value::Undefined);
                }
                items[index] = value;
                Ok(())
            }
            other => Err(RuntimeError::type_error(format!(
                "Cannot set property '{}' of {}",
                key,
                other.type_of()
            ))),
        }
    }

    /// Items visited by spread, destructuring and `for...of`
    pub fn iterate(&mut self, value: &Value) -> RuntimeResult<Vec<Value>> {
        match value {
            Value::Array(items) => Ok(items.borrow().clone()),
            Value::String(s) => Ok(s.chars().map(|c| Value::from(c.to_string())).collect()),
            Value::Lazy(_) => {
                let forced = self.force(value.clone())?;
                self.iterate(&forced)
            }
            other => Err(RuntimeError::type_error(format!(
                "{} is not iterable",
                other.type_of()
            ))),
        }
    }
}

impl RuntimeError {
    /// Whether `try/catch` in user code may intercept this error
    pub fn is_catchable(&self) -> bool {
        !matches!(self, RuntimeError::DepthExceeded(_) | RuntimeError::LoopLimit(_))
    }

    fn js_name(&self) -> &'static str {
        match self {
            RuntimeError::Reference(_) => "ReferenceError",
            RuntimeError::Type(_) | RuntimeError::ConstAssign(_) => "TypeError",
            RuntimeError::DepthExceeded(_) | RuntimeError::LoopLimit(_) => "RangeError",
            _ => "Error",
        }
    }
}

/// Value bound by `catch (e)`
pub(crate) fn error_value(err: RuntimeError) -> Value {
    match err {
        RuntimeError::Thrown(value) => value,
        other => {
            let message = match &other {
                RuntimeError::Reference(name) => format!("{} is not defined", name),
                RuntimeError::Type(message) => message.clone(),
                _ => other.to_string(),
            };
            make_error(other.js_name(), &message)
        }
    }
}

pub fn make_error(name: &str, message: &str) -> Value {
    Value::object(Object::from_iter([
        ("name", Value::string(name)),
        ("message", Value::string(message)),
        ("stack", Value::string("")),
    ]))
}

fn keys_of(value: &Value) -> Vec<String> {
    match value {
        Value::Object(object) => object.borrow().keys().map(str::to_string).collect(),
        Value::Array(items) => (0..items.borrow().len()).map(|i| i.to_string()).collect(),
        _ => Vec::new(),
    }
}

fn is_primitive(value: &Value) -> bool {
    matches!(
        value,
        Value::Undefined | Value::Null | Value::Bool(_) | Value::Number(_)
    )
}

pub(crate) fn add(left: &Value, right: &Value) -> Value {
    if is_primitive(left) && is_primitive(right) {
        Value::Number(left.to_number() + right.to_number())
    } else {
        Value::from(format!("{}{}", left.display(), right.display()))
    }
}

fn combine(op: AssignOp, current: &Value, value: &Value) -> Value {
    match op {
        AssignOp::AddAssign => add(current, value),
        AssignOp::SubAssign => Value::Number(current.to_number() - value.to_number()),
        AssignOp::Assign => value.clone(),
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
        BinaryOp::Rem => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::StrictEq => Value::Bool(left.strict_equals(right)),
        BinaryOp::StrictNotEq => Value::Bool(!left.strict_equals(right)),
        BinaryOp::LooseEq => Value::Bool(left.loose_equals(right)),
        BinaryOp::LooseNotEq => Value::Bool(!left.loose_equals(right)),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            let ordering = match (left, right) {
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => left.to_number().partial_cmp(&right.to_number()),
            };
            let Some(ordering) = ordering else {
                return Value::Bool(false);
            };
            Value::Bool(match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::LtEq => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            })
        }
    }
}

/// Short source-like rendering of a callee for error messages
fn describe_expr(expr: &Expr) -> String {
    match expr {
        Expr::Ident(name) => name.clone(),
        Expr::Member { object, property, .. } => match property {
            MemberProp::Named(name) => format!("{}.{}", describe_expr(object), name),
            MemberProp::Computed(_) => format!("{}[...]", describe_expr(object)),
        },
        Expr::Call { callee, .. } => format!("{}(...)", describe_expr(callee)),
        Expr::OptionalChain(inner) => describe_expr(inner),
        _ => "expression".to_string(),
    }
}
