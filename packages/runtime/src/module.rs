//! Module index and lazy cross-file resolution.
//!
//! Every file of a version is compiled first and registered here under its
//! module key. Imports between files are bound as unforced references and
//! looked up only when user code reads them, so the order in which files
//! were compiled or registered never matters.

use crate::env::Env;
use crate::error::{ResolveError, RuntimeResult};
use crate::interpreter::Interpreter;
use crate::value::{LazyImport, LazyTarget, Object, Value};
use pagewright_common::{module_key, resolve_specifier};
use pagewright_compiler::ast::ImportedName;
use pagewright_compiler::{CompileError, CompileOutcome, ExecutableUnit};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

/// An instantiated module: its unit and top-level environment
pub struct ModuleInstance {
    pub key: String,
    unit: Arc<ExecutableUnit>,
    env: Env,
}

impl ModuleInstance {
    pub fn unit(&self) -> &ExecutableUnit {
        &self.unit
    }

    /// Binding behind an export, possibly still unforced
    fn raw_export(&self, exported: &str) -> Option<Value> {
        let local = self.unit.exports().local_for(exported)?;
        self.env.lookup(local)
    }
}

enum Slot {
    Loading,
    Ready(Rc<ModuleInstance>),
}

struct Entry {
    path: String,
    outcome: CompileOutcome,
}

/// Compiled files of one version, indexed by module key
#[derive(Default)]
pub struct ModuleRegistry {
    entries: BTreeMap<String, Entry>,
    instances: HashMap<String, Slot>,
}

impl ModuleRegistry {
    /// Register the compile outcome of a file, replacing any previous one
    pub fn insert(&mut self, path: &str, outcome: CompileOutcome) {
        let key = module_key(path);
        self.instances.remove(&key);
        self.entries.insert(
            key,
            Entry {
                path: path.to_string(),
                outcome,
            },
        );
    }

    pub fn remove(&mut self, path: &str) -> bool {
        let key = module_key(path);
        self.instances.remove(&key);
        self.entries.remove(&key).is_some()
    }

    /// Drop every file and instance
    pub fn clear(&mut self) {
        self.entries.clear();
        self.instances.clear();
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// File path registered under a module key
    pub fn path_of(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|entry| entry.path.as_str())
    }

    pub fn compile_error(&self, key: &str) -> Option<&CompileError> {
        self.entries.get(key).and_then(|entry| entry.outcome.as_ref().err())
    }

    /// Compile errors by file path
    pub fn diagnostics(&self) -> BTreeMap<String, CompileError> {
        self.entries
            .values()
            .filter_map(|entry| {
                entry
                    .outcome
                    .as_ref()
                    .err()
                    .map(|err| (entry.path.clone(), err.clone()))
            })
            .collect()
    }

    pub fn is_instantiated(&self, key: &str) -> bool {
        matches!(self.instances.get(key), Some(Slot::Ready(_)))
    }
}

/// Reference to the default export of a module, resolved when first used
pub fn component_ref(key: &str) -> Value {
    Value::Lazy(Rc::new(LazyImport {
        target: LazyTarget::Module(key.to_string()),
        export: ImportedName::Default,
    }))
}

impl Interpreter {
    /// Instantiate a module once; failed attempts are not remembered so a
    /// later fix or newly registered sibling can succeed
    pub fn load_module(&mut self, key: &str) -> RuntimeResult<Rc<ModuleInstance>> {
        match self.modules.instances.get(key) {
            Some(Slot::Ready(instance)) => return Ok(instance.clone()),
            Some(Slot::Loading) => {
                let mut chain = self.module_stack.clone();
                chain.push(key.to_string());
                return Err(ResolveError::Cycle(chain).into());
            }
            None => {}
        }

        let unit = match self.modules.entries.get(key) {
            None => return Err(ResolveError::ModuleNotFound(key.to_string()).into()),
            Some(Entry {
                outcome: Err(err), ..
            }) => {
                return Err(ResolveError::CompileFailed {
                    module: key.to_string(),
                    message: err.to_string(),
                }
                .into())
            }
            Some(Entry {
                outcome: Ok(unit), ..
            }) => unit.clone(),
        };
        self.check_platform_names(&unit, key)?;

        debug!(module = key, "Instantiating module");
        self.modules.instances.insert(key.to_string(), Slot::Loading);
        self.module_stack.push(key.to_string());
        let env = self.module_env();
        let result = self.exec_block(unit.body(), &env);
        self.module_stack.pop();

        match result {
            Ok(_) => {
                let instance = Rc::new(ModuleInstance {
                    key: key.to_string(),
                    unit,
                    env,
                });
                self.modules
                    .instances
                    .insert(key.to_string(), Slot::Ready(instance.clone()));
                Ok(instance)
            }
            Err(err) => {
                self.modules.instances.remove(key);
                Err(err)
            }
        }
    }

    /// Forced value of one export
    pub fn export_value(&mut self, instance: &ModuleInstance, exported: &str) -> RuntimeResult<Value> {
        let value = instance
            .raw_export(exported)
            .ok_or_else(|| ResolveError::ExportNotFound {
                module: instance.key.clone(),
                export: exported.to_string(),
            })?;
        self.force(value)
    }

    pub(crate) fn resolve_lazy(&mut self, lazy: &LazyImport) -> RuntimeResult<Value> {
        let key = match &lazy.target {
            LazyTarget::Module(key) => key.clone(),
            LazyTarget::Specifier { from, specifier } => resolve_specifier(from, specifier).ok_or_else(|| {
                ResolveError::BadSpecifier {
                    from: from.clone(),
                    specifier: specifier.clone(),
                }
            })?,
        };
        let instance = self.load_module(&key)?;
        match &lazy.export {
            ImportedName::Default => {
                if !instance.unit().has_default_export() {
                    return Err(ResolveError::NoDefaultExport(key).into());
                }
                self.export_value(&instance, "default")
            }
            ImportedName::Named(name) => self.export_value(&instance, name),
            ImportedName::Namespace => {
                let mut names: Vec<String> = instance
                    .unit()
                    .exports()
                    .named()
                    .iter()
                    .map(|export| export.exported.clone())
                    .collect();
                if instance.unit().has_default_export() {
                    names.push("default".to_string());
                }
                let mut namespace = Object::new();
                for name in names {
                    let value = self.export_value(&instance, &name)?;
                    namespace.set(name, value);
                }
                Ok(Value::object(namespace))
            }
        }
    }

    /// Renderable component behind a module's default export
    pub fn resolve_component(&mut self, key: &str) -> RuntimeResult<Value> {
        let instance = self.load_module(key)?;
        if !instance.unit().has_default_export() {
            return Err(ResolveError::NoDefaultExport(key.to_string()).into());
        }
        let component = self.export_value(&instance, "default")?;
        if !component.is_callable() {
            return Err(ResolveError::NotAComponent(key.to_string()).into());
        }
        Ok(component)
    }
}
