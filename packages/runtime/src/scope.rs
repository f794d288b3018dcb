//! The platform scope: every capability compiled units can import.
//!
//! Built once per interpreter from named layers. A layer may only replace
//! names it declares on its override list, and every name on that list
//! must replace something, so collisions are never resolved silently.

use crate::elements::{create_element_value, fragment_value};
use crate::error::ScopeError;
use crate::hooks;
use crate::routing;
use crate::ui;
use crate::value::Value;
use std::collections::HashMap;
use tracing::debug;

/// Names the navigation layer replaces in the router layer
pub const NAVIGATION_OVERRIDES: &[&str] = &["Link", "NavLink", "Navigate", "navigate", "useNavigate"];

/// Names the shell needs to render any application
pub const REQUIRED: &[&str] = &["createElement", "Fragment", "Outlet"];

struct Entry {
    value: Value,
    layer: &'static str,
}

/// A name replaced by a later layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    pub name: &'static str,
    pub replaced: &'static str,
    pub by: &'static str,
}

pub struct PlatformScope {
    entries: HashMap<&'static str, Entry>,
    layers: Vec<&'static str>,
    overrides: Vec<Override>,
}

impl PlatformScope {
    pub fn builder() -> ScopeBuilder {
        ScopeBuilder {
            scope: PlatformScope {
                entries: HashMap::new(),
                layers: Vec::new(),
                overrides: Vec::new(),
            },
        }
    }

    /// The scope every application runs against
    pub fn standard() -> Result<PlatformScope, ScopeError> {
        let scope = PlatformScope::builder()
            .layer("library", library_layer())?
            .layer("router", routing::router_layer())?
            .override_layer("navigation", NAVIGATION_OVERRIDES, routing::navigation_layer())?
            .layer(
                "workflow",
                vec![("useWorkflow", Value::native("useWorkflow", hooks::use_workflow))],
            )?
            .layer("session", vec![("useUser", Value::native("useUser", hooks::use_user))])?
            .layer(
                "state",
                vec![("useAppState", Value::native("useAppState", hooks::use_app_state))],
            )?
            .layer("ui", ui::ui_layer())?
            .layer("utilities", ui::utilities_layer())?
            .build()?;
        debug!(names = scope.len(), layers = scope.layers.len(), "Platform scope built");
        Ok(scope)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name).map(|entry| &entry.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Layer providing a name
    pub fn layer_of(&self, name: &str) -> Option<&'static str> {
        self.entries.get(name).map(|entry| entry.layer)
    }

    pub fn layers(&self) -> &[&'static str] {
        &self.layers
    }

    pub fn overrides(&self) -> &[Override] {
        &self.overrides
    }

    /// Sorted capability names
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct ScopeBuilder {
    scope: PlatformScope,
}

impl ScopeBuilder {
    /// Add a layer that replaces nothing
    pub fn layer(self, name: &'static str, entries: Vec<(&'static str, Value)>) -> Result<Self, ScopeError> {
        self.override_layer(name, &[], entries)
    }

    /// Add a layer that replaces exactly the names on `overrides`
    pub fn override_layer(
        mut self,
        name: &'static str,
        overrides: &[&'static str],
        entries: Vec<(&'static str, Value)>,
    ) -> Result<Self, ScopeError> {
        if let Some(missing) = overrides
            .iter()
            .find(|listed| !entries.iter().any(|(entry, _)| entry == *listed))
        {
            return Err(ScopeError::MissingOverride {
                name: missing.to_string(),
                layer: name.to_string(),
            });
        }

        for (entry_name, value) in entries {
            match self.scope.entries.get(entry_name) {
                Some(existing) if overrides.contains(&entry_name) => {
                    self.scope.overrides.push(Override {
                        name: entry_name,
                        replaced: existing.layer,
                        by: name,
                    });
                }
                Some(existing) if existing.layer == name => {
                    return Err(ScopeError::Collision {
                        name: entry_name.to_string(),
                        layer: name.to_string(),
                        existing: name.to_string(),
                    });
                }
                Some(_) => {
                    return Err(ScopeError::UnlistedOverride {
                        name: entry_name.to_string(),
                        layer: name.to_string(),
                    });
                }
                None if overrides.contains(&entry_name) => {
                    return Err(ScopeError::MissingOverride {
                        name: entry_name.to_string(),
                        layer: name.to_string(),
                    });
                }
                None => {}
            }
            self.scope.entries.insert(entry_name, Entry { value, layer: name });
        }
        self.scope.layers.push(name);
        Ok(self)
    }

    pub fn build(self) -> Result<PlatformScope, ScopeError> {
        if let Some(missing) = REQUIRED.iter().find(|name| !self.scope.contains(name)) {
            return Err(ScopeError::MissingRequired(missing.to_string()));
        }
        Ok(self.scope)
    }
}

fn library_layer() -> Vec<(&'static str, Value)> {
    vec![
        ("createElement", create_element_value()),
        ("Fragment", fragment_value()),
        ("useState", Value::native("useState", hooks::use_state)),
        ("useEffect", Value::native("useEffect", hooks::use_effect)),
        ("useMemo", Value::native("useMemo", hooks::use_memo)),
        ("useCallback", Value::native("useCallback", hooks::use_callback)),
        ("useRef", Value::native("useRef", hooks::use_ref)),
        ("createContext", Value::native("createContext", hooks::create_context)),
        ("useContext", Value::native("useContext", hooks::use_context)),
    ]
}
