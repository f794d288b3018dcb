//! Turning element values into virtual DOM.
//!
//! Every component call is its own error boundary: a failure while a
//! component renders becomes an error node in its place and rendering of
//! its siblings continues.

use crate::elements::prop;
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::value::{Element, ElementKind, Object, Value};
use crate::vdom::VNode;
use std::collections::BTreeMap;
use tracing::{instrument, warn};

const UNITLESS: &[&str] = &["opacity", "zIndex", "fontWeight", "flex", "flexGrow", "flexShrink", "lineHeight", "order"];

impl Interpreter {
    /// Render a tree, then unmount components that were not visited
    #[instrument(level = "debug", skip_all)]
    pub fn render(&mut self, root: &Value) -> VNode {
        self.host.hooks.begin_pass();
        self.host.handlers.clear();
        self.host.contexts.clear();
        self.host.outlets.clear();
        self.host.render_depth = 0;

        let mut nodes = Vec::new();
        self.render_value(root, "", "0", &mut nodes);

        let unmounted = self.host.hooks.take_unmounted();
        self.run_cleanups(unmounted);

        if nodes.len() == 1 {
            nodes.remove(0)
        } else {
            VNode::Fragment { children: nodes }
        }
    }

    fn render_value(&mut self, value: &Value, parent: &str, slot: &str, out: &mut Vec<VNode>) {
        match value {
            Value::Undefined | Value::Null | Value::Bool(_) => {}
            Value::String(text) => out.push(VNode::text(text.to_string())),
            Value::Number(_) => out.push(VNode::text(value.display())),
            Value::Array(items) => {
                let items = items.borrow().clone();
                for (i, item) in items.iter().enumerate() {
                    self.render_value(item, parent, &format!("{}.{}", slot, i), out);
                }
            }
            Value::Element(element) => self.render_element(element, parent, slot, out),
            Value::Lazy(_) => match self.force(value.clone()) {
                Ok(forced) => self.render_value(&forced, parent, slot, out),
                Err(err) => out.push(VNode::error(None, err.to_string())),
            },
            Value::Function(_) | Value::Native(_) => {}
            other => out.push(VNode::error(
                None,
                format!("{} is not valid as a child", other.display()),
            )),
        }
    }

    fn render_children(&mut self, props: &Value, path: &str, out: &mut Vec<VNode>) {
        match prop(props, "children") {
            Value::Array(items) => {
                let items = items.borrow().clone();
                for (i, item) in items.iter().enumerate() {
                    self.render_value(item, path, &i.to_string(), out);
                }
            }
            child => self.render_value(&child, path, "0", out),
        }
    }

    fn render_element(&mut self, element: &Element, parent: &str, slot: &str, out: &mut Vec<VNode>) {
        let segment = element.key.as_deref().unwrap_or(slot);
        match &element.kind {
            ElementKind::Intrinsic(tag) => {
                let path = format!("{}/{}:{}", parent, segment, tag);
                let (attributes, handlers) = self.attributes(&element.props);
                let mut children = Vec::new();
                self.render_children(&element.props, &path, &mut children);
                out.push(VNode::Element {
                    tag: tag.clone(),
                    attributes,
                    handlers,
                    children,
                });
            }
            ElementKind::Component(component) => {
                self.render_component(component, &element.props, parent, segment, out);
            }
            ElementKind::Provider(context) => {
                let path = format!("{}/{}:Provider", parent, segment);
                self.host.contexts.push((context.id, prop(&element.props, "value")));
                self.render_children(&element.props, &path, out);
                self.host.contexts.pop();
            }
            ElementKind::Route { component, outlet } => {
                self.host.outlets.push(outlet.clone());
                self.render_component(component, &Value::object(Object::new()), parent, segment, out);
                self.host.outlets.pop();
            }
        }
    }

    fn render_component(&mut self, component: &Value, props: &Value, parent: &str, segment: &str, out: &mut Vec<VNode>) {
        let component = match self.force(component.clone()) {
            Ok(component) => component,
            Err(err) => {
                warn!(error = %err, "Component could not be resolved");
                out.push(VNode::error(None, err.to_string()));
                return;
            }
        };
        let name = component.callable_name();
        let path = format!("{}/{}:{}", parent, segment, name);
        let limit = self.limits().max_call_depth;
        if self.host.render_depth >= limit {
            out.push(VNode::error(Some(name), RuntimeError::DepthExceeded(limit).to_string()));
            return;
        }

        let effects = self.host.hooks.effects_mark();
        self.host.hooks.enter(&path);
        let result = self.call(&component, vec![props.clone()]);
        self.host.hooks.exit();

        match result {
            Ok(output) => {
                self.host.render_depth += 1;
                self.render_value(&output, &path, "0", out);
                self.host.render_depth -= 1;
            }
            Err(err) => {
                warn!(component = %name, error = %err, "Component failed to render");
                self.host.hooks.discard_effects(effects);
                out.push(VNode::error(Some(name), err.to_string()));
            }
        }
    }

    fn attributes(&mut self, props: &Value) -> (BTreeMap<String, String>, BTreeMap<String, String>) {
        let mut attributes = BTreeMap::new();
        let mut handlers = BTreeMap::new();
        let Value::Object(object) = props else {
            return (attributes, handlers);
        };
        let entries: Vec<(String, Value)> = object
            .borrow()
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect();

        for (key, value) in entries {
            if key == "children" || key == "ref" {
                continue;
            }
            if let Some(event) = key.strip_prefix("on").filter(|_| value.is_callable()) {
                let id = self.host.register_handler(value);
                handlers.insert(event.to_lowercase(), id);
                continue;
            }
            let name = match key.as_str() {
                "className" => "class".to_string(),
                "htmlFor" => "for".to_string(),
                _ => key.clone(),
            };
            if let Some(text) = attribute_text(&name, &value) {
                attributes.insert(name, text);
            }
        }
        (attributes, handlers)
    }
}

fn attribute_text(name: &str, value: &Value) -> Option<String> {
    let data = name.starts_with("aria-") || name.starts_with("data-");
    match value {
        Value::Undefined | Value::Null => None,
        Value::Bool(b) if data => Some(b.to_string()),
        Value::Bool(true) => Some(String::new()),
        Value::Bool(false) => None,
        Value::Object(style) if name == "style" => Some(
            style
                .borrow()
                .iter()
                .filter(|(_, value)| !value.is_nullish())
                .map(|(key, value)| {
                    let text = match value {
                        Value::Number(n) if *n != 0.0 && !UNITLESS.contains(&key) => format!("{}px", value.display()),
                        _ => value.display(),
                    };
                    format!("{}: {}", kebab_case(key), text)
                })
                .collect::<Vec<_>>()
                .join("; "),
        ),
        value if value.is_callable() => None,
        value => Some(value.display()),
    }
}

fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
