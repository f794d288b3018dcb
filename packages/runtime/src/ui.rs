//! The UI catalogue: thin components that render classed intrinsic
//! elements, plus the `cn` class merging helper.

use crate::elements::{arg, intrinsic, prop, props_without};
use crate::error::RuntimeResult;
use crate::interpreter::Interpreter;
use crate::value::{Object, Value};

struct CatalogueEntry {
    name: &'static str,
    tag: &'static str,
    class: &'static str,
    /// Default variant; components without one ignore `variant`
    variant: Option<&'static str>,
    attributes: &'static [(&'static str, &'static str)],
}

const CATALOGUE: &[CatalogueEntry] = &[
    CatalogueEntry {
        name: "Button",
        tag: "button",
        class: "pw-button",
        variant: Some("default"),
        attributes: &[("type", "button")],
    },
    CatalogueEntry {
        name: "Card",
        tag: "div",
        class: "pw-card",
        variant: None,
        attributes: &[],
    },
    CatalogueEntry {
        name: "CardHeader",
        tag: "div",
        class: "pw-card-header",
        variant: None,
        attributes: &[],
    },
    CatalogueEntry {
        name: "CardTitle",
        tag: "h3",
        class: "pw-card-title",
        variant: None,
        attributes: &[],
    },
    CatalogueEntry {
        name: "CardContent",
        tag: "div",
        class: "pw-card-content",
        variant: None,
        attributes: &[],
    },
    CatalogueEntry {
        name: "Input",
        tag: "input",
        class: "pw-input",
        variant: None,
        attributes: &[("type", "text")],
    },
    CatalogueEntry {
        name: "Badge",
        tag: "span",
        class: "pw-badge",
        variant: Some("default"),
        attributes: &[],
    },
    CatalogueEntry {
        name: "Alert",
        tag: "div",
        class: "pw-alert",
        variant: Some("info"),
        attributes: &[("role", "alert")],
    },
    CatalogueEntry {
        name: "Stack",
        tag: "div",
        class: "pw-stack",
        variant: None,
        attributes: &[],
    },
    CatalogueEntry {
        name: "Spinner",
        tag: "span",
        class: "pw-spinner",
        variant: None,
        attributes: &[("role", "status"), ("aria-label", "Loading")],
    },
];

const CONSUMED: &[&str] = &["variant", "size", "direction", "gap", "className"];

fn ui_component(_: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let index = arg(bound, 0).to_number() as usize;
    let Some(entry) = CATALOGUE.get(index) else {
        return Ok(Value::Null);
    };
    let props = arg(args, 0);

    let mut classes = vec![Value::string(entry.class)];
    if let Some(default) = entry.variant {
        let variant = match prop(&props, "variant") {
            Value::String(variant) => variant.to_string(),
            _ => default.to_string(),
        };
        classes.push(Value::from(format!("{}--{}", entry.class, variant)));
    }
    if let Value::String(size) = prop(&props, "size") {
        classes.push(Value::from(format!("{}--{}", entry.class, size)));
    }
    if entry.name == "Stack" {
        let direction = match prop(&props, "direction") {
            Value::String(direction) if &*direction == "row" => "row",
            _ => "column",
        };
        classes.push(Value::from(format!("pw-stack--{}", direction)));
        if let Value::Number(gap) = prop(&props, "gap") {
            classes.push(Value::from(format!("pw-gap-{}", gap as i64)));
        }
    }
    classes.push(prop(&props, "className"));

    let mut attributes = Object::new();
    for (key, value) in entry.attributes {
        attributes.set(*key, Value::string(value));
    }
    for (key, value) in props_without(&props, CONSUMED).iter() {
        attributes.set(key, value.clone());
    }
    attributes.set("className", Value::from(merge_classes(&classes)));
    Ok(intrinsic(entry.tag, attributes))
}

pub(crate) fn ui_layer() -> Vec<(&'static str, Value)> {
    CATALOGUE
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            (
                entry.name,
                Value::bound_native(entry.name, ui_component, vec![Value::Number(index as f64)]),
            )
        })
        .collect()
}

fn collect_classes(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.extend(s.split_whitespace().map(str::to_string)),
        Value::Number(_) => out.push(value.display()),
        Value::Array(items) => {
            for item in items.borrow().iter() {
                collect_classes(item, out);
            }
        }
        Value::Object(object) => {
            for (key, enabled) in object.borrow().iter() {
                if enabled.truthy() {
                    out.extend(key.split_whitespace().map(str::to_string));
                }
            }
        }
        _ => {}
    }
}

/// Merge class values into one space separated list, keeping the first
/// occurrence of each class
pub fn merge_classes(values: &[Value]) -> String {
    let mut classes = Vec::new();
    for value in values {
        collect_classes(value, &mut classes);
    }
    let mut merged: Vec<String> = Vec::with_capacity(classes.len());
    for class in classes {
        if !merged.contains(&class) {
            merged.push(class);
        }
    }
    merged.join(" ")
}

fn cn(_: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::from(merge_classes(args)))
}

pub(crate) fn utilities_layer() -> Vec<(&'static str, Value)> {
    vec![("cn", Value::native("cn", cn))]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_classes() {
        let values = [
            Value::string("card  active"),
            Value::Bool(false),
            Value::Undefined,
            Value::array(vec![Value::string("wide"), Value::string("card")]),
            Value::object(Object::from_iter([
                ("hidden", Value::Bool(false)),
                ("bold", Value::Bool(true)),
            ])),
        ];
        assert_eq!(merge_classes(&values), "card active wide bold");
    }

    #[test]
    fn test_catalogue_names_are_unique() {
        let mut names: Vec<_> = CATALOGUE.iter().map(|entry| entry.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), CATALOGUE.len());
    }
}
