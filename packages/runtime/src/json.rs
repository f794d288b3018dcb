//! Conversion between runtime values and JSON, used by `JSON.*`,
//! workflow parameters and event payloads.

use crate::value::{format_number, Object, Value};
use serde_json::{Map, Number};

/// Functions and other non-data values become `None` (omitted)
pub fn to_json(value: &Value) -> Option<serde_json::Value> {
    to_json_depth(value, 0)
}

fn to_json_depth(value: &Value, depth: usize) -> Option<serde_json::Value> {
    if depth > 64 {
        return Some(serde_json::Value::Null);
    }
    Some(match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => match Number::from_f64(*n) {
            Some(_) if n.fract() == 0.0 && n.abs() < 9e15 => serde_json::Value::from(*n as i64),
            Some(number) => serde_json::Value::Number(number),
            None => serde_json::Value::Null,
        },
        Value::String(s) => serde_json::Value::String(s.to_string()),
        Value::Array(items) => serde_json::Value::Array(
            items
                .borrow()
                .iter()
                .map(|item| to_json_depth(item, depth + 1).unwrap_or(serde_json::Value::Null))
                .collect(),
        ),
        Value::Object(object) => {
            let mut map = Map::new();
            for (key, item) in object.borrow().iter() {
                if let Some(json) = to_json_depth(item, depth + 1) {
                    map.insert(key.to_string(), json);
                }
            }
            serde_json::Value::Object(map)
        }
        Value::Undefined
        | Value::Function(_)
        | Value::Native(_)
        | Value::Element(_)
        | Value::Context(_)
        | Value::Scope(_)
        | Value::Lazy(_) => return None,
    })
}

pub fn from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::string(s),
        serde_json::Value::Array(items) => Value::array(items.iter().map(from_json).collect()),
        serde_json::Value::Object(map) => Value::object(
            map.iter()
                .map(|(key, item)| (key.clone(), from_json(item)))
                .collect::<Object>(),
        ),
    }
}

/// `JSON.stringify` text; `None` stands for `undefined`
pub fn stringify(value: &Value, indent: Option<usize>) -> Option<String> {
    let json = to_json(value)?;
    let text = match indent {
        Some(width) if width > 0 => {
            let indent = vec![b' '; width.min(10)];
            let mut out = Vec::new();
            let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
            let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
            serde::Serialize::serialize(&json, &mut serializer).ok()?;
            String::from_utf8(out).ok()?
        }
        _ => json.to_string(),
    };
    Some(text)
}

/// Key used for numeric object keys and array indices
pub fn key_of(value: &Value) -> String {
    match value {
        Value::Number(n) => format_number(*n),
        other => other.display(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip_keeps_integers() {
        let value = from_json(&json!({"a": [1, 2.5, null], "b": "x"}));
        assert_eq!(to_json(&value), Some(json!({"a": [1, 2.5, null], "b": "x"})));
    }

    #[test]
    fn test_undefined_members_are_omitted() {
        let value = Value::object(Object::from_iter([
            ("keep", Value::Number(1.0)),
            ("drop", Value::Undefined),
        ]));
        assert_eq!(stringify(&value, None).unwrap(), r#"{"keep":1}"#);
        assert_eq!(stringify(&Value::Undefined, None), None);
    }

    #[test]
    fn test_pretty_printing() {
        let value = from_json(&json!({"a": 1}));
        assert_eq!(stringify(&value, Some(2)).unwrap(), "{\n  \"a\": 1\n}");
    }
}
