//! Globals and methods of primitive values available to every unit.

use crate::elements::arg;
use crate::env::Env;
use crate::error::{RuntimeError, RuntimeResult};
use crate::interpreter::{make_error, Interpreter};
use crate::json::{from_json, stringify};
use crate::value::{format_number, NativeFn, Object, Value};
use std::cmp::Ordering;
use tracing::{debug, error, info, warn};

fn receiver(bound: &[Value]) -> Value {
    arg(bound, 0)
}

fn methods(entries: &[(&'static str, NativeFn)]) -> Value {
    Value::object(
        entries
            .iter()
            .map(|(name, func)| (*name, Value::native(*name, *func)))
            .collect(),
    )
}

pub(crate) fn globals() -> Env {
    let env = Env::new();
    env.declare(
        "console",
        methods(&[
            ("log", console_log),
            ("info", console_log),
            ("debug", console_debug),
            ("warn", console_warn),
            ("error", console_error),
        ]),
        false,
    );
    env.declare("Math", math(), false);
    env.declare(
        "JSON",
        methods(&[("stringify", json_stringify), ("parse", json_parse)]),
        false,
    );
    env.declare(
        "Object",
        methods(&[
            ("keys", object_keys),
            ("values", object_values),
            ("entries", object_entries),
            ("assign", object_assign),
            ("fromEntries", object_from_entries),
        ]),
        false,
    );
    env.declare(
        "Array",
        methods(&[("isArray", array_is_array), ("from", array_from)]),
        false,
    );
    env.declare("String", Value::native("String", to_string), false);
    env.declare("Number", Value::native("Number", to_number), false);
    env.declare("Boolean", Value::native("Boolean", to_boolean), false);
    env.declare("Error", Value::native("Error", new_error), false);
    env.declare("parseInt", Value::native("parseInt", parse_int), false);
    env.declare("parseFloat", Value::native("parseFloat", parse_float), false);
    env.declare("undefined", Value::Undefined, false);
    env.declare("NaN", Value::Number(f64::NAN), false);
    env.declare("Infinity", Value::Number(f64::INFINITY), false);
    env
}

// ---- console ----

fn console_text(args: &[Value]) -> String {
    args.iter()
        .map(|value| match value {
            Value::String(s) => s.to_string(),
            Value::Array(_) | Value::Object(_) => {
                stringify(value, None).unwrap_or_else(|| value.display())
            }
            other => other.display(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn console_log(interp: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    info!(target: "user_code", module = interp.current_module(), "{}", console_text(args));
    Ok(Value::Undefined)
}

fn console_debug(interp: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    debug!(target: "user_code", module = interp.current_module(), "{}", console_text(args));
    Ok(Value::Undefined)
}

fn console_warn(interp: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    warn!(target: "user_code", module = interp.current_module(), "{}", console_text(args));
    Ok(Value::Undefined)
}

fn console_error(interp: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    error!(target: "user_code", module = interp.current_module(), "{}", console_text(args));
    Ok(Value::Undefined)
}

// ---- Math ----

fn math() -> Value {
    let mut object = Object::new();
    object.set("PI", Value::Number(std::f64::consts::PI));
    object.set("E", Value::Number(std::f64::consts::E));
    let unary: [(&'static str, NativeFn); 7] = [
        ("floor", |_, _, args| Ok(Value::Number(arg(args, 0).to_number().floor()))),
        ("ceil", |_, _, args| Ok(Value::Number(arg(args, 0).to_number().ceil()))),
        ("round", |_, _, args| Ok(Value::Number((arg(args, 0).to_number() + 0.5).floor()))),
        ("abs", |_, _, args| Ok(Value::Number(arg(args, 0).to_number().abs()))),
        ("sqrt", |_, _, args| Ok(Value::Number(arg(args, 0).to_number().sqrt()))),
        ("trunc", |_, _, args| Ok(Value::Number(arg(args, 0).to_number().trunc()))),
        ("sign", |_, _, args| {
            let n = arg(args, 0).to_number();
            Ok(Value::Number(if n == 0.0 || n.is_nan() { n } else { n.signum() }))
        }),
    ];
    for (name, func) in unary {
        object.set(name, Value::native(name, func));
    }
    object.set("min", Value::native("min", math_min));
    object.set("max", Value::native("max", math_max));
    object.set(
        "pow",
        Value::native("pow", |_, _, args| {
            Ok(Value::Number(arg(args, 0).to_number().powf(arg(args, 1).to_number())))
        }),
    );
    Value::object(object)
}

fn math_min(_: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Number(args.iter().map(Value::to_number).fold(f64::INFINITY, |a, b| {
        if a.is_nan() || b.is_nan() {
            f64::NAN
        } else {
            a.min(b)
        }
    })))
}

fn math_max(_: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Number(args.iter().map(Value::to_number).fold(f64::NEG_INFINITY, |a, b| {
        if a.is_nan() || b.is_nan() {
            f64::NAN
        } else {
            a.max(b)
        }
    })))
}

// ---- JSON ----

fn json_stringify(_: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let indent = match arg(args, 2) {
        Value::Number(n) if n > 0.0 => Some(n as usize),
        _ => None,
    };
    Ok(stringify(&arg(args, 0), indent).map(Value::from).unwrap_or(Value::Undefined))
}

fn json_parse(_: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let text = arg(args, 0).display();
    serde_json::from_str::<serde_json::Value>(&text)
        .map(|json| from_json(&json))
        .map_err(|err| RuntimeError::Thrown(make_error("SyntaxError", &err.to_string())))
}

// ---- Object / Array ----

fn entries_of(value: &Value) -> Vec<(String, Value)> {
    match value {
        Value::Object(object) => object
            .borrow()
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect(),
        Value::Array(items) => items
            .borrow()
            .iter()
            .enumerate()
            .map(|(i, value)| (i.to_string(), value.clone()))
            .collect(),
        _ => Vec::new(),
    }
}

fn object_keys(_: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::array(
        entries_of(&arg(args, 0)).into_iter().map(|(key, _)| Value::from(key)).collect(),
    ))
}

fn object_values(_: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::array(
        entries_of(&arg(args, 0)).into_iter().map(|(_, value)| value).collect(),
    ))
}

fn object_entries(_: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::array(
        entries_of(&arg(args, 0))
            .into_iter()
            .map(|(key, value)| Value::array(vec![Value::from(key), value]))
            .collect(),
    ))
}

fn object_assign(_: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let target = arg(args, 0);
    let Value::Object(object) = &target else {
        return Err(RuntimeError::type_error("Object.assign target must be an object"));
    };
    for source in args.iter().skip(1) {
        for (key, value) in entries_of(source) {
            object.borrow_mut().set(key, value);
        }
    }
    Ok(target)
}

fn object_from_entries(interp: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let mut object = Object::new();
    for pair in interp.iterate(&arg(args, 0))? {
        let pair = interp.iterate(&pair)?;
        object.set(arg(&pair, 0).display(), arg(&pair, 1));
    }
    Ok(Value::object(object))
}

fn array_is_array(_: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Bool(matches!(arg(args, 0), Value::Array(_))))
}

fn array_from(interp: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let source = arg(args, 0);
    let items = match &source {
        Value::Object(object) => {
            let len = object.borrow().get("length").map_or(0.0, Value::to_number);
            vec![Value::Undefined; interp.checked_length(len.max(0.0).trunc())?]
        }
        other => interp.iterate(other)?,
    };
    let mapper = arg(args, 1);
    if !mapper.is_callable() {
        return Ok(Value::array(items));
    }
    let mut mapped = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        mapped.push(interp.call(&mapper, vec![item, Value::Number(i as f64)])?);
    }
    Ok(Value::array(mapped))
}

// ---- conversions ----

fn to_string(_: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::from(args.first().map(Value::display).unwrap_or_default()))
}

fn to_number(_: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Number(args.first().map_or(0.0, Value::to_number)))
}

fn to_boolean(_: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Bool(arg(args, 0).truthy()))
}

fn new_error(_: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let message = match arg(args, 0) {
        Value::Undefined => String::new(),
        other => other.display(),
    };
    Ok(make_error("Error", &message))
}

fn parse_int(_: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let text = arg(args, 0).display();
    let text = text.trim_start();
    let radix = match arg(args, 1) {
        Value::Number(r) if (2.0..=36.0).contains(&r) => r as u32,
        _ => 10,
    };
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let digits: String = digits.chars().take_while(|c| c.is_digit(radix)).collect();
    if digits.is_empty() {
        return Ok(Value::Number(f64::NAN));
    }
    let value = digits
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0.0, |acc, d| acc * radix as f64 + d as f64);
    Ok(Value::Number(if negative { -value } else { value }))
}

fn parse_float(_: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let text = arg(args, 0).display();
    let text = text.trim_start();
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in text.char_indices() {
        match c {
            '0'..='9' => end = i + 1,
            '.' if !seen_dot => seen_dot = true,
            '-' | '+' if i == 0 => {}
            _ => break,
        }
    }
    Ok(Value::Number(text[..end].parse().unwrap_or(f64::NAN)))
}

// ---- array methods ----

pub(crate) fn array_method(key: &str) -> Option<(&'static str, NativeFn)> {
    let method: (&'static str, NativeFn) = match key {
        "map" => ("map", array_map),
        "filter" => ("filter", array_filter),
        "find" => ("find", array_find),
        "findIndex" => ("findIndex", array_find_index),
        "some" => ("some", array_some),
        "every" => ("every", array_every),
        "forEach" => ("forEach", array_for_each),
        "reduce" => ("reduce", array_reduce),
        "includes" => ("includes", array_includes),
        "indexOf" => ("indexOf", array_index_of),
        "join" => ("join", array_join),
        "slice" => ("slice", array_slice),
        "concat" => ("concat", array_concat),
        "push" => ("push", array_push),
        "sort" => ("sort", array_sort),
        "reverse" => ("reverse", array_reverse),
        _ => return None,
    };
    Some(method)
}

fn items_of(bound: &[Value]) -> Vec<Value> {
    match receiver(bound) {
        Value::Array(items) => items.borrow().clone(),
        _ => Vec::new(),
    }
}

fn callback(args: &[Value], method: &str) -> RuntimeResult<Value> {
    let callback = arg(args, 0);
    if callback.is_callable() {
        Ok(callback)
    } else {
        Err(RuntimeError::type_error(format!(
            "{} is not a function (in Array.{})",
            callback.type_of(),
            method
        )))
    }
}

/// Call `f(item, index, array)` for every item until `visit` says stop
fn each(
    interp: &mut Interpreter,
    bound: &[Value],
    args: &[Value],
    method: &str,
    mut visit: impl FnMut(usize, &Value, Value) -> bool,
) -> RuntimeResult<()> {
    let f = callback(args, method)?;
    let array = receiver(bound);
    for (i, item) in items_of(bound).into_iter().enumerate() {
        let result = interp.call(&f, vec![item.clone(), Value::Number(i as f64), array.clone()])?;
        if !visit(i, &item, result) {
            break;
        }
    }
    Ok(())
}

fn array_map(interp: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let mut out = Vec::new();
    each(interp, bound, args, "map", |_, _, result| {
        out.push(result);
        true
    })?;
    Ok(Value::array(out))
}

fn array_filter(interp: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let mut out = Vec::new();
    each(interp, bound, args, "filter", |_, item, result| {
        if result.truthy() {
            out.push(item.clone());
        }
        true
    })?;
    Ok(Value::array(out))
}

fn array_find(interp: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let mut found = Value::Undefined;
    each(interp, bound, args, "find", |_, item, result| {
        if result.truthy() {
            found = item.clone();
            return false;
        }
        true
    })?;
    Ok(found)
}

fn array_find_index(interp: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let mut found = -1.0;
    each(interp, bound, args, "findIndex", |i, _, result| {
        if result.truthy() {
            found = i as f64;
            return false;
        }
        true
    })?;
    Ok(Value::Number(found))
}

fn array_some(interp: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let mut any = false;
    each(interp, bound, args, "some", |_, _, result| {
        any = result.truthy();
        !any
    })?;
    Ok(Value::Bool(any))
}

fn array_every(interp: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let mut all = true;
    each(interp, bound, args, "every", |_, _, result| {
        all = result.truthy();
        all
    })?;
    Ok(Value::Bool(all))
}

fn array_for_each(interp: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    each(interp, bound, args, "forEach", |_, _, _| true)?;
    Ok(Value::Undefined)
}

fn array_reduce(interp: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let f = callback(args, "reduce")?;
    let array = receiver(bound);
    let mut items = items_of(bound).into_iter().enumerate();
    let mut acc = match args.get(1) {
        Some(initial) => initial.clone(),
        None => match items.next() {
            Some((_, first)) => first,
            None => return Err(RuntimeError::type_error("Reduce of empty array with no initial value")),
        },
    };
    for (i, item) in items {
        acc = interp.call(&f, vec![acc, item, Value::Number(i as f64), array.clone()])?;
    }
    Ok(acc)
}

fn array_includes(_: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let needle = arg(args, 0);
    Ok(Value::Bool(items_of(bound).iter().any(|item| item.same_value(&needle))))
}

fn array_index_of(_: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let needle = arg(args, 0);
    Ok(Value::Number(
        items_of(bound)
            .iter()
            .position(|item| item.strict_equals(&needle))
            .map_or(-1.0, |i| i as f64),
    ))
}

fn array_join(_: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let separator = match arg(args, 0) {
        Value::Undefined => ",".to_string(),
        other => other.display(),
    };
    Ok(Value::from(
        items_of(bound)
            .iter()
            .map(|item| if item.is_nullish() { String::new() } else { item.display() })
            .collect::<Vec<_>>()
            .join(&separator),
    ))
}

/// Resolve `slice(start, end)` bounds the way negative offsets count from
/// the end
fn slice_bounds(len: usize, start: &Value, end: &Value) -> (usize, usize) {
    let clamp = |value: &Value, default: usize| -> usize {
        match value {
            Value::Undefined => default,
            other => {
                let n = other.to_number();
                if n.is_nan() {
                    0
                } else if n < 0.0 {
                    (len as f64 + n).max(0.0) as usize
                } else {
                    (n as usize).min(len)
                }
            }
        }
    };
    let start = clamp(start, 0);
    let end = clamp(end, len);
    (start, end.max(start))
}

fn array_slice(_: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let items = items_of(bound);
    let (start, end) = slice_bounds(items.len(), &arg(args, 0), &arg(args, 1));
    Ok(Value::array(items[start..end].to_vec()))
}

fn array_concat(_: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let mut items = items_of(bound);
    for value in args {
        match value {
            Value::Array(more) => items.extend(more.borrow().iter().cloned()),
            other => items.push(other.clone()),
        }
    }
    Ok(Value::array(items))
}

fn array_push(_: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    match receiver(bound) {
        Value::Array(items) => {
            let mut items = items.borrow_mut();
            items.extend(args.iter().cloned());
            Ok(Value::Number(items.len() as f64))
        }
        _ => Ok(Value::Undefined),
    }
}

/// Sorts in place; without a comparator items compare as strings
fn array_sort(interp: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let array = receiver(bound);
    let Value::Array(cell) = &array else {
        return Ok(array);
    };
    let mut items = cell.borrow().clone();
    let comparator = arg(args, 0);
    let mut failure = None;
    items.sort_by(|a, b| {
        if failure.is_some() {
            return Ordering::Equal;
        }
        if !comparator.is_callable() {
            return a.display().cmp(&b.display());
        }
        match interp.call(&comparator, vec![a.clone(), b.clone()]) {
            Ok(result) => result.to_number().partial_cmp(&0.0).unwrap_or(Ordering::Equal),
            Err(err) => {
                failure = Some(err);
                Ordering::Equal
            }
        }
    });
    if let Some(err) = failure {
        return Err(err);
    }
    *cell.borrow_mut() = items;
    Ok(array)
}

fn array_reverse(_: &mut Interpreter, bound: &[Value], _: &[Value]) -> RuntimeResult<Value> {
    let array = receiver(bound);
    if let Value::Array(items) = &array {
        items.borrow_mut().reverse();
    }
    Ok(array)
}

// ---- string methods ----

pub(crate) fn string_method(key: &str) -> Option<(&'static str, NativeFn)> {
    let method: (&'static str, NativeFn) = match key {
        "toUpperCase" => ("toUpperCase", string_to_upper_case),
        "toLowerCase" => ("toLowerCase", string_to_lower_case),
        "trim" => ("trim", string_trim),
        "includes" => ("includes", string_includes),
        "startsWith" => ("startsWith", string_starts_with),
        "endsWith" => ("endsWith", string_ends_with),
        "split" => ("split", string_split),
        "slice" => ("slice", string_slice),
        "replace" => ("replace", string_replace),
        "padStart" => ("padStart", string_pad_start),
        _ => return None,
    };
    Some(method)
}

fn text_of(bound: &[Value]) -> String {
    receiver(bound).display()
}

fn string_to_upper_case(_: &mut Interpreter, bound: &[Value], _: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::from(text_of(bound).to_uppercase()))
}

fn string_to_lower_case(_: &mut Interpreter, bound: &[Value], _: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::from(text_of(bound).to_lowercase()))
}

fn string_trim(_: &mut Interpreter, bound: &[Value], _: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::string(text_of(bound).trim()))
}

fn string_includes(_: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Bool(text_of(bound).contains(&arg(args, 0).display())))
}

fn string_starts_with(_: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Bool(text_of(bound).starts_with(&arg(args, 0).display())))
}

fn string_ends_with(_: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Bool(text_of(bound).ends_with(&arg(args, 0).display())))
}

fn string_replace(_: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let text = text_of(bound);
    Ok(Value::from(text.replacen(&arg(args, 0).display(), &arg(args, 1).display(), 1)))
}

fn string_split(_: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let text = text_of(bound);
    let parts: Vec<Value> = match arg(args, 0) {
        Value::Undefined => vec![Value::from(text)],
        separator => {
            let separator = separator.display();
            if separator.is_empty() {
                text.chars().map(|c| Value::from(c.to_string())).collect()
            } else {
                text.split(separator.as_str()).map(Value::string).collect()
            }
        }
    };
    Ok(Value::array(parts))
}

fn string_slice(_: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let chars: Vec<char> = receiver(bound).display().chars().collect();
    let (start, end) = slice_bounds(chars.len(), &arg(args, 0), &arg(args, 1));
    Ok(Value::from(chars[start..end].iter().collect::<String>()))
}

fn string_pad_start(interp: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let text = receiver(bound).display();
    let width = interp.checked_length(arg(args, 0).to_number().max(0.0).trunc())?;
    let fill = match arg(args, 1) {
        Value::Undefined => " ".to_string(),
        other => other.display(),
    };
    let len = text.chars().count();
    if len >= width || fill.is_empty() {
        return Ok(Value::from(text));
    }
    let padding: String = fill.chars().cycle().take(width - len).collect();
    Ok(Value::from(format!("{}{}", padding, text)))
}

// ---- number methods ----

pub(crate) fn number_method(key: &str) -> Option<(&'static str, NativeFn)> {
    match key {
        "toFixed" => Some(("toFixed", number_to_fixed)),
        "toString" => Some(("toString", number_to_string)),
        _ => None,
    }
}

fn number_to_string(_: &mut Interpreter, bound: &[Value], _: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::from(format_number(receiver(bound).to_number())))
}

fn number_to_fixed(_: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let n = receiver(bound).to_number();
    let digits = arg(args, 0).to_number();
    let digits = if digits.is_nan() { 0 } else { digits.clamp(0.0, 20.0) as usize };
    Ok(Value::from(format!("{:.*}", digits, n)))
}
