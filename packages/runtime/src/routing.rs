//! Navigation primitives.
//!
//! The router layer provides plain primitives: links carry the target as
//! written and clicking them asks the browser to load that URL. The
//! navigation layer replaces them with versions that resolve targets
//! against the current location, rewrite hrefs onto the instance's mount
//! prefix and navigate inside the running application.

use crate::elements::{arg, intrinsic, prop, props_without};
use crate::error::RuntimeResult;
use crate::interpreter::Interpreter;
use crate::nav::{Location, NavigationRequest};
use crate::value::{Object, Value};

const LINK_PROPS: &[&str] = &["to", "replace", "end"];

fn replace_option(options: &Value) -> bool {
    prop(options, "replace").truthy()
}

// ---- router layer ----

fn base_navigate(interp: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let request = match arg(args, 0) {
        Value::Number(n) if n < 0.0 => NavigationRequest::Back,
        to => NavigationRequest::External {
            url: to.display(),
            replace: replace_option(&arg(args, 1)),
        },
    };
    interp.host.request_navigation(request);
    Ok(Value::Undefined)
}

fn base_use_navigate(_: &mut Interpreter, _: &[Value], _: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::native("navigate", base_navigate))
}

fn base_link(interp: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let props = arg(args, 0);
    let to = prop(&props, "to").display();
    Ok(anchor(interp, &props, &to, &to, false, None))
}

fn base_nav_link(interp: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    base_link(interp, bound, args)
}

fn base_redirect(interp: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let props = arg(args, 0);
    interp.host.request_navigation(NavigationRequest::External {
        url: prop(&props, "to").display(),
        replace: prop(&props, "replace").truthy(),
    });
    Ok(Value::Null)
}

// ---- navigation layer ----

/// `navigate(to, { replace })`; a negative number goes back
pub(crate) fn navigate(interp: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let request = match arg(args, 0) {
        Value::Number(n) if n < 0.0 => NavigationRequest::Back,
        to => NavigationRequest::Internal {
            to: interp.host.location.resolve(&to.display()).href(),
            replace: replace_option(&arg(args, 1)),
        },
    };
    interp.host.request_navigation(request);
    Ok(Value::Undefined)
}

fn use_navigate(_: &mut Interpreter, _: &[Value], _: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::native("navigate", navigate))
}

fn link(interp: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let props = arg(args, 0);
    let target = interp.host.location.resolve(&prop(&props, "to").display());
    let href = interp.host.urls.external_href(&target.href());
    Ok(anchor(interp, &props, &target.href(), &href, true, None))
}

fn nav_link(interp: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let props = arg(args, 0);
    let target = interp.host.location.resolve(&prop(&props, "to").display());
    let href = interp.host.urls.external_href(&target.href());
    let active = is_active(&interp.host.location, &target, prop(&props, "end").truthy());
    Ok(anchor(interp, &props, &target.href(), &href, true, Some(active)))
}

fn redirect(interp: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let props = arg(args, 0);
    let to = interp.host.location.resolve(&prop(&props, "to").display()).href();
    interp.host.request_navigation(NavigationRequest::Internal {
        to,
        replace: prop(&props, "replace").truthy(),
    });
    Ok(Value::Null)
}

fn is_active(current: &Location, target: &Location, end: bool) -> bool {
    if current.path == target.path {
        return true;
    }
    !end && target.path != "/" && current.path.starts_with(&format!("{}/", target.path))
}

/// `<a>` element for a link. `to` is what clicking navigates to, `href`
/// what the browser shows.
fn anchor(
    interp: &mut Interpreter,
    props: &Value,
    to: &str,
    href: &str,
    internal: bool,
    active: Option<bool>,
) -> Value {
    let mut attributes = props_without(props, LINK_PROPS);
    attributes.set("href", Value::string(href));

    if let Some(active) = active {
        let class = match prop(props, "className") {
            class if class.is_callable() => {
                let state = Value::object(Object::from_iter([("isActive", Value::Bool(active))]));
                interp.call(&class, vec![state]).map(|v| v.display()).unwrap_or_default()
            }
            Value::String(class) if active => format!("{} active", class),
            Value::String(class) => class.to_string(),
            _ if active => "active".to_string(),
            _ => String::new(),
        };
        if class.is_empty() {
            attributes.remove("className");
        } else {
            attributes.set("className", Value::from(class));
        }
        if active {
            attributes.set("aria-current", Value::string("page"));
        }
    }

    let on_click = Value::bound_native(
        "onClick",
        link_click,
        vec![
            Value::string(to),
            Value::Bool(prop(props, "replace").truthy()),
            Value::Bool(internal),
            prop(props, "onClick"),
        ],
    );
    attributes.set("onClick", on_click);
    intrinsic("a", attributes)
}

fn link_click(interp: &mut Interpreter, bound: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let user_handler = arg(bound, 3);
    if user_handler.is_callable() {
        interp.call(&user_handler, args.to_vec())?;
    }
    let to = arg(bound, 0).display();
    let replace = arg(bound, 1).truthy();
    let request = if arg(bound, 2).truthy() {
        NavigationRequest::Internal { to, replace }
    } else {
        NavigationRequest::External { url: to, replace }
    };
    interp.host.request_navigation(request);
    Ok(Value::Undefined)
}

// ---- route data ----

fn outlet(interp: &mut Interpreter, _: &[Value], _: &[Value]) -> RuntimeResult<Value> {
    Ok(interp.host.outlets.last().cloned().flatten().unwrap_or(Value::Null))
}

fn use_params(interp: &mut Interpreter, _: &[Value], _: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::object(
        interp
            .host
            .params
            .iter()
            .map(|(key, value)| (key.clone(), Value::string(value)))
            .collect(),
    ))
}

fn query_object(location: &Location) -> Value {
    Value::object(
        location
            .query
            .iter()
            .map(|(key, value)| (key.clone(), Value::string(value)))
            .collect(),
    )
}

/// `[params, setParams]`; params is a plain object of query values
fn use_search_params(interp: &mut Interpreter, _: &[Value], _: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::array(vec![
        query_object(&interp.host.location),
        Value::native("setSearchParams", set_search_params),
    ]))
}

fn set_search_params(interp: &mut Interpreter, _: &[Value], args: &[Value]) -> RuntimeResult<Value> {
    let next = match arg(args, 0) {
        updater if updater.is_callable() => {
            let current = query_object(&interp.host.location);
            interp.call(&updater, vec![current])?
        }
        value => value,
    };
    let mut location = interp.host.location.clone();
    location.query = match &next {
        Value::Object(object) => object
            .borrow()
            .iter()
            .filter(|(_, value)| !value.is_nullish())
            .map(|(key, value)| (key.to_string(), value.display()))
            .collect(),
        _ => Default::default(),
    };
    interp.host.request_navigation(NavigationRequest::Internal {
        to: location.href(),
        replace: replace_option(&arg(args, 1)),
    });
    Ok(Value::Undefined)
}

fn use_location(interp: &mut Interpreter, _: &[Value], _: &[Value]) -> RuntimeResult<Value> {
    let location = &interp.host.location;
    let hash = if location.hash.is_empty() {
        String::new()
    } else {
        format!("#{}", location.hash)
    };
    Ok(Value::object(Object::from_iter([
        ("pathname", Value::string(&location.path)),
        ("search", Value::from(location.search())),
        ("hash", Value::from(hash)),
        ("href", Value::from(location.href())),
    ])))
}

pub(crate) fn router_layer() -> Vec<(&'static str, Value)> {
    vec![
        ("Link", Value::native("Link", base_link)),
        ("NavLink", Value::native("NavLink", base_nav_link)),
        ("Navigate", Value::native("Navigate", base_redirect)),
        ("navigate", Value::native("navigate", base_navigate)),
        ("useNavigate", Value::native("useNavigate", base_use_navigate)),
        ("Outlet", Value::native("Outlet", outlet)),
        ("useParams", Value::native("useParams", use_params)),
        ("useSearchParams", Value::native("useSearchParams", use_search_params)),
        ("useLocation", Value::native("useLocation", use_location)),
    ]
}

pub(crate) fn navigation_layer() -> Vec<(&'static str, Value)> {
    vec![
        ("Link", Value::native("Link", link)),
        ("NavLink", Value::native("NavLink", nav_link)),
        ("Navigate", Value::native("Navigate", redirect)),
        ("navigate", Value::native("navigate", navigate)),
        ("useNavigate", Value::native("useNavigate", use_navigate)),
    ]
}
