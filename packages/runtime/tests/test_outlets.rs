use pagewright_compiler::compile;
use pagewright_runtime::{
    component_element, component_ref, route_element, HostServices, Interpreter, Limits, Object, PlatformScope,
};
use std::sync::Arc;

const PROVIDERS: &str = r#"
import { createContext } from "@platform";
export const Brand = createContext("none");
export default function Providers({ children }) {
    return <Brand.Provider value="Acme">{children}</Brand.Provider>;
}
"#;

const LAYOUT: &str = r#"
import { Outlet, useContext } from "@platform";
import { Brand } from "./_providers";
export default function Layout() {
    return <main><header>{useContext(Brand)}</header><Outlet /></main>;
}
"#;

const SETTINGS_LAYOUT: &str = r#"
import { Outlet } from "@platform";
export default function Settings() {
    return <section className="settings"><Outlet /></section>;
}
"#;

const BILLING: &str = r#"
export default function Billing() {
    return <p>Billing</p>;
}
"#;

fn app() -> Interpreter {
    let mut interp = Interpreter::new(
        PlatformScope::standard().unwrap(),
        HostServices::default(),
        Limits::default(),
    );
    for (path, source) in [
        ("_providers.tsx", PROVIDERS),
        ("_layout.tsx", LAYOUT),
        ("pages/settings/_layout.tsx", SETTINGS_LAYOUT),
        ("pages/settings/billing.tsx", BILLING),
    ] {
        interp.modules_mut().insert(path, compile(source).map(Arc::new));
    }
    interp
}

#[test]
fn test_nested_outlets_and_providers() {
    let mut interp = app();
    let page = route_element(component_ref("pages/settings/billing"), None);
    let settings = route_element(component_ref("pages/settings/_layout"), Some(page));
    let root = route_element(component_ref("_layout"), Some(settings));
    let mut props = Object::new();
    props.set("children", root);
    let tree = component_element(component_ref("_providers"), props);

    let node = interp.render(&tree);
    assert_eq!(
        node.to_html(),
        r#"<main><header>Acme</header><section class="settings"><p>Billing</p></section></main>"#
    );
}

#[test]
fn test_outlet_without_child_renders_nothing() {
    let mut interp = app();
    let root = route_element(component_ref("pages/settings/_layout"), None);
    assert_eq!(interp.render(&root).to_html(), r#"<section class="settings"></section>"#);
}

#[test]
fn test_failing_page_keeps_layout() {
    let mut interp = app();
    interp.modules_mut().insert(
        "pages/settings/billing.tsx",
        compile("export default function Billing() { throw new Error(\"no invoices\") }").map(Arc::new),
    );
    let page = route_element(component_ref("pages/settings/billing"), None);
    let root = route_element(component_ref("pages/settings/_layout"), Some(page));
    let node = interp.render(&root);
    assert_eq!(node.tag(), Some("section"));
    assert_eq!(node.errors().len(), 1);
    assert!(node.text_content().contains("no invoices"));
}
