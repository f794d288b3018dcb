#[cfg(test)]
mod navigation_tests {
    use crate::test_support::{fire, interpreter_with, register, render};
    use crate::{HostServices, Interpreter, Location, NavigationRequest, UrlRewriter};
    use std::collections::BTreeMap;
    use std::rc::Rc;

    struct Prefix(&'static str);

    impl UrlRewriter for Prefix {
        fn external_href(&self, internal: &str) -> String {
            format!("{}{}", self.0, internal)
        }
    }

    fn mounted(at: &str, source: &str) -> Interpreter {
        let mut interp = interpreter_with(HostServices {
            urls: Rc::new(Prefix("/apps/crm")),
            ..HostServices::default()
        });
        register(&mut interp, &[("pages/index.tsx", source)]);
        interp.set_location(Location::parse(at), BTreeMap::new());
        interp
    }

    #[test]
    fn test_links_are_rewritten_onto_the_mount_prefix() {
        let mut interp = mounted(
            "/clients/7",
            r#"
            import { Link } from "@platform";
            export default () => <nav><Link to="/settings" className="x">Settings</Link><Link to="contacts">Contacts</Link></nav>;
            "#,
        );
        let node = render(&mut interp, "pages/index");
        let links = node.children();
        assert_eq!(links[0].attribute("href"), Some("/apps/crm/settings"));
        assert_eq!(links[0].attribute("class"), Some("x"));
        assert_eq!(links[1].attribute("href"), Some("/apps/crm/clients/7/contacts"));
        assert_eq!(links[0].attribute("to"), None);

        fire(&mut interp, &links[1], "click");
        assert_eq!(
            interp.take_navigation(),
            Some(NavigationRequest::Internal {
                to: "/clients/7/contacts".into(),
                replace: false
            })
        );
    }

    #[test]
    fn test_nav_link_marks_the_active_route() {
        let mut interp = mounted(
            "/clients/7",
            r#"
            import { NavLink } from "@platform";
            export default () => (
                <nav>
                    <NavLink to="/clients">Clients</NavLink>
                    <NavLink to="/clients" end>Exact</NavLink>
                    <NavLink to="/settings" className={({ isActive }) => isActive ? "on" : "off"}>Settings</NavLink>
                </nav>
            );
            "#,
        );
        let node = render(&mut interp, "pages/index");
        let links = node.children();
        assert_eq!(links[0].attribute("class"), Some("active"));
        assert_eq!(links[0].attribute("aria-current"), Some("page"));
        assert_eq!(links[1].attribute("class"), None);
        assert_eq!(links[2].attribute("class"), Some("off"));
    }

    #[test]
    fn test_imperative_navigation() {
        let mut interp = mounted(
            "/clients",
            r#"
            import { useNavigate, navigate } from "@platform";
            export default function Page() {
                const go = useNavigate();
                return (
                    <div>
                        <button onClick={() => go("/clients/9", { replace: true })}>open</button>
                        <input onChange={() => navigate(-1)} />
                    </div>
                );
            }
            "#,
        );
        let node = render(&mut interp, "pages/index");
        fire(&mut interp, node.find_tag("button").unwrap(), "click");
        assert_eq!(
            interp.take_navigation(),
            Some(NavigationRequest::Internal {
                to: "/clients/9".into(),
                replace: true
            })
        );
        fire(&mut interp, node.find_tag("input").unwrap(), "change");
        assert_eq!(interp.take_navigation(), Some(NavigationRequest::Back));
        assert_eq!(interp.take_navigation(), None);
    }

    #[test]
    fn test_navigate_component_requests_navigation() {
        let mut interp = mounted(
            "/",
            r#"
            import { Navigate } from "@platform";
            export default () => <Navigate to="/clients" replace />;
            "#,
        );
        let node = render(&mut interp, "pages/index");
        assert_eq!(node, crate::VNode::Fragment { children: vec![] });
        assert_eq!(
            interp.take_navigation(),
            Some(NavigationRequest::Internal {
                to: "/clients".into(),
                replace: true
            })
        );
    }

    #[test]
    fn test_route_data_accessors() {
        let mut interp = mounted(
            "/",
            r#"
            import { useParams, useSearchParams, useLocation } from "@platform";
            export default function Client() {
                const { id } = useParams();
                const [query, setQuery] = useSearchParams();
                const location = useLocation();
                return (
                    <div>
                        <p>{id}|{query.tab}|{location.pathname}|{location.search}</p>
                        <button onClick={() => setQuery(q => ({ ...q, tab: "files" }))}>files</button>
                    </div>
                );
            }
            "#,
        );
        let params = BTreeMap::from([("id".to_string(), "7".to_string())]);
        interp.set_location(Location::parse("/clients/7?tab=notes"), params);
        let node = render(&mut interp, "pages/index");
        assert_eq!(node.find_tag("p").unwrap().text_content(), "7|notes|/clients/7|?tab=notes");

        fire(&mut interp, node.find_tag("button").unwrap(), "click");
        assert_eq!(
            interp.take_navigation(),
            Some(NavigationRequest::Internal {
                to: "/clients/7?tab=files".into(),
                replace: false
            })
        );
    }

    #[test]
    fn test_router_primitives_are_replaced() {
        let interp = mounted("/", "export default () => null;");
        let overrides = interp.scope().overrides();
        let names: Vec<_> = overrides.iter().map(|o| o.name).collect();
        assert_eq!(names, crate::NAVIGATION_OVERRIDES);
    }
}
