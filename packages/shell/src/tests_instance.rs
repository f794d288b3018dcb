#[cfg(test)]
mod instance_tests {
    use crate::{AppInstance, InstanceOptions, MountPrefix, MAX_HISTORY};
    use pagewright_compiler::CompileCache;
    use pagewright_runtime::VNode;
    use serde_json::Value as Json;
    use std::sync::Arc;

    const LAYOUT: &str = r#"
        import { Link, Outlet } from "@platform";
        export default function Layout() {
            return (
                <div>
                    <nav><Link to="/clients">Clients</Link></nav>
                    <main><Outlet /></main>
                </div>
            );
        }
    "#;

    const HOME: &str = r#"export default () => <h1>Home</h1>;"#;

    const CLIENTS: &str = r#"
        import { Link } from "@platform";
        export default function Clients() {
            return <ul><li><Link to="7">Ada</Link></li></ul>;
        }
    "#;

    const CLIENT: &str = r#"
        import { useParams } from "@platform";
        export default function Client() {
            const { id } = useParams();
            return <h2>Client {id}</h2>;
        }
    "#;

    fn files(extra: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut files: Vec<(String, String)> = [
            ("_layout.tsx", LAYOUT),
            ("pages/index.tsx", HOME),
            ("pages/clients.tsx", CLIENTS),
            ("pages/clients/[id].tsx", CLIENT),
        ]
        .iter()
        .chain(extra.iter())
        .map(|(path, source)| (path.to_string(), source.to_string()))
        .collect();
        files.sort();
        files
    }

    fn mount_at(prefix: &str, extra: &[(&str, &str)]) -> AppInstance {
        let options = InstanceOptions {
            prefix: MountPrefix::new(prefix),
            ..InstanceOptions::default()
        };
        AppInstance::mount("v1", &files(extra), Arc::new(CompileCache::new()), options).unwrap()
    }

    fn main(node: &VNode) -> &VNode {
        node.find_tag("main").unwrap()
    }

    fn click(app: &mut AppInstance, node: &VNode) -> VNode {
        let handler = node.handler("click").unwrap().to_string();
        app.dispatch(&handler, &Json::Null).unwrap()
    }

    #[test]
    fn test_links_navigate_inside_the_prefix() {
        let mut app = mount_at("/apps/crm", &[]);
        let node = app.open("/apps/crm").unwrap();
        assert_eq!(main(&node).text_content(), "Home");
        let nav_link = node.find_tag("nav").unwrap().find_tag("a").unwrap().clone();
        assert_eq!(nav_link.attribute("href"), Some("/apps/crm/clients"));

        let node = click(&mut app, &nav_link);
        assert_eq!(app.location().path, "/clients");
        let client_link = main(&node).find_tag("a").unwrap().clone();
        assert_eq!(client_link.attribute("href"), Some("/apps/crm/clients/7"));

        let node = click(&mut app, &client_link);
        assert_eq!(main(&node).text_content(), "Client 7");
        assert_eq!(app.url(), "/apps/crm/clients/7");

        let node = app.back();
        assert_eq!(app.location().path, "/clients");
        assert_eq!(main(&node).text_content(), "Ada");
    }

    #[test]
    fn test_urls_outside_the_prefix_are_rejected() {
        let mut app = mount_at("/apps/crm", &[]);
        let err = app.open("/apps/other/clients").err().unwrap();
        assert_eq!(err.code(), "outside_prefix");
        assert_eq!(app.location().path, "/");
    }

    #[test]
    fn test_unknown_route_renders_not_found_inside_the_layout() {
        let mut app = mount_at("/", &[]);
        let node = app.navigate("/nope");
        assert!(node.find_tag("nav").is_some());
        let missing = node.find(&|n| n.attribute("class") == Some("pw-not-found")).unwrap();
        assert_eq!(missing.text_content(), "Page not found: /nope");
    }

    #[test]
    fn test_compile_failure_is_contained_to_its_route() {
        let mut app = mount_at("/", &[("pages/broken.tsx", "export default function Broken( { return <p>;")]);
        let diagnostics = app.diagnostics();
        assert_eq!(diagnostics.keys().collect::<Vec<_>>(), vec!["pages/broken.tsx"]);

        let node = app.navigate("/broken");
        assert!(node.find_tag("nav").is_some());
        let errors = node.errors();
        assert_eq!(errors.len(), 1);
        match errors[0] {
            VNode::Error { message, .. } => assert!(message.contains("failed to compile"), "{}", message),
            other => panic!("unexpected node {:?}", other),
        }

        let node = app.navigate("/clients/3");
        assert!(node.errors().is_empty());
    }

    #[test]
    fn test_route_collision_is_reported() {
        let mut app = mount_at("/", &[("pages/clients/index.tsx", HOME)]);
        let err = app.routes().err().unwrap();
        assert_eq!(err.code(), "route_collision");

        let node = app.render();
        assert_eq!(node.errors().len(), 1);
        assert!(node.text_content().starts_with("Routes could not be built"));
    }

    #[test]
    fn test_missing_root_layout_is_optional() {
        let files: Vec<(String, String)> = vec![("pages/index.tsx".into(), HOME.into())];
        let mut app = AppInstance::mount("v1", &files, Arc::new(CompileCache::new()), InstanceOptions::default()).unwrap();
        assert_eq!(app.render().to_html(), "<h1>Home</h1>");
    }

    #[test]
    fn test_redirects_replace_the_history_entry() {
        let mut app = mount_at(
            "/",
            &[(
                "pages/old.tsx",
                r#"import { Navigate } from "@platform"; export default () => <Navigate to="/clients" replace />;"#,
            )],
        );
        app.render();
        let node = app.navigate("/old");
        assert_eq!(app.location().path, "/clients");
        assert_eq!(main(&node).text_content(), "Ada");

        app.back();
        assert_eq!(app.location().path, "/");
    }

    #[test]
    fn test_history_keeps_the_most_recent_entries() {
        let mut app = mount_at("/", &[]);
        app.render();
        for id in 0..MAX_HISTORY + 10 {
            app.navigate(&format!("/clients/{}", id));
        }
        for _ in 0..MAX_HISTORY * 2 {
            app.back();
        }
        assert_eq!(app.location().path, "/clients/10");
    }

    #[test]
    fn test_effects_settle_before_returning() {
        let mut app = mount_at(
            "/",
            &[(
                "pages/ready.tsx",
                r#"
                import { useState, useEffect } from "@platform";
                export default function Ready() {
                    const [ready, setReady] = useState(false);
                    useEffect(() => { setReady(true); }, []);
                    return <p>{ready ? "ready" : "waiting"}</p>;
                }
                "#,
            )],
        );
        let node = app.navigate("/ready");
        assert_eq!(main(&node).text_content(), "ready");
        assert_eq!(app.last_render(), Some(&node));
    }

    #[test]
    fn test_render_passes_are_bounded() {
        let files: Vec<(String, String)> = vec![(
            "pages/index.tsx".into(),
            r#"
            import { useState, useEffect } from "@platform";
            export default function Spin() {
                const [n, setN] = useState(0);
                useEffect(() => { setN(x => x + 1); });
                return <p>{n}</p>;
            }
            "#
            .into(),
        )];
        let options = InstanceOptions {
            render_passes: 3,
            ..InstanceOptions::default()
        };
        let mut app = AppInstance::mount("v1", &files, Arc::new(CompileCache::new()), options).unwrap();
        assert_eq!(app.render().text_content(), "2");
    }

    #[test]
    fn test_reload_replaces_files_and_state() {
        let counter = |label: &str| {
            format!(
                r#"
                import {{ useState }} from "@platform";
                export default function Counter() {{
                    const [count, setCount] = useState(0);
                    return <button onClick={{() => setCount(c => c + 1)}}>{}: {{count}}</button>;
                }}
                "#,
                label
            )
        };
        let v1 = vec![("pages/index.tsx".to_string(), counter("Count"))];
        let cache = Arc::new(CompileCache::new());
        let mut app = AppInstance::mount("v1", &v1, cache.clone(), InstanceOptions::default()).unwrap();
        let node = app.render();
        let node = click(&mut app, &node);
        assert_eq!(node.text_content(), "Count: 1");

        let v2 = vec![("pages/index.tsx".to_string(), counter("Total"))];
        let node = app.reload("v2", &v2);
        assert_eq!(node.text_content(), "Total: 0");
        assert_eq!(app.version_id(), "v2");
        assert!(cache.lookup("v2", "pages/index.tsx").is_some());
    }

    #[test]
    fn test_unknown_handler_is_an_error() {
        let mut app = mount_at("/", &[]);
        app.render();
        let err = app.dispatch("h99", &Json::Null).err().unwrap();
        assert_eq!(err.code(), "runtime_error");
    }
}
