#[cfg(test)]
mod render_tests {
    use crate::test_support::{render, with_files};
    use crate::VNode;

    fn page(source: &str) -> VNode {
        let mut interp = with_files(&[("pages/index.tsx", source)]);
        render(&mut interp, "pages/index")
    }

    #[test]
    fn test_intrinsic_attributes() {
        let node = page(
            r#"
            export default function Form() {
                return <label htmlFor="name" className="field" data-ready={true} hidden={false} style={{ marginTop: 8 }}>Name</label>;
            }
            "#,
        );
        assert_eq!(
            node.to_html(),
            r#"<label class="field" data-ready="true" for="name" style="margin-top: 8px">Name</label>"#
        );
    }

    #[test]
    fn test_event_handlers_get_ids() {
        let node = page(r#"export default () => <button onClick={() => 1} onMouseEnter={() => 2}>Go</button>;"#);
        assert_eq!(node.handler("click"), Some("h0"));
        assert_eq!(node.handler("mouseenter"), Some("h1"));
        assert_eq!(node.attribute("onClick"), None);
    }

    #[test]
    fn test_lists_fragments_and_conditionals() {
        let node = page(
            r#"
            const items = ["a", "b", "c"];
            export default function List() {
                const empty = false;
                return (
                    <>
                        <ul>{items.map(item => <li key={item}>{item}</li>)}</ul>
                        {empty && <p>none</p>}
                        {items.length > 2 ? <p>many</p> : null}
                    </>
                );
            }
            "#,
        );
        assert_eq!(node.to_html(), "<ul><li>a</li><li>b</li><li>c</li></ul><p>many</p>");
    }

    #[test]
    fn test_ui_catalogue() {
        let node = page(
            r#"
            import { Button, Card, CardTitle, Badge, cn } from "@platform";
            export default function Panel() {
                return (
                    <Card className={cn("wide", { muted: false, bold: true })}>
                        <CardTitle>Clients</CardTitle>
                        <Badge variant="success">3</Badge>
                        <Button variant="outline" disabled>Save</Button>
                    </Card>
                );
            }
            "#,
        );
        assert_eq!(
            node.to_html(),
            concat!(
                r#"<div class="pw-card wide bold">"#,
                r#"<h3 class="pw-card-title">Clients</h3>"#,
                r#"<span class="pw-badge pw-badge--success">3</span>"#,
                r#"<button class="pw-button pw-button--outline" disabled type="button">Save</button>"#,
                "</div>"
            )
        );
    }

    #[test]
    fn test_failing_component_is_contained() {
        let node = page(
            r#"
            function Broken() {
                const data = null;
                return <p>{data.name}</p>;
            }
            export default function Page() {
                return <main><Broken /><p>still here</p></main>;
            }
            "#,
        );
        let errors = node.errors();
        assert_eq!(errors.len(), 1);
        match errors[0] {
            VNode::Error { component, message } => {
                assert_eq!(component.as_deref(), Some("Broken"));
                assert!(message.contains("reading 'name'"), "{}", message);
            }
            _ => unreachable!(),
        }
        assert!(node.text_content().ends_with("still here"));
    }

    #[test]
    fn test_runaway_component_is_contained() {
        let node = page(
            r#"
            function Loop({ n }) { return <Loop n={n + 1} /> }
            function Deep(n) { return Deep(n + 1) }
            function Recurse() { return <p>{Deep(0)}</p> }
            export default function Page() { return <div><Recurse /><Loop n={0} /><span>ok</span></div> }
            "#,
        );
        assert_eq!(node.errors().len(), 2);
        assert_eq!(node.find_tag("span").map(VNode::text_content), Some("ok".to_string()));
    }

    #[test]
    fn test_context_providers() {
        let node = page(
            r#"
            import { createContext, useContext } from "@platform";
            const Theme = createContext("light");
            function Label() { return <span>{useContext(Theme)}</span> }
            export default function Page() {
                return (
                    <div>
                        <Label />
                        <Theme.Provider value="dark"><Label /></Theme.Provider>
                    </div>
                );
            }
            "#,
        );
        assert_eq!(node.to_html(), "<div><span>light</span><span>dark</span></div>");
    }

    #[test]
    fn test_props_and_children() {
        let node = page(
            r#"
            function Box({ title, children, ...rest }) {
                return <section {...rest}><h1>{title}</h1>{children}</section>;
            }
            export default function Page() {
                return <Box title="T" id="box"><em>a</em><em>b</em></Box>;
            }
            "#,
        );
        assert_eq!(node.to_html(), r#"<section id="box"><h1>T</h1><em>a</em><em>b</em></section>"#);
    }

    #[test]
    fn test_invalid_child_is_reported() {
        let node = page(r#"export default () => <div>{{ a: 1 }}</div>;"#);
        assert_eq!(node.errors().len(), 1);
    }
}
