#[cfg(test)]
mod markup_tests {
    use crate::ast::*;
    use crate::compile;
    use crate::parser::Parser;

    fn parse_markup(source: &str) -> MarkupElement {
        let mut program = Parser::new(source).parse_program().expect("parse");
        match program.body.remove(0) {
            Stmt::Expr(Expr::Markup(element)) => *element,
            other => panic!("expected markup, got {:?}", other),
        }
    }

    /// The value of the first `const` in a compiled file
    fn lowered_init(source: &str) -> Expr {
        let unit = compile(source).expect("compile");
        for stmt in unit.body() {
            if let Stmt::Var(decl) = stmt {
                if let Some(init) = &decl.declarators[0].init {
                    return init.clone();
                }
            }
        }
        panic!("no declaration in {:?}", unit.body());
    }

    #[test]
    fn test_intrinsic_element_with_attributes() {
        let element = parse_markup(r#"<div className="card" data-id={id} hidden />"#);
        assert_eq!(element.name, ElementName::Intrinsic("div".to_string()));
        assert_eq!(element.attributes.len(), 3);
        assert_eq!(
            element.attributes[0],
            Attribute::Named {
                name: "className".to_string(),
                value: Some(Expr::String("card".to_string())),
            }
        );
        assert_eq!(
            element.attributes[2],
            Attribute::Named {
                name: "hidden".to_string(),
                value: None,
            }
        );
        assert!(element.children.is_empty());
    }

    #[test]
    fn test_children_text_and_expressions() {
        let element = parse_markup(
            r#"<Card title="Clients">
                Total: {count} clients
                {/* comment */}
                <Badge>{status}</Badge>
            </Card>"#,
        );
        assert_eq!(element.name, ElementName::Component(Expr::Ident("Card".to_string())));
        assert_eq!(element.children.len(), 4);
        assert_eq!(element.children[0], MarkupChild::Text("Total: ".to_string()));
        assert_eq!(element.children[1], MarkupChild::Expr(Expr::Ident("count".to_string())));
        assert_eq!(element.children[2], MarkupChild::Text(" clients".to_string()));
        assert!(matches!(element.children[3], MarkupChild::Expr(Expr::Markup(_))));
    }

    #[test]
    fn test_fragment_and_spread() {
        let element = parse_markup("<><Input {...props} />{...rows}</>");
        assert_eq!(element.name, ElementName::Fragment);
        assert_eq!(element.children.len(), 2);
        assert!(matches!(element.children[1], MarkupChild::Spread(_)));
    }

    #[test]
    fn test_markup_inside_expressions() {
        let program = Parser::new(
            r#"
            const list = items.map(item => <li key={item.id}>{item.name}</li>);
            const maybe = ready ? <span>yes</span> : null;
            const guarded = count > 0 && <b>{count}</b>;
            "#,
        )
        .parse_program();
        assert!(program.is_ok(), "Parse error: {:?}", program.err());
    }

    #[test]
    fn test_mismatched_closing_tag() {
        let err = compile("const x = <div><span></div></span>").unwrap_err();
        assert!(err.message.contains("Expected closing tag </span>"), "{}", err.message);
    }

    #[test]
    fn test_unterminated_element() {
        assert!(compile("const x = <div>hello").is_err());
    }

    #[test]
    fn test_lowered_to_create_element() {
        let init = lowered_init(r#"const x = <Button variant="primary" onClick={save}>Save</Button>;"#);
        match init {
            Expr::Call { callee, args, .. } => {
                assert_eq!(*callee, Expr::Intrinsic(Intrinsic::CreateElement));
                assert_eq!(args.len(), 3);
                assert_eq!(args[0], Argument::Expr(Expr::Ident("Button".to_string())));
                assert!(matches!(&args[1], Argument::Expr(Expr::Object(props)) if props.len() == 2));
                assert_eq!(args[2], Argument::Expr(Expr::String("Save".to_string())));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_nested_markup_is_fully_lowered() {
        let init = lowered_init("const x = <ul>{items.map(i => <li>{i}</li>)}</ul>;");
        let printed = format!("{:?}", init);
        assert!(!printed.contains("Markup"));
        assert_eq!(printed.matches("CreateElement").count(), 2);
    }

    #[test]
    fn test_fragment_and_empty_props_lowering() {
        let init = lowered_init("const x = <><br /></>;");
        match init {
            Expr::Call { args, .. } => {
                assert_eq!(args[0], Argument::Expr(Expr::Intrinsic(Intrinsic::Fragment)));
                assert_eq!(args[1], Argument::Expr(Expr::Null));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_member_component_names() {
        let element = parse_markup("<Layout.Sidebar open />");
        match element.name {
            ElementName::Component(Expr::Member { property, .. }) => {
                assert_eq!(property, MemberProp::Named("Sidebar".to_string()))
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
