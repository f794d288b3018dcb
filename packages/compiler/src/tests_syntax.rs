#[cfg(test)]
mod syntax_tests {
    use crate::ast::*;
    use crate::parser::Parser;
    use crate::{compile, CompileErrorKind};

    fn parse(source: &str) -> Program {
        let result = Parser::new(source).parse_program();
        assert!(result.is_ok(), "Parse error: {:?}", result.err());
        result.unwrap()
    }

    fn parse_expr(source: &str) -> Expr {
        let mut program = parse(source);
        match program.body.remove(0) {
            Stmt::Expr(expr) => expr,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence() {
        let expr = parse_expr("1 + 2 * 3");
        match expr {
            Expr::Binary {
                op: BinaryOp::Add,
                right,
                ..
            } => assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. })),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_logical_and_conditional() {
        let expr = parse_expr("a && b ? c ?? d : e");
        match expr {
            Expr::Conditional { test, consequent, .. } => {
                assert!(matches!(*test, Expr::Logical { op: LogicalOp::And, .. }));
                assert!(matches!(*consequent, Expr::Logical { op: LogicalOp::Nullish, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_arrow_functions() {
        let program = parse(
            r#"
            const a = x => x + 1;
            const b = (x, y = 2) => { return x * y };
            const c = ({ title, children }) => title;
            const d = async () => null;
            "#,
        );
        assert_eq!(program.body.len(), 4);
        for stmt in &program.body {
            match stmt {
                Stmt::Var(decl) => {
                    assert!(matches!(decl.declarators[0].init, Some(Expr::Function(ref f)) if f.is_arrow))
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_parenthesized_expression_is_not_an_arrow() {
        let expr = parse_expr("(a + b) * c");
        assert!(matches!(expr, Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn test_type_annotations_are_stripped() {
        let typed = parse(
            r#"
            interface Props { title: string; count?: number }
            type Status = "idle" | "running";
            function Card({ title, count = 0 }: Props): JSX.Element {
                const label: string = title as string;
                const [items, setItems] = useState<string[]>([]);
                const total = (count as number)!;
                return label;
            }
            "#,
        );
        let plain = parse(
            r#"
            function Card({ title, count = 0 }) {
                const label = title;
                const [items, setItems] = useState([]);
                const total = count;
                return label;
            }
            "#,
        );
        let function = |program: &Program| match program.body.as_slice() {
            [Stmt::Function(f)] => (f.params.clone(), f.body.clone()),
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(function(&typed), function(&plain));
    }

    #[test]
    fn test_generic_call_vs_comparison() {
        let expr = parse_expr("a < b && c > d");
        assert!(matches!(expr, Expr::Logical { op: LogicalOp::And, .. }));

        let expr = parse_expr("useRef<HTMLDivElement | null>(null)");
        assert!(matches!(expr, Expr::Call { .. }));
    }

    #[test]
    fn test_optional_chaining_wraps_chain() {
        let expr = parse_expr("user?.profile.name");
        match expr {
            Expr::OptionalChain(inner) => match *inner {
                Expr::Member { object, optional: false, .. } => {
                    assert!(matches!(*object, Expr::Member { optional: true, .. }))
                }
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_template_literal_parts() {
        let expr = parse_expr("`Hello ${user.name}, you have ${count} items`");
        match expr {
            Expr::Template(parts) => {
                assert_eq!(parts.len(), 5);
                assert_eq!(parts[0], TemplatePart::Str("Hello ".to_string()));
                assert_eq!(parts[4], TemplatePart::Str(" items".to_string()));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_object_literal_forms() {
        let expr = parse_expr("({ a, b: 1, ['c']: 2, ...rest, default: 3, 'x-y': 4, run() { return 1 } })");
        match expr {
            Expr::Object(props) => {
                assert_eq!(props.len(), 7);
                assert_eq!(props[0], Property::Shorthand("a".to_string()));
                assert!(matches!(props[3], Property::Spread(_)));
                assert!(matches!(
                    &props[6],
                    Property::KeyValue { value: Expr::Function(_), .. }
                ));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_statements() {
        let program = parse(
            r#"
            for (const item of items) { if (!item) continue; total += item.price }
            for (const key in record) { keys.push(key) }
            while (i < 10) { i += 1; if (i > 5) break }
            try { risky() } catch (err) { console.error(err) } finally { done() }
            throw new Error("boom")
            "#,
        );
        assert!(matches!(program.body[0], Stmt::Loop { each: LoopEach::Of, .. }));
        assert!(matches!(program.body[1], Stmt::Loop { each: LoopEach::In, .. }));
        assert!(matches!(program.body[2], Stmt::While { .. }));
        assert!(matches!(program.body[3], Stmt::Try { .. }));
        assert!(matches!(program.body[4], Stmt::Throw(Expr::New { .. })));
    }

    #[test]
    fn test_return_followed_by_newline_returns_undefined() {
        let program = parse("function f() {\n return\n 42\n}");
        match &program.body[0] {
            Stmt::Function(f) => match &f.body {
                FunctionBody::Block(body) => {
                    assert_eq!(body[0], Stmt::Return(None));
                    assert_eq!(body[1], Stmt::Expr(Expr::Number(42.0)));
                }
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(parse_expr(r#""a\nb\"cA""#), Expr::String("a\nb\"cA".to_string()));
        assert_eq!(parse_expr(r"'it\'s'"), Expr::String("it's".to_string()));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse_expr("1_000"), Expr::Number(1000.0));
        assert_eq!(parse_expr("0xff"), Expr::Number(255.0));
        assert_eq!(parse_expr("1.5e3"), Expr::Number(1500.0));
    }

    #[test]
    fn test_syntax_error_location() {
        let err = compile("const a = 1;\nconst b = ;\n").unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::Syntax);
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 11);
        assert!(!err.message.is_empty());
    }

    #[test]
    fn test_missing_separator_is_an_error() {
        assert!(compile("const a = 1 2").is_err());
    }

    #[test]
    fn test_unterminated_string() {
        let err = compile("const a = \"oops").unwrap_err();
        assert!(err.message.contains("Unterminated string"));
    }

    #[test]
    fn test_unsupported_constructs() {
        for source in [
            "for (let i = 0; i < 3; i++) {}",
            "class A {}",
            "export * from './x'",
            "function* gen() {}",
        ] {
            let err = compile(source).unwrap_err();
            assert_eq!(err.kind, CompileErrorKind::UnsupportedSyntax, "{}", source);
        }
    }

    #[test]
    fn test_invalid_assignment_target() {
        assert!(compile("a + b = c").is_err());
    }
}
