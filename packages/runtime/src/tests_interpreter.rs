#[cfg(test)]
mod interpreter_tests {
    use crate::test_support::{export, render, run, with_files};
    use crate::{ResolveError, RuntimeError, ScopeError};

    fn text(source: &str) -> String {
        run(source).unwrap().display()
    }

    #[test]
    fn test_expressions_and_templates() {
        assert_eq!(text(r#"const result = `${1 + 2}-${"a".toUpperCase()}`;"#), "3-A");
        assert_eq!(text("const result = 7 % 4 + 2 * 3 - 1;"), "8");
        assert_eq!(text(r#"const result = "1" == 1 && "1" !== 1;"#), "true");
        assert_eq!(text("const result = typeof missing;"), "undefined");
        assert_eq!(text("const result = (0.1 + 0.2).toFixed(2);"), "0.30");
    }

    #[test]
    fn test_closures_and_destructuring() {
        let source = r#"
            function counter() {
                let n = 0;
                return () => { n += 1; return n; };
            }
            const next = counter();
            next();
            const { a, b: [c, ...rest] = [], d = 4 } = { a: 1, b: [2, 3, 5] };
            const result = [next(), a, c, rest.length, d].join(",");
        "#;
        assert_eq!(text(source), "2,1,2,2,4");
    }

    #[test]
    fn test_functions_are_hoisted() {
        let source = r#"
            const result = double(21);
            function double(x: number): number { return x * 2 }
        "#;
        assert_eq!(text(source), "42");
    }

    #[test]
    fn test_array_and_object_builtins() {
        let source = r#"
            const total = [3, 1, 2].sort((a, b) => a - b).map(x => x * 2).filter(x => x > 2).reduce((s, x) => s + x, 0);
            const keys = Object.keys({ b: 1, a: 2 }).join("");
            const merged = Object.assign({}, { x: 1 }, { y: 2 });
            const result = [total, keys, merged.x + merged.y, Array.isArray([]), ["a", "b"].includes("b")].join("|");
        "#;
        assert_eq!(text(source), "10|ba|3|true|true");
    }

    #[test]
    fn test_loops() {
        let source = r#"
            let out = [];
            for (const n of [1, 2, 3, 4, 5]) {
                if (n === 2) continue;
                if (n === 5) break;
                out.push(n);
            }
            let i = 0;
            while (i < 3) { i += 1 }
            const result = out.join("") + i;
        "#;
        assert_eq!(text(source), "1343");
    }

    #[test]
    fn test_try_catch_finally() {
        let source = r#"
            let log = [];
            try { null.x } catch (e) { log.push(e.name) } finally { log.push("done") }
            try { throw new Error("boom") } catch (e) { log.push(e.message) }
            const result = log.join(",");
        "#;
        assert_eq!(text(source), "TypeError,done,boom");
    }

    #[test]
    fn test_uncaught_throw() {
        let err = run(r#"throw new Error("nope")"#).unwrap_err();
        assert_eq!(err.to_string(), "Uncaught Error: nope");
    }

    #[test]
    fn test_optional_chaining_and_nullish() {
        let source = r#"
            const o = { a: null };
            const result = [o.a?.b, o.missing ?? "d", o.f?.()].map(String).join("|");
        "#;
        assert_eq!(text(source), "undefined|d|undefined");
    }

    #[test]
    fn test_json_round_trip() {
        let source = r#"const result = JSON.stringify(JSON.parse('{"b":1,"a":[true,null]}'));"#;
        assert_eq!(text(source), r#"{"a":[true,null],"b":1}"#);
    }

    #[test]
    fn test_runaway_recursion_is_an_error() {
        let err = run("function f(n) { return f(n + 1) } const result = f(0);").unwrap_err();
        assert!(matches!(err, RuntimeError::DepthExceeded(_)));

        // user code cannot swallow it
        let err = run("function f(n) { return f(n + 1) } try { f(0) } catch (e) {} const result = 1;").unwrap_err();
        assert!(matches!(err, RuntimeError::DepthExceeded(_)));
    }

    #[test]
    fn test_array_growth_is_bounded() {
        let err = run(r#"const a = []; a["18446744073709551615"] = 1; const result = a.length;"#).unwrap_err();
        assert!(matches!(err, RuntimeError::Type(ref message) if message == "Invalid array length"));
        assert!(run("const a = []; a[1e10] = 1;").is_err());
        assert!(run("const a = []; a.length = 1e10;").is_err());
        assert!(run("const a = Array.from({ length: 1e10 });").is_err());
        assert!(run(r#"const s = "x".padStart(1e10);"#).is_err());

        let source = r#"
            const a = [];
            a[3] = "d";
            let caught = "";
            try { a.length = -1 } catch (e) { caught = e.message }
            const result = [a.length, Array.from({ length: 2 }).length, "7".padStart(3, "0"), caught].join("|");
        "#;
        assert_eq!(text(source), "4|2|007|Invalid array length");
    }

    #[test]
    fn test_infinite_loop_is_an_error() {
        let err = run("let i = 0; while (true) { i += 1 }").unwrap_err();
        assert!(matches!(err, RuntimeError::LoopLimit(_)));
    }

    #[test]
    fn test_const_assignment() {
        let err = run("const x = 1; x = 2;").unwrap_err();
        assert!(matches!(err, RuntimeError::ConstAssign(name) if name == "x"));
    }

    #[test]
    fn test_unknown_reference() {
        let err = run("const result = nothing + 1;").unwrap_err();
        assert!(matches!(err, RuntimeError::Reference(name) if name == "nothing"));
    }

    // ---- cross-file resolution ----

    const PAGE: &str = r#"
        import Card, { Title } from "@/components/Card";
        export default function Home() {
            return <Card><Title text="Clients" /></Card>;
        }
    "#;

    const CARD: &str = r#"
        export function Title({ text }) { return <h2>{text}</h2> }
        export default function Card({ children }) {
            return <section className="card">{children}</section>;
        }
    "#;

    #[test]
    fn test_resolution_does_not_depend_on_registration_order() {
        let mut forward = with_files(&[("pages/index.tsx", PAGE), ("components/Card.tsx", CARD)]);
        let mut backward = with_files(&[("components/Card.tsx", CARD), ("pages/index.tsx", PAGE)]);

        let a = render(&mut forward, "pages/index");
        let b = render(&mut backward, "pages/index");
        assert_eq!(a, b);
        assert_eq!(a.to_html(), r#"<section class="card"><h2>Clients</h2></section>"#);
    }

    #[test]
    fn test_sibling_registered_after_first_failure() {
        let mut interp = with_files(&[("pages/index.tsx", PAGE)]);
        let node = render(&mut interp, "pages/index");
        assert_eq!(node.errors().len(), 1);
        assert!(node.text_content().contains("components/Card"));

        crate::test_support::register(&mut interp, &[("components/Card.tsx", CARD)]);
        let node = render(&mut interp, "pages/index");
        assert!(node.errors().is_empty());
        assert_eq!(node.text_content(), "Clients");
    }

    #[test]
    fn test_forward_references_between_modules() {
        let mut interp = with_files(&[
            ("modules/a.ts", r#"import { b } from "./b"; export function a() { return "a" + b(); }"#),
            ("modules/b.ts", r#"import { a } from "./a"; export function b() { return "b"; } export const viaA = () => a();"#),
        ]);
        let via_a = export(&mut interp, "modules/b", "viaA");
        assert_eq!(interp.call(&via_a, vec![]).unwrap().display(), "ab");
    }

    #[test]
    fn test_initialization_cycle_is_reported() {
        let mut interp = with_files(&[
            ("modules/a.ts", r#"import { b } from "./b"; export const a = b + 1;"#),
            ("modules/b.ts", r#"import { a } from "./a"; export const b = a + 1;"#),
        ]);
        let err = interp.load_module("modules/a").err().unwrap();
        match err {
            RuntimeError::Resolve(ResolveError::Cycle(chain)) => {
                assert_eq!(chain, vec!["modules/a", "modules/b", "modules/a"]);
            }
            other => panic!("unexpected {}", other),
        }
        // a failed instantiation is retried, not cached
        assert!(!interp.modules().is_instantiated("modules/a"));
    }

    #[test]
    fn test_missing_named_export() {
        let mut interp = with_files(&[
            ("modules/a.ts", r#"import { nope } from "./b"; export const a = nope;"#),
            ("modules/b.ts", "export const b = 1;"),
        ]);
        let err = interp.load_module("modules/a").err().unwrap();
        assert!(matches!(
            err,
            RuntimeError::Resolve(ResolveError::ExportNotFound { ref module, ref export })
                if module == "modules/b" && export == "nope"
        ));
    }

    #[test]
    fn test_compile_failure_of_sibling() {
        let mut interp = with_files(&[
            ("modules/a.ts", r#"import { b } from "./b"; export const a = b;"#),
            ("modules/b.ts", "export const b = ;"),
        ]);
        assert_eq!(interp.modules().diagnostics().len(), 1);
        let err = interp.load_module("modules/a").err().unwrap();
        assert!(matches!(err, RuntimeError::Resolve(ResolveError::CompileFailed { .. })));
    }

    #[test]
    fn test_unknown_platform_name() {
        let mut interp = with_files(&[(
            "pages/index.tsx",
            r#"import { Teleport } from "@platform"; export default () => <Teleport />;"#,
        )]);
        let err = interp.resolve_component("pages/index").err().unwrap();
        assert!(matches!(err, RuntimeError::Scope(ScopeError::Unknown { ref name, .. }) if name == "Teleport"));
    }

    #[test]
    fn test_page_without_default_export() {
        let mut interp = with_files(&[("pages/index.tsx", "export const helper = 1;")]);
        let err = interp.resolve_component("pages/index").err().unwrap();
        assert!(matches!(err, RuntimeError::Resolve(ResolveError::NoDefaultExport(_))));
    }

    #[test]
    fn test_namespace_and_reexports() {
        let mut interp = with_files(&[
            ("modules/format.ts", r#"export const money = (n) => "$" + n.toFixed(2); export default "fmt";"#),
            ("modules/index.ts", r#"export { money as formatMoney } from "./format";"#),
            (
                "modules/use.ts",
                r#"
                import * as format from "./format";
                import { formatMoney } from "./index";
                export const out = format.money(1) + "/" + formatMoney(2) + "/" + format.default;
                "#,
            ),
        ]);
        assert_eq!(export(&mut interp, "modules/use", "out").display(), "$1.00/$2.00/fmt");
    }
}
