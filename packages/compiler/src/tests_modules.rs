#[cfg(test)]
mod module_tests {
    use crate::ast::*;
    use crate::{compile, compile_report, CompileErrorKind, ImportKind, DEFAULT_BINDING};

    #[test]
    fn test_platform_import_becomes_scope_bind() {
        let unit = compile(
            r#"
            import { useState, Button as Btn } from "@platform";
            export default function Page() { return null }
            "#,
        )
        .unwrap();

        match &unit.body()[0] {
            Stmt::Var(decl) => {
                let declarator = &decl.declarators[0];
                assert_eq!(declarator.init, Some(Expr::PlatformScope));
                assert_eq!(
                    declarator.pattern.bound_names(),
                    vec!["useState".to_string(), "Btn".to_string()]
                );
            }
            other => panic!("unexpected {:?}", other),
        }
        let names: Vec<_> = unit.platform_names().collect();
        assert_eq!(names, vec!["useState", "Button"]);
    }

    #[test]
    fn test_react_is_an_alias_of_the_platform() {
        let unit = compile(r#"import React, { useEffect } from "react"; export default () => null;"#).unwrap();
        assert_eq!(unit.imports()[0].kind, ImportKind::Platform);
        assert_eq!(unit.body().len(), 3);
    }

    #[test]
    fn test_sibling_imports_become_lazy_refs() {
        let unit = compile(
            r#"
            import Card, { CardBody } from "@/components/Card";
            import * as format from "../modules/format";
            export default function Page() { return <Card /> }
            "#,
        )
        .unwrap();

        let refs: Vec<&ModuleRef> = unit
            .body()
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::Var(decl) => match &decl.declarators[0].init {
                    Some(Expr::ModuleRef(module_ref)) => Some(module_ref),
                    _ => None,
                },
                _ => None,
            })
            .collect();
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0].export, ImportedName::Default);
        assert_eq!(refs[1].export, ImportedName::Named("CardBody".to_string()));
        assert_eq!(refs[2].export, ImportedName::Namespace);
        assert_eq!(refs[2].specifier, "../modules/format");

        let siblings: Vec<_> = unit.sibling_specifiers().collect();
        assert_eq!(siblings, vec!["@/components/Card", "../modules/format"]);
    }

    #[test]
    fn test_unknown_package_is_rejected() {
        let err = compile(r#"import _ from "lodash";"#).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::Import);
        assert!(err.message.contains("lodash"));
    }

    #[test]
    fn test_type_only_imports_are_dropped() {
        let unit = compile(
            r#"
            import type { Client } from "@/modules/types";
            import { type Props, useMemo } from "@platform";
            export const x = 1;
            "#,
        )
        .unwrap();
        assert_eq!(unit.imports().len(), 1);
        let names: Vec<_> = unit.platform_names().collect();
        assert_eq!(names, vec!["useMemo"]);
    }

    #[test]
    fn test_default_and_named_exports() {
        let unit = compile(
            r#"
            export function Badge() { return null }
            export const LIMIT = 10, [first, second] = pair;
            const helper = () => 1;
            export { helper as assist };
            export default function Card() { return null }
            "#,
        )
        .unwrap();

        let exports = unit.exports();
        assert_eq!(exports.default_local(), Some("Card"));
        assert_eq!(exports.local_for("assist"), Some("helper"));
        let named: Vec<_> = exports.named().iter().map(|e| e.exported.as_str()).collect();
        assert_eq!(named, vec!["Badge", "LIMIT", "first", "second", "assist"]);
        assert!(unit.has_default_export());
    }

    #[test]
    fn test_anonymous_default_gets_hidden_binding() {
        let unit = compile("export default () => <div />;").unwrap();
        assert_eq!(unit.exports().default_local(), Some(DEFAULT_BINDING));
    }

    #[test]
    fn test_default_identifier_export() {
        let unit = compile("const Page = () => null;\nexport default Page;").unwrap();
        assert_eq!(unit.exports().default_local(), Some("Page"));
    }

    #[test]
    fn test_export_as_default() {
        let unit = compile("function Page() { return null }\nexport { Page as default };").unwrap();
        assert_eq!(unit.exports().default_local(), Some("Page"));
    }

    #[test]
    fn test_reexports() {
        let unit = compile(r#"export { Card, default as Panel } from "./Card";"#).unwrap();
        assert!(unit.exports().local_for("Card").is_some());
        assert!(unit.exports().local_for("Panel").is_some());
        assert!(!unit.has_default_export());
        assert_eq!(unit.sibling_specifiers().count(), 1);
    }

    #[test]
    fn test_duplicate_default_export() {
        let err = compile("export default 1;\nexport default 2;").unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::Export);
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_exporting_undeclared_name() {
        let err = compile("export { missing };").unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::Export);
        assert!(err.message.contains("missing"));
    }

    #[test]
    fn test_compile_report() {
        let ok = compile_report("export default function A() { return null }\nexport const b = 1;");
        assert!(ok.success);
        assert!(ok.has_default_export);
        assert_eq!(ok.named_exports, vec!["b".to_string()]);

        let failed = compile_report("export default function A( {");
        assert!(!failed.success);
        assert!(failed.message.as_deref().is_some_and(|m| !m.is_empty()));
        assert!(!failed.has_default_export);
        assert_eq!(failed.line, Some(1));
    }
}
