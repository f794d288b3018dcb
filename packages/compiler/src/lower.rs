//! Lowering of a parsed file into the body of an executable unit:
//! imports become binds, markup becomes `createElement` calls and exports
//! are collected into a table.

use crate::ast::*;
use crate::error::{CompileError, CompileResult};
use crate::unit::{ExportTable, ImportKind, ImportRecord, DEFAULT_BINDING};
use crate::visitor::{walk_expr_mut, walk_stmts_mut, VisitorMut};
use pagewright_common::{is_platform_package, is_sibling_specifier};

pub(crate) struct Lowered {
    pub body: Vec<Stmt>,
    pub exports: ExportTable,
    pub imports: Vec<ImportRecord>,
}

pub(crate) fn lower(program: Program, source: &str) -> CompileResult<Lowered> {
    let (prelude, rest, mut imports) = lower_imports(program.body, source)?;

    let mut body = prelude;
    let mut exports = ExportTable::default();
    let mut pending = Vec::new();
    for stmt in rest {
        match stmt {
            Stmt::Export(export) => {
                lower_export(export, source, &mut body, &mut exports, &mut pending, &mut imports)?;
            }
            other => body.push(other),
        }
    }

    let declared = top_level_names(&body);
    for (local, span) in pending {
        if !declared.iter().any(|name| *name == local) {
            return Err(CompileError::export(
                source,
                span.start,
                format!("Exported name '{}' is not declared in this file", local),
            ));
        }
    }

    walk_stmts_mut(&mut MarkupLowering, &mut body);

    Ok(Lowered { body, exports, imports })
}

/// Split imports out of the body, producing their bind statements
fn lower_imports(stmts: Vec<Stmt>, source: &str) -> CompileResult<(Vec<Stmt>, Vec<Stmt>, Vec<ImportRecord>)> {
    let mut prelude = Vec::new();
    let mut rest = Vec::new();
    let mut records = Vec::new();

    for stmt in stmts {
        let import = match stmt {
            Stmt::Import(import) => import,
            other => {
                rest.push(other);
                continue;
            }
        };

        let mut names = Vec::new();
        if import.default.is_some() {
            names.push("default".to_string());
        }
        if import.namespace.is_some() {
            names.push("*".to_string());
        }
        names.extend(import.named.iter().map(|spec| spec.imported.clone()));

        if is_platform_package(&import.specifier) {
            for local in import.default.iter().chain(import.namespace.iter()) {
                prelude.push(const_decl(Pattern::Ident(local.clone()), Expr::PlatformScope));
            }
            if !import.named.is_empty() {
                let props = import
                    .named
                    .iter()
                    .map(|spec| {
                        (
                            spec.imported.clone(),
                            PatternElem {
                                pattern: Pattern::Ident(spec.local.clone()),
                                default: None,
                            },
                        )
                    })
                    .collect();
                prelude.push(const_decl(Pattern::Object { props, rest: None }, Expr::PlatformScope));
            }
            records.push(ImportRecord {
                specifier: import.specifier,
                kind: ImportKind::Platform,
                names: import.named.into_iter().map(|spec| spec.imported).collect(),
            });
        } else if is_sibling_specifier(&import.specifier) {
            let module_ref = |export: ImportedName| {
                Expr::ModuleRef(ModuleRef {
                    specifier: import.specifier.clone(),
                    export,
                })
            };
            if let Some(local) = &import.default {
                prelude.push(const_decl(Pattern::Ident(local.clone()), module_ref(ImportedName::Default)));
            }
            if let Some(local) = &import.namespace {
                prelude.push(const_decl(Pattern::Ident(local.clone()), module_ref(ImportedName::Namespace)));
            }
            for spec in &import.named {
                let export = if spec.imported == "default" {
                    ImportedName::Default
                } else {
                    ImportedName::Named(spec.imported.clone())
                };
                prelude.push(const_decl(Pattern::Ident(spec.local.clone()), module_ref(export)));
            }
            records.push(ImportRecord {
                specifier: import.specifier,
                kind: ImportKind::Sibling,
                names,
            });
        } else {
            return Err(CompileError::import(
                source,
                import.span.start,
                format!(
                    "Cannot import '{}': only '@platform' and files of this application can be imported",
                    import.specifier
                ),
            ));
        }
    }

    Ok((prelude, rest, records))
}

fn lower_export(
    export: ExportDecl,
    source: &str,
    body: &mut Vec<Stmt>,
    exports: &mut ExportTable,
    pending: &mut Vec<(String, Span)>,
    imports: &mut Vec<ImportRecord>,
) -> CompileResult<()> {
    let span = export.span();
    let duplicate = |name: &str| {
        CompileError::export(source, span.start, format!("Duplicate export '{}'", name))
    };

    match export {
        ExportDecl::DefaultFunction { function, .. } => {
            let local = match function.name.clone() {
                Some(name) => {
                    body.push(Stmt::Function(function));
                    name
                }
                None => {
                    body.push(const_decl(
                        Pattern::Ident(DEFAULT_BINDING.to_string()),
                        Expr::Function(function),
                    ));
                    DEFAULT_BINDING.to_string()
                }
            };
            if !exports.set_default(local) {
                return Err(duplicate("default"));
            }
        }
        ExportDecl::DefaultExpr { expr, .. } => {
            let local = match expr {
                Expr::Ident(name) => {
                    pending.push((name.clone(), span));
                    name
                }
                other => {
                    body.push(const_decl(Pattern::Ident(DEFAULT_BINDING.to_string()), other));
                    DEFAULT_BINDING.to_string()
                }
            };
            if !exports.set_default(local) {
                return Err(duplicate("default"));
            }
        }
        ExportDecl::Decl { stmt, .. } => {
            let names = match stmt.as_ref() {
                Stmt::Var(decl) => decl
                    .declarators
                    .iter()
                    .flat_map(|declarator| declarator.pattern.bound_names())
                    .collect(),
                Stmt::Function(function) => function.name.iter().cloned().collect(),
                _ => Vec::new(),
            };
            for name in names {
                if !exports.add_named(name.clone(), name.clone()) {
                    return Err(duplicate(&name));
                }
            }
            body.push(*stmt);
        }
        ExportDecl::Named {
            specifiers,
            from: None,
            ..
        } => {
            for spec in specifiers {
                pending.push((spec.local.clone(), span));
                let added = if spec.exported == "default" {
                    exports.set_default(spec.local)
                } else {
                    exports.add_named(spec.exported.clone(), spec.local)
                };
                if !added {
                    return Err(duplicate(&spec.exported));
                }
            }
        }
        ExportDecl::Named {
            specifiers,
            from: Some(specifier),
            ..
        } => {
            let platform = is_platform_package(&specifier);
            if !platform && !is_sibling_specifier(&specifier) {
                return Err(CompileError::import(
                    source,
                    span.start,
                    format!("Cannot re-export from '{}'", specifier),
                ));
            }
            let mut names = Vec::new();
            for spec in specifiers {
                let hidden = format!("*reexport:{}*", spec.exported);
                let init = if platform {
                    Expr::Member {
                        object: Box::new(Expr::PlatformScope),
                        property: MemberProp::Named(spec.local.clone()),
                        optional: false,
                    }
                } else {
                    let export = if spec.local == "default" {
                        ImportedName::Default
                    } else {
                        ImportedName::Named(spec.local.clone())
                    };
                    Expr::ModuleRef(ModuleRef {
                        specifier: specifier.clone(),
                        export,
                    })
                };
                body.push(const_decl(Pattern::Ident(hidden.clone()), init));
                names.push(spec.local);
                let added = if spec.exported == "default" {
                    exports.set_default(hidden)
                } else {
                    exports.add_named(spec.exported.clone(), hidden)
                };
                if !added {
                    return Err(duplicate(&spec.exported));
                }
            }
            imports.push(ImportRecord {
                specifier,
                kind: if platform { ImportKind::Platform } else { ImportKind::Sibling },
                names,
            });
        }
    }
    Ok(())
}

fn const_decl(pattern: Pattern, init: Expr) -> Stmt {
    Stmt::Var(VarDecl {
        kind: DeclKind::Const,
        declarators: vec![Declarator {
            pattern,
            init: Some(init),
        }],
    })
}

fn top_level_names(body: &[Stmt]) -> Vec<String> {
    let mut names = Vec::new();
    for stmt in body {
        match stmt {
            Stmt::Var(decl) => {
                for declarator in &decl.declarators {
                    names.extend(declarator.pattern.bound_names());
                }
            }
            Stmt::Function(function) => names.extend(function.name.iter().cloned()),
            _ => {}
        }
    }
    names
}

/// Rewrites markup into `createElement(type, props, ...children)` calls
struct MarkupLowering;

impl VisitorMut for MarkupLowering {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
        if matches!(expr, Expr::Markup(_)) {
            if let Expr::Markup(element) = std::mem::replace(expr, Expr::Undefined) {
                *expr = lower_element(*element);
            }
        }
    }
}

fn lower_element(element: MarkupElement) -> Expr {
    let tag = match element.name {
        ElementName::Intrinsic(name) => Expr::String(name),
        ElementName::Component(expr) => expr,
        ElementName::Fragment => Expr::Intrinsic(Intrinsic::Fragment),
    };

    let props = if element.attributes.is_empty() {
        Expr::Null
    } else {
        Expr::Object(
            element
                .attributes
                .into_iter()
                .map(|attribute| match attribute {
                    Attribute::Named { name, value } => Property::KeyValue {
                        key: PropKey::Named(name),
                        value: value.unwrap_or(Expr::Bool(true)),
                    },
                    Attribute::Spread(expr) => Property::Spread(expr),
                })
                .collect(),
        )
    };

    let mut args = vec![Argument::Expr(tag), Argument::Expr(props)];
    args.extend(element.children.into_iter().map(|child| match child {
        MarkupChild::Text(text) => Argument::Expr(Expr::String(text)),
        MarkupChild::Expr(expr) => Argument::Expr(expr),
        MarkupChild::Spread(expr) => Argument::Spread(expr),
    }));

    Expr::Call {
        callee: Box::new(Expr::Intrinsic(Intrinsic::CreateElement)),
        args,
        optional: false,
    }
}
