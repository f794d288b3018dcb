use crate::ast::*;
use std::sync::Arc;

/// Mutable visitor for transforming the syntax tree
///
/// Default methods walk the whole tree; override the node kinds you need
/// and call the matching `walk_*` function to keep descending.
pub trait VisitorMut: Sized {
    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        walk_stmt_mut(self, stmt);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
    }

    fn visit_function_mut(&mut self, function: &mut Function) {
        walk_function_mut(self, function);
    }

    fn visit_pattern_mut(&mut self, pattern: &mut Pattern) {
        walk_pattern_mut(self, pattern);
    }
}

pub fn walk_stmts_mut<V: VisitorMut>(visitor: &mut V, stmts: &mut [Stmt]) {
    for stmt in stmts {
        visitor.visit_stmt_mut(stmt);
    }
}

fn visit_arc_function<V: VisitorMut>(visitor: &mut V, function: &mut Arc<Function>) {
    visitor.visit_function_mut(Arc::make_mut(function));
}

pub fn walk_stmt_mut<V: VisitorMut>(visitor: &mut V, stmt: &mut Stmt) {
    match stmt {
        Stmt::Var(decl) => walk_var_decl_mut(visitor, decl),
        Stmt::Function(function) => visit_arc_function(visitor, function),
        Stmt::Return(value) => {
            if let Some(value) = value {
                visitor.visit_expr_mut(value);
            }
        }
        Stmt::If {
            test,
            consequent,
            alternate,
        } => {
            visitor.visit_expr_mut(test);
            visitor.visit_stmt_mut(consequent);
            if let Some(alternate) = alternate {
                visitor.visit_stmt_mut(alternate);
            }
        }
        Stmt::Block(body) => walk_stmts_mut(visitor, body),
        Stmt::Loop {
            pattern,
            iterable,
            body,
            ..
        } => {
            visitor.visit_pattern_mut(pattern);
            visitor.visit_expr_mut(iterable);
            visitor.visit_stmt_mut(body);
        }
        Stmt::While { test, body } => {
            visitor.visit_expr_mut(test);
            visitor.visit_stmt_mut(body);
        }
        Stmt::Throw(value) | Stmt::Expr(value) => visitor.visit_expr_mut(value),
        Stmt::Try {
            block,
            param,
            handler,
            finalizer,
        } => {
            walk_stmts_mut(visitor, block);
            if let Some(param) = param {
                visitor.visit_pattern_mut(param);
            }
            if let Some(handler) = handler {
                walk_stmts_mut(visitor, handler);
            }
            if let Some(finalizer) = finalizer {
                walk_stmts_mut(visitor, finalizer);
            }
        }
        Stmt::Export(export) => match export {
            ExportDecl::DefaultFunction { function, .. } => visit_arc_function(visitor, function),
            ExportDecl::DefaultExpr { expr, .. } => visitor.visit_expr_mut(expr),
            ExportDecl::Decl { stmt, .. } => visitor.visit_stmt_mut(stmt),
            ExportDecl::Named { .. } => {}
        },
        Stmt::Break | Stmt::Continue | Stmt::Import(_) | Stmt::Empty => {}
    }
}

pub fn walk_var_decl_mut<V: VisitorMut>(visitor: &mut V, decl: &mut VarDecl) {
    for declarator in &mut decl.declarators {
        visitor.visit_pattern_mut(&mut declarator.pattern);
        if let Some(init) = &mut declarator.init {
            visitor.visit_expr_mut(init);
        }
    }
}

pub fn walk_function_mut<V: VisitorMut>(visitor: &mut V, function: &mut Function) {
    for param in &mut function.params {
        visitor.visit_pattern_mut(&mut param.pattern);
        if let Some(default) = &mut param.default {
            visitor.visit_expr_mut(default);
        }
    }
    match &mut function.body {
        FunctionBody::Block(body) => walk_stmts_mut(visitor, body),
        FunctionBody::Expr(expr) => visitor.visit_expr_mut(expr),
    }
}

pub fn walk_pattern_mut<V: VisitorMut>(visitor: &mut V, pattern: &mut Pattern) {
    match pattern {
        Pattern::Ident(_) => {}
        Pattern::Object { props, .. } => {
            for (_, elem) in props {
                walk_pattern_elem_mut(visitor, elem);
            }
        }
        Pattern::Array { elements, rest } => {
            for elem in elements.iter_mut().flatten() {
                walk_pattern_elem_mut(visitor, elem);
            }
            if let Some(rest) = rest {
                visitor.visit_pattern_mut(rest);
            }
        }
    }
}

fn walk_pattern_elem_mut<V: VisitorMut>(visitor: &mut V, elem: &mut PatternElem) {
    visitor.visit_pattern_mut(&mut elem.pattern);
    if let Some(default) = &mut elem.default {
        visitor.visit_expr_mut(default);
    }
}

pub fn walk_expr_mut<V: VisitorMut>(visitor: &mut V, expr: &mut Expr) {
    match expr {
        Expr::Template(parts) => {
            for part in parts {
                if let TemplatePart::Expr(expr) = part {
                    visitor.visit_expr_mut(expr);
                }
            }
        }
        Expr::Array(items) => {
            for item in items {
                match item {
                    ArrayItem::Item(expr) | ArrayItem::Spread(expr) => visitor.visit_expr_mut(expr),
                }
            }
        }
        Expr::Object(props) => {
            for prop in props {
                match prop {
                    Property::KeyValue { key, value } => {
                        if let PropKey::Computed(key) = key {
                            visitor.visit_expr_mut(key);
                        }
                        visitor.visit_expr_mut(value);
                    }
                    Property::Spread(expr) => visitor.visit_expr_mut(expr),
                    Property::Shorthand(_) => {}
                }
            }
        }
        Expr::Function(function) => visit_arc_function(visitor, function),
        Expr::Unary { arg, .. } => visitor.visit_expr_mut(arg),
        Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
            visitor.visit_expr_mut(left);
            visitor.visit_expr_mut(right);
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            visitor.visit_expr_mut(test);
            visitor.visit_expr_mut(consequent);
            visitor.visit_expr_mut(alternate);
        }
        Expr::Assign { target, value, .. } => {
            visitor.visit_expr_mut(target);
            visitor.visit_expr_mut(value);
        }
        Expr::Member { object, property, .. } => {
            visitor.visit_expr_mut(object);
            if let MemberProp::Computed(index) = property {
                visitor.visit_expr_mut(index);
            }
        }
        Expr::Call { callee, args, .. } | Expr::New { callee, args } => {
            visitor.visit_expr_mut(callee);
            for arg in args {
                match arg {
                    Argument::Expr(expr) | Argument::Spread(expr) => visitor.visit_expr_mut(expr),
                }
            }
        }
        Expr::OptionalChain(inner) => visitor.visit_expr_mut(inner),
        Expr::Markup(element) => walk_markup_mut(visitor, element),
        Expr::Number(_)
        | Expr::String(_)
        | Expr::Bool(_)
        | Expr::Null
        | Expr::Undefined
        | Expr::Ident(_)
        | Expr::Intrinsic(_)
        | Expr::PlatformScope
        | Expr::ModuleRef(_) => {}
    }
}

pub fn walk_markup_mut<V: VisitorMut>(visitor: &mut V, element: &mut MarkupElement) {
    if let ElementName::Component(expr) = &mut element.name {
        visitor.visit_expr_mut(expr);
    }
    for attribute in &mut element.attributes {
        match attribute {
            Attribute::Named { value: Some(value), .. } => visitor.visit_expr_mut(value),
            Attribute::Named { value: None, .. } => {}
            Attribute::Spread(expr) => visitor.visit_expr_mut(expr),
        }
    }
    for child in &mut element.children {
        match child {
            MarkupChild::Expr(expr) | MarkupChild::Spread(expr) => visitor.visit_expr_mut(expr),
            MarkupChild::Text(_) => {}
        }
    }
}
