//! Syntax tree for application source files.
//!
//! The tree uses only ordered containers so two compilations of the same
//! text are structurally equal. Type syntax never reaches the tree: the
//! parser skips it.

use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Var(VarDecl),
    /// Function declaration; always named, hoisted in its scope
    Function(Arc<Function>),
    Return(Option<Expr>),
    If {
        test: Expr,
        consequent: Box<Stmt>,
        alternate: Option<Box<Stmt>>,
    },
    Block(Vec<Stmt>),
    Loop {
        kind: DeclKind,
        each: LoopEach,
        pattern: Pattern,
        iterable: Expr,
        body: Box<Stmt>,
    },
    While {
        test: Expr,
        body: Box<Stmt>,
    },
    Break,
    Continue,
    Throw(Expr),
    Try {
        block: Vec<Stmt>,
        param: Option<Pattern>,
        handler: Option<Vec<Stmt>>,
        finalizer: Option<Vec<Stmt>>,
    },
    Expr(Expr),
    Import(ImportDecl),
    Export(ExportDecl),
    Empty,
}

/// `for (x of xs)` iterates values, `for (k in obj)` iterates keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEach {
    Of,
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Const,
    Let,
    Var,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub kind: DeclKind,
    pub declarators: Vec<Declarator>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub pattern: Pattern,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Option<String>,
    pub params: Vec<Param>,
    pub body: FunctionBody,
    pub is_arrow: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    Block(Vec<Stmt>),
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub pattern: Pattern,
    pub default: Option<Expr>,
    pub rest: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Ident(String),
    Object {
        props: Vec<(String, PatternElem)>,
        rest: Option<String>,
    },
    Array {
        elements: Vec<Option<PatternElem>>,
        rest: Option<Box<Pattern>>,
    },
}

impl Pattern {
    /// Names bound by this pattern, in source order
    pub fn bound_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names(&self, out: &mut Vec<String>) {
        match self {
            Pattern::Ident(name) => out.push(name.clone()),
            Pattern::Object { props, rest } => {
                for (_, elem) in props {
                    elem.pattern.collect_names(out);
                }
                if let Some(rest) = rest {
                    out.push(rest.clone());
                }
            }
            Pattern::Array { elements, rest } => {
                for elem in elements.iter().flatten() {
                    elem.pattern.collect_names(out);
                }
                if let Some(rest) = rest {
                    rest.collect_names(out);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternElem {
    pub pattern: Pattern,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    String(String),
    Template(Vec<TemplatePart>),
    Bool(bool),
    Null,
    Undefined,
    Ident(String),
    Array(Vec<ArrayItem>),
    Object(Vec<Property>),
    Function(Arc<Function>),
    Unary {
        op: UnaryOp,
        arg: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Member {
        object: Box<Expr>,
        property: MemberProp,
        optional: bool,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Argument>,
        optional: bool,
    },
    New {
        callee: Box<Expr>,
        args: Vec<Argument>,
    },
    /// A member/call chain containing at least one `?.` link; a nullish
    /// optional link short-circuits the whole chain to `undefined`
    OptionalChain(Box<Expr>),
    Markup(Box<MarkupElement>),

    // Produced by lowering only
    Intrinsic(Intrinsic),
    /// The platform scope value handed to the unit at instantiation
    PlatformScope,
    ModuleRef(ModuleRef),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Str(String),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayItem {
    Item(Expr),
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    KeyValue { key: PropKey, value: Expr },
    Shorthand(String),
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropKey {
    Named(String),
    Computed(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberProp {
    Named(String),
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Expr(Expr),
    Spread(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    Typeof,
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    StrictEq,
    StrictNotEq,
    LooseEq,
    LooseNotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Nullish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intrinsic {
    /// `createElement(type, props, ...children)`
    CreateElement,
    /// The fragment element type
    Fragment,
}

/// Lazy reference to an export of a sibling file
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleRef {
    /// Specifier as written; resolved against the importing file at runtime
    pub specifier: String,
    pub export: ImportedName,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportedName {
    Default,
    Named(String),
    Namespace,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkupElement {
    pub name: ElementName,
    pub attributes: Vec<Attribute>,
    pub children: Vec<MarkupChild>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementName {
    /// Lowercase tag such as `div`
    Intrinsic(String),
    /// Component reference such as `Card` or `UI.Card`
    Component(Expr),
    Fragment,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    /// `name`, `name="text"` or `name={expr}`; a bare name means `true`
    Named { name: String, value: Option<Expr> },
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkupChild {
    Text(String),
    Expr(Expr),
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub specifier: String,
    pub default: Option<String>,
    pub namespace: Option<String>,
    pub named: Vec<ImportSpecifier>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpecifier {
    pub imported: String,
    pub local: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportDecl {
    /// `export default function ...` (named or anonymous)
    DefaultFunction { function: Arc<Function>, span: Span },
    /// `export default <expr>`
    DefaultExpr { expr: Expr, span: Span },
    /// `export const ...` / `export function ...`
    Decl { stmt: Box<Stmt>, span: Span },
    /// `export { a, b as c }` with an optional `from "..."`
    Named {
        specifiers: Vec<ExportSpecifier>,
        from: Option<String>,
        span: Span,
    },
}

impl ExportDecl {
    pub fn span(&self) -> Span {
        match self {
            ExportDecl::DefaultFunction { span, .. }
            | ExportDecl::DefaultExpr { span, .. }
            | ExportDecl::Decl { span, .. }
            | ExportDecl::Named { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSpecifier {
    pub local: String,
    pub exported: String,
}
