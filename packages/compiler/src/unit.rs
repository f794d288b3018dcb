use crate::ast::Stmt;
use crate::error::CompileError;
use serde::Serialize;

/// Local binding that holds an anonymous default export
pub const DEFAULT_BINDING: &str = "*default*";

/// The compiled form of one file: a lowered statement list plus its
/// import and export tables. Execution happens in the runtime, which
/// evaluates the body against the platform scope.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutableUnit {
    body: Vec<Stmt>,
    exports: ExportTable,
    imports: Vec<ImportRecord>,
    content_hash: String,
}

impl ExecutableUnit {
    pub(crate) fn new(body: Vec<Stmt>, exports: ExportTable, imports: Vec<ImportRecord>, content_hash: String) -> Self {
        Self {
            body,
            exports,
            imports,
            content_hash,
        }
    }

    pub fn body(&self) -> &[Stmt] {
        &self.body
    }

    pub fn exports(&self) -> &ExportTable {
        &self.exports
    }

    pub fn imports(&self) -> &[ImportRecord] {
        &self.imports
    }

    /// SHA-256 of the source text this unit was compiled from
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Whether the unit has a default export, i.e. can render as a page
    pub fn has_default_export(&self) -> bool {
        self.exports.default.is_some()
    }

    /// Specifiers of the sibling files this unit refers to
    pub fn sibling_specifiers(&self) -> impl Iterator<Item = &str> {
        self.imports
            .iter()
            .filter(|record| record.kind == ImportKind::Sibling)
            .map(|record| record.specifier.as_str())
    }

    /// Capability names pulled from the platform scope
    pub fn platform_names(&self) -> impl Iterator<Item = &str> {
        self.imports
            .iter()
            .filter(|record| record.kind == ImportKind::Platform)
            .flat_map(|record| record.names.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportTable {
    default: Option<String>,
    named: Vec<NamedExport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedExport {
    pub exported: String,
    pub local: String,
}

impl ExportTable {
    /// Record the default export; false if one already exists
    pub(crate) fn set_default(&mut self, local: String) -> bool {
        if self.default.is_some() {
            return false;
        }
        self.default = Some(local);
        true
    }

    /// Record a named export; false if the name is taken
    pub(crate) fn add_named(&mut self, exported: String, local: String) -> bool {
        if self.named.iter().any(|export| export.exported == exported) {
            return false;
        }
        self.named.push(NamedExport { exported, local });
        true
    }

    /// Local binding behind the default export
    pub fn default_local(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Local binding behind an exported name (`"default"` included)
    pub fn local_for(&self, exported: &str) -> Option<&str> {
        if exported == "default" {
            return self.default_local();
        }
        self.named
            .iter()
            .find(|export| export.exported == exported)
            .map(|export| export.local.as_str())
    }

    pub fn named(&self) -> &[NamedExport] {
        &self.named
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ImportKind {
    Platform,
    Sibling,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportRecord {
    pub specifier: String,
    pub kind: ImportKind,
    /// Imported names; `default` and `*` stand for default and namespace imports
    pub names: Vec<String>,
}

/// Outcome of compiling one file, shaped for API consumers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    pub has_default_export: bool,
    pub named_exports: Vec<String>,
}

impl CompileReport {
    pub fn from_result(result: Result<&ExecutableUnit, &CompileError>) -> Self {
        match result {
            Ok(unit) => Self {
                success: true,
                message: None,
                line: None,
                column: None,
                has_default_export: unit.has_default_export(),
                named_exports: unit.exports.named.iter().map(|export| export.exported.clone()).collect(),
            },
            Err(err) => Self {
                success: false,
                message: Some(err.message.clone()),
                line: Some(err.line),
                column: Some(err.column),
                has_default_export: false,
                named_exports: Vec::new(),
            },
        }
    }
}
