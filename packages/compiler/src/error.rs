use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CompileErrorKind {
    /// The text does not parse
    Syntax,
    /// Valid source using a construct the runtime does not execute
    UnsupportedSyntax,
    /// An import names something other than the platform or a sibling file
    Import,
    /// The export table is inconsistent (duplicates, undeclared names)
    Export,
}

impl fmt::Display for CompileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompileErrorKind::Syntax => "Syntax",
            CompileErrorKind::UnsupportedSyntax => "Unsupported syntax",
            CompileErrorKind::Import => "Import",
            CompileErrorKind::Export => "Export",
        };
        f.write_str(name)
    }
}

/// A compile failure in one file. Line and column are 1-based.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{kind} error at {line}:{column}: {message}")]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
    #[serde(skip)]
    pub offset: usize,
}

impl CompileError {
    pub fn new(kind: CompileErrorKind, source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_column(source, offset);
        Self {
            kind,
            message: message.into(),
            line,
            column,
            offset,
        }
    }

    pub fn syntax(source: &str, offset: usize, message: impl Into<String>) -> Self {
        Self::new(CompileErrorKind::Syntax, source, offset, message)
    }

    pub fn unsupported(source: &str, offset: usize, message: impl Into<String>) -> Self {
        Self::new(CompileErrorKind::UnsupportedSyntax, source, offset, message)
    }

    pub fn import(source: &str, offset: usize, message: impl Into<String>) -> Self {
        Self::new(CompileErrorKind::Import, source, offset, message)
    }

    pub fn export(source: &str, offset: usize, message: impl Into<String>) -> Self {
        Self::new(CompileErrorKind::Export, source, offset, message)
    }
}

/// 1-based line and column (in characters) of a byte offset
pub fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}
