use pagewright_common::{
    is_source_extension, split_extension, LAYOUT_STEM, PAGES_DIR, PROVIDERS_STEM, SOURCE_EXTENSIONS,
    TOP_LEVEL_DIRS,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A file path violates the naming rules. Each variant has a stable `code()`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Path is empty")]
    Empty,

    #[error("Path '{0}' must be relative")]
    Absolute(String),

    #[error("Path contains an empty, '.' or '..' segment: '{0}'")]
    InvalidSegment(String),

    #[error("Segment '{0}' contains characters outside [A-Za-z0-9_.-]")]
    InvalidCharacters(String),

    #[error("'{path}' is not a source file (expected one of: {expected})")]
    NotSource { path: String, expected: String },

    #[error("Only _layout and _providers may live at the root, found '{0}'")]
    RootFileNotAllowed(String),

    #[error("Files must live under pages/, components/ or modules/, found '{0}/'")]
    UnknownDirectory(String),

    #[error("Dynamic segment '{0}' is only allowed under pages/")]
    ParamOutsidePages(String),

    #[error("Catch-all segment '{0}' must be the last segment")]
    CatchAllNotLast(String),

    #[error("_layout files are only allowed at the root or under pages/")]
    LayoutMisplaced,

    #[error("_providers is only allowed at the root")]
    ProvidersMisplaced,
}

impl PathError {
    pub fn code(&self) -> &'static str {
        match self {
            PathError::Empty => "path_empty",
            PathError::Absolute(_) => "path_absolute",
            PathError::InvalidSegment(_) => "path_invalid_segment",
            PathError::InvalidCharacters(_) => "path_invalid_characters",
            PathError::NotSource { .. } => "path_not_source",
            PathError::RootFileNotAllowed(_) => "path_root_not_allowed",
            PathError::UnknownDirectory(_) => "path_unknown_directory",
            PathError::ParamOutsidePages(_) => "path_param_outside_pages",
            PathError::CatchAllNotLast(_) => "path_catch_all_not_last",
            PathError::LayoutMisplaced => "path_layout_misplaced",
            PathError::ProvidersMisplaced => "path_providers_misplaced",
        }
    }
}

/// A validated file path
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FilePath(String);

impl FilePath {
    pub fn parse(path: &str) -> Result<Self, PathError> {
        validate_path(path)?;
        Ok(Self(path.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path without its extension; two files with the same key collide
    pub fn module_key(&self) -> String {
        pagewright_common::module_key(&self.0)
    }
}

impl fmt::Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for FilePath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_path(&value)?;
        Ok(Self(value))
    }
}

impl From<FilePath> for String {
    fn from(path: FilePath) -> Self {
        path.0
    }
}

impl AsRef<str> for FilePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

enum SegmentKind {
    Plain,
    Param,
    CatchAll,
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn classify(segment: &str) -> Result<SegmentKind, PathError> {
    if let Some(inner) = segment.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        let (kind, name) = match inner.strip_prefix("...") {
            Some(name) => (SegmentKind::CatchAll, name),
            None => (SegmentKind::Param, inner),
        };
        if is_identifier(name) {
            return Ok(kind);
        }
        return Err(PathError::InvalidCharacters(segment.to_string()));
    }
    if segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        Ok(SegmentKind::Plain)
    } else {
        Err(PathError::InvalidCharacters(segment.to_string()))
    }
}

/// Check a file path against the naming rules, in order
pub fn validate_path(path: &str) -> Result<(), PathError> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }
    if path.starts_with('/') || path.starts_with('\\') {
        return Err(PathError::Absolute(path.to_string()));
    }

    let segments: Vec<&str> = path.split('/').collect();
    if segments.iter().any(|s| s.is_empty() || *s == "." || *s == "..") {
        return Err(PathError::InvalidSegment(path.to_string()));
    }

    let last_index = segments.len() - 1;
    let (stem, extension) = split_extension(segments[last_index]);
    let mut kinds = Vec::with_capacity(segments.len());
    for (i, segment) in segments.iter().enumerate() {
        let checked = if i == last_index { stem } else { segment };
        kinds.push(classify(checked)?);
    }

    match extension {
        Some(ext) if is_source_extension(ext) => {}
        _ => {
            return Err(PathError::NotSource {
                path: path.to_string(),
                expected: SOURCE_EXTENSIONS.join(", "),
            })
        }
    }

    if segments.len() == 1 {
        return match stem {
            LAYOUT_STEM | PROVIDERS_STEM => Ok(()),
            _ => Err(PathError::RootFileNotAllowed(path.to_string())),
        };
    }

    let top = segments[0];
    if !TOP_LEVEL_DIRS.contains(&top) {
        return Err(PathError::UnknownDirectory(top.to_string()));
    }

    let in_pages = top == PAGES_DIR;
    for (i, kind) in kinds.iter().enumerate() {
        let written = if i == last_index { stem } else { segments[i] };
        match kind {
            SegmentKind::Plain => {}
            _ if !in_pages => return Err(PathError::ParamOutsidePages(written.to_string())),
            SegmentKind::CatchAll if i != last_index => {
                return Err(PathError::CatchAllNotLast(written.to_string()))
            }
            _ => {}
        }
    }

    if stem == LAYOUT_STEM && !in_pages {
        return Err(PathError::LayoutMisplaced);
    }
    if stem == PROVIDERS_STEM {
        return Err(PathError::ProvidersMisplaced);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(path: &str) -> &'static str {
        validate_path(path).unwrap_err().code()
    }

    #[test]
    fn test_valid_paths() {
        for path in [
            "_layout.tsx",
            "_providers.tsx",
            "pages/index.tsx",
            "pages/clients/[id].tsx",
            "pages/clients/[id]/contacts.tsx",
            "pages/docs/[...path].tsx",
            "pages/settings/_layout.tsx",
            "pages/_layout.tsx",
            "components/Card.tsx",
            "components/ui/data-table.tsx",
            "modules/format.ts",
            "modules/api.v2.js",
        ] {
            assert!(validate_path(path).is_ok(), "{} should be valid", path);
        }
    }

    #[test]
    fn test_rule_codes() {
        assert_eq!(code(""), "path_empty");
        assert_eq!(code("/pages/index.tsx"), "path_absolute");
        assert_eq!(code("pages//index.tsx"), "path_invalid_segment");
        assert_eq!(code("pages/../index.tsx"), "path_invalid_segment");
        assert_eq!(code("pages/my page.tsx"), "path_invalid_characters");
        assert_eq!(code("pages/[not-ident].tsx"), "path_invalid_characters");
        assert_eq!(code("pages/readme.md"), "path_not_source");
        assert_eq!(code("pages/index"), "path_not_source");
        assert_eq!(code("index.tsx"), "path_root_not_allowed");
        assert_eq!(code("lib/util.ts"), "path_unknown_directory");
        assert_eq!(code("components/[id].tsx"), "path_param_outside_pages");
        assert_eq!(code("modules/[x]/a.ts"), "path_param_outside_pages");
        assert_eq!(code("pages/[...a]/b.tsx"), "path_catch_all_not_last");
        assert_eq!(code("components/_layout.tsx"), "path_layout_misplaced");
        assert_eq!(code("pages/_providers.tsx"), "path_providers_misplaced");
    }

    #[test]
    fn test_rules_apply_in_order() {
        // Both absolute and not a source file: the earlier rule wins
        assert_eq!(code("/notes.txt"), "path_absolute");
        // Bad characters are reported before the extension
        assert_eq!(code("pages/a b.txt"), "path_invalid_characters");
    }

    #[test]
    fn test_file_path_module_key() {
        let path = FilePath::parse("components/Card.tsx").unwrap();
        assert_eq!(path.module_key(), "components/Card");
        assert_eq!(path.to_string(), "components/Card.tsx");
    }
}
