//! Path and import-specifier helpers shared by the store, compiler,
//! router and runtime.
//!
//! Two spellings of a file location circulate through the system:
//!
//! - the **file path** as stored (`components/Card.tsx`)
//! - the **module key**, the same path without its source extension
//!   (`components/Card`), which is what imports and routes refer to.

/// Extensions recognised as source files, most specific first.
pub const SOURCE_EXTENSIONS: &[&str] = &["tsx", "ts", "jsx", "js"];

pub const PAGES_DIR: &str = "pages";
pub const COMPONENTS_DIR: &str = "components";
pub const MODULES_DIR: &str = "modules";

/// The only directories a non-root file may live under.
pub const TOP_LEVEL_DIRS: &[&str] = &[PAGES_DIR, COMPONENTS_DIR, MODULES_DIR];

/// Stem of layout files, both the root one and nested ones under `pages/`.
pub const LAYOUT_STEM: &str = "_layout";
/// Stem of the root providers file.
pub const PROVIDERS_STEM: &str = "_providers";
/// Stem of a directory's own page.
pub const INDEX_STEM: &str = "index";

/// Package names whose imports are rewritten into a bind from the platform scope.
pub const PLATFORM_PACKAGES: &[&str] = &["@platform", "react"];

/// Split `dir/name.ext` into (`dir/name`, `Some("ext")`).
///
/// Only the last segment is inspected, so dots in directory names are kept.
pub fn split_extension(path: &str) -> (&str, Option<&str>) {
    let last_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[last_start..].rfind('.') {
        Some(dot) if dot > 0 => {
            let split = last_start + dot;
            (&path[..split], Some(&path[split + 1..]))
        }
        _ => (path, None),
    }
}

pub fn is_source_extension(ext: &str) -> bool {
    SOURCE_EXTENSIONS.contains(&ext)
}

/// Module key for a file path: the path minus a recognised source extension.
pub fn module_key(path: &str) -> String {
    match split_extension(path) {
        (stem, Some(ext)) if is_source_extension(ext) => stem.to_string(),
        _ => path.to_string(),
    }
}

/// Directory part of a key (`pages/clients/[id]` → `pages/clients`).
pub fn parent_dir(key: &str) -> &str {
    match key.rfind('/') {
        Some(i) => &key[..i],
        None => "",
    }
}

/// Last segment of a key (`pages/clients/[id]` → `[id]`).
pub fn file_stem(key: &str) -> &str {
    match key.rfind('/') {
        Some(i) => &key[i + 1..],
        None => key,
    }
}

/// Whether an import specifier names a file of the same application
/// (as opposed to a package).
pub fn is_sibling_specifier(specifier: &str) -> bool {
    specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier.starts_with("@/")
        || TOP_LEVEL_DIRS
            .iter()
            .any(|dir| specifier.strip_prefix(dir).map_or(false, |rest| rest.starts_with('/')))
}

pub fn is_platform_package(specifier: &str) -> bool {
    PLATFORM_PACKAGES.contains(&specifier)
}

/// Resolve an import specifier written in the file `from_key` into the
/// module key it designates.
///
/// Returns `None` for package specifiers and for relative paths that climb
/// above the application root.
pub fn resolve_specifier(from_key: &str, specifier: &str) -> Option<String> {
    let joined = if let Some(rest) = specifier.strip_prefix("@/") {
        rest.to_string()
    } else if specifier.starts_with("./") || specifier.starts_with("../") {
        let base = parent_dir(from_key);
        if base.is_empty() {
            specifier.to_string()
        } else {
            format!("{}/{}", base, specifier)
        }
    } else if is_sibling_specifier(specifier) {
        specifier.to_string()
    } else {
        return None;
    };

    normalize(&joined).map(|normalized| module_key(&normalized))
}

/// Collapse `.` and `..` segments; `None` when the path escapes the root.
pub fn normalize(path: &str) -> Option<String> {
    let mut out: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop()?;
            }
            other => out.push(other),
        }
    }
    if out.is_empty() {
        None
    } else {
        Some(out.join("/"))
    }
}
