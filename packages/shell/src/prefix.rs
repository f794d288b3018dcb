use crate::error::ShellError;
use pagewright_runtime::UrlRewriter;
use std::fmt;

/// URL prefix an application instance is mounted under.
///
/// User code only ever sees root-relative paths (`/clients`); the prefix
/// is added when a link is rendered and stripped again when the browser
/// hands a URL back.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MountPrefix(String);

impl MountPrefix {
    /// Normalize to `/a/b`, or the empty string for the root. Repeated and
    /// trailing slashes are dropped.
    pub fn new(prefix: &str) -> Self {
        let segments: Vec<&str> = prefix.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            MountPrefix(String::new())
        } else {
            MountPrefix(format!("/{}", segments.join("/")))
        }
    }

    pub fn root() -> Self {
        MountPrefix(String::new())
    }

    /// Prefix of a published application: `{base}/{slug}`
    pub fn for_app(base: &str, slug: &str) -> Self {
        Self::new(&format!("{}/{}", base, slug))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Browser URL for a root-relative href
    pub fn external(&self, internal: &str) -> String {
        let internal = if internal.starts_with('/') {
            internal.to_string()
        } else {
            format!("/{}", internal)
        };
        if self.is_root() {
            return internal;
        }
        match internal.strip_prefix('/') {
            Some("") => self.0.clone(),
            Some(rest) if rest.starts_with('?') || rest.starts_with('#') => format!("{}{}", self.0, rest),
            _ => format!("{}{}", self.0, internal),
        }
    }

    /// Root-relative href for a browser URL. URLs that do not live under
    /// the prefix are rejected rather than guessed at.
    pub fn to_internal(&self, external: &str) -> Result<String, ShellError> {
        let outside = || ShellError::OutsidePrefix {
            url: external.to_string(),
            prefix: self.0.clone(),
        };
        if !external.starts_with('/') {
            return Err(outside());
        }
        let rest = external.strip_prefix(self.0.as_str()).ok_or_else(outside)?;
        match rest.chars().next() {
            None => Ok("/".to_string()),
            Some('/') => Ok(rest.to_string()),
            Some('?') | Some('#') => Ok(format!("/{}", rest)),
            Some(_) => Err(outside()),
        }
    }
}

impl UrlRewriter for MountPrefix {
    fn external_href(&self, internal: &str) -> String {
        self.external(internal)
    }
}

impl fmt::Display for MountPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("/")
        } else {
            f.write_str(&self.0)
        }
    }
}
