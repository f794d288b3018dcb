use serde::{Deserialize, Serialize};
use std::fmt;

/// One URL segment of a route pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "camelCase")]
pub enum Segment {
    Static(String),
    /// `[id]`: matches exactly one URL segment
    Param(String),
    /// `[...rest]`: matches one or more remaining URL segments
    CatchAll(String),
}

impl Segment {
    /// Parse a path segment as written in a file path
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            Some(inner) => match inner.strip_prefix("...") {
                Some(name) => Segment::CatchAll(name.to_string()),
                None => Segment::Param(inner.to_string()),
            },
            None => Segment::Static(raw.to_string()),
        }
    }

    /// Matching priority: static beats dynamic beats catch-all
    pub fn rank(&self) -> u8 {
        match self {
            Segment::Static(_) => 3,
            Segment::Param(_) => 2,
            Segment::CatchAll(_) => 1,
        }
    }

    /// Form used for collision checks; parameter names do not matter
    pub(crate) fn normalized(&self) -> &str {
        match self {
            Segment::Static(s) => s,
            Segment::Param(_) => ":",
            Segment::CatchAll(_) => "*",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Static(s) => f.write_str(s),
            Segment::Param(name) => write!(f, ":{}", name),
            Segment::CatchAll(name) => write!(f, "*{}", name),
        }
    }
}

/// Render a segment list as a URL pattern (`/clients/:id`)
pub fn pattern_string(segments: &[Segment]) -> String {
    if segments.is_empty() {
        return "/".to_string();
    }
    segments.iter().map(|s| format!("/{}", s)).collect()
}

pub(crate) fn normalized_key(segments: &[Segment]) -> String {
    segments.iter().map(Segment::normalized).collect::<Vec<_>>().join("/")
}
