use crate::builder::{RouteNode, RouteTree};
use crate::segment::Segment;
use serde::Serialize;
use std::collections::BTreeMap;

/// The page a URL resolves to, with its layout chain and bound parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMatch {
    pub pattern: String,
    pub page: String,
    /// Enclosing `_layout` files under `pages/`, outermost first
    pub layouts: Vec<String>,
    pub params: BTreeMap<String, String>,
}

impl RouteTree {
    /// Resolve a root-relative URL path (`/clients/42`).
    ///
    /// When several patterns match, the one whose segments rank highest
    /// from left to right wins: static over parameter over catch-all.
    pub fn match_path(&self, url_path: &str) -> Option<RouteMatch> {
        let path = url_path.split(['?', '#']).next().unwrap_or("");
        let url: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let mut best: Option<(Vec<u8>, RouteMatch)> = None;
        for (layouts, page) in self.pages() {
            let Some((score, params)) = match_segments(&page.segments, &url) else {
                continue;
            };
            if best.as_ref().map_or(true, |(current, _)| score > *current) {
                best = Some((score, to_match(&layouts, page, params)));
            }
        }
        best.map(|(_, found)| found)
    }
}

fn to_match(layouts: &[&RouteNode], page: &RouteNode, params: BTreeMap<String, String>) -> RouteMatch {
    RouteMatch {
        pattern: page.path.clone(),
        page: page.file.clone(),
        layouts: layouts.iter().map(|layout| layout.file.clone()).collect(),
        params,
    }
}

fn match_segments(pattern: &[Segment], url: &[&str]) -> Option<(Vec<u8>, BTreeMap<String, String>)> {
    let mut params = BTreeMap::new();
    let mut score = Vec::with_capacity(pattern.len());

    for (i, segment) in pattern.iter().enumerate() {
        let value = url.get(i)?;
        match segment {
            Segment::Static(expected) => {
                if expected != value {
                    return None;
                }
            }
            Segment::CatchAll(name) if i == pattern.len() - 1 => {
                params.insert(name.clone(), url[i..].join("/"));
                score.push(segment.rank());
                return Some((score, params));
            }
            // A catch-all before the last position binds a single segment
            Segment::Param(name) | Segment::CatchAll(name) => {
                params.insert(name.clone(), value.to_string());
            }
        }
        score.push(segment.rank());
    }

    if pattern.len() == url.len() {
        Some((score, params))
    } else {
        None
    }
}
