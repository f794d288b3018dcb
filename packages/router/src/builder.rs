use crate::error::CollisionError;
use crate::segment::{normalized_key, pattern_string, Segment};
use pagewright_common::{module_key, INDEX_STEM, LAYOUT_STEM, PAGES_DIR, PROVIDERS_STEM};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Route hierarchy derived from the file paths of one version
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTree {
    /// Root `_layout`, wrapping every route
    pub root_layout: Option<String>,
    /// Root `_providers`, applied once outside routing
    pub providers: Option<String>,
    pub routes: Vec<RouteNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteNode {
    /// Full URL pattern, e.g. `/clients/:id`
    pub path: String,
    pub segments: Vec<Segment>,
    /// File that renders this route, as passed in
    pub file: String,
    pub kind: RouteKind,
    /// Routes rendered inside this layout's outlet
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RouteKind {
    Page,
    Layout,
}

struct Entry {
    segments: Vec<Segment>,
    file: String,
}

/// Where a file lands in routing, if anywhere
enum Placement {
    RootLayout,
    Providers,
    Layout(Vec<Segment>),
    Page(Vec<Segment>),
    None,
}

fn place(file: &str) -> Placement {
    let key = module_key(file);
    if key == LAYOUT_STEM {
        return Placement::RootLayout;
    }
    if key == PROVIDERS_STEM {
        return Placement::Providers;
    }

    let Some(rest) = key.strip_prefix(PAGES_DIR).and_then(|r| r.strip_prefix('/')) else {
        return Placement::None;
    };
    let (dir, stem) = match rest.rfind('/') {
        Some(i) => (&rest[..i], &rest[i + 1..]),
        None => ("", rest),
    };
    let mut segments: Vec<Segment> = dir
        .split('/')
        .filter(|s| !s.is_empty())
        .map(Segment::parse)
        .collect();

    match stem {
        LAYOUT_STEM => Placement::Layout(segments),
        INDEX_STEM => Placement::Page(segments),
        PROVIDERS_STEM => Placement::None,
        _ => {
            segments.push(Segment::parse(stem));
            Placement::Page(segments)
        }
    }
}

/// URL pattern of the route a file defines, if it defines one
pub fn route_pattern(file: &str) -> Option<String> {
    match place(file) {
        Placement::Layout(segments) | Placement::Page(segments) => Some(pattern_string(&segments)),
        _ => None,
    }
}

/// Derive the route tree of a set of file paths.
///
/// Only files under `pages/` route. `index` maps to its directory,
/// `[name]` becomes a parameter, `[...name]` a catch-all and `_layout`
/// wraps everything at or below its directory. Files whose routes are
/// identical up to parameter names are a collision.
#[instrument(skip(paths))]
pub fn build_routes<I, S>(paths: I) -> Result<RouteTree, CollisionError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut files: Vec<String> = paths.into_iter().map(|p| p.as_ref().to_string()).collect();
    files.sort();
    files.dedup();

    let mut root_layout: Option<String> = None;
    let mut providers: Option<String> = None;
    let mut layouts = Vec::new();
    let mut pages = Vec::new();

    for file in files {
        match place(&file) {
            Placement::RootLayout => claim_special(&mut root_layout, LAYOUT_STEM, file)?,
            Placement::Providers => claim_special(&mut providers, PROVIDERS_STEM, file)?,
            Placement::Layout(segments) => layouts.push(Entry { segments, file }),
            Placement::Page(segments) => pages.push(Entry { segments, file }),
            Placement::None => {}
        }
    }

    check_unique(&layouts, |route, first, second| CollisionError::DuplicateLayout {
        route,
        first,
        second,
    })?;
    check_unique(&pages, |route, first, second| CollisionError::DuplicateRoute {
        route,
        first,
        second,
    })?;

    // Parent layout of each layout (strict prefix) and page (prefix)
    let layout_parents: Vec<Option<usize>> = layouts
        .iter()
        .map(|layout| deepest_layout(&layouts, &layout.segments, true))
        .collect();
    let page_parents: Vec<Option<usize>> = pages
        .iter()
        .map(|page| deepest_layout(&layouts, &page.segments, false))
        .collect();

    let routes = assemble(None, &layouts, &layout_parents, &pages, &page_parents);
    debug!(
        pages = pages.len(),
        layouts = layouts.len(),
        root_layout = root_layout.is_some(),
        "built route tree"
    );

    Ok(RouteTree {
        root_layout,
        providers,
        routes,
    })
}

fn claim_special(slot: &mut Option<String>, name: &str, file: String) -> Result<(), CollisionError> {
    match slot {
        Some(existing) => Err(CollisionError::DuplicateSpecialFile {
            name: name.to_string(),
            first: existing.clone(),
            second: file,
        }),
        None => {
            *slot = Some(file);
            Ok(())
        }
    }
}

fn check_unique(
    entries: &[Entry],
    collision: impl Fn(String, String, String) -> CollisionError,
) -> Result<(), CollisionError> {
    let mut seen: HashMap<String, &Entry> = HashMap::new();
    for entry in entries {
        let key = normalized_key(&entry.segments);
        if let Some(existing) = seen.get(&key) {
            return Err(collision(
                pattern_string(&existing.segments),
                existing.file.clone(),
                entry.file.clone(),
            ));
        }
        seen.insert(key, entry);
    }
    Ok(())
}

fn deepest_layout(layouts: &[Entry], segments: &[Segment], strict: bool) -> Option<usize> {
    layouts
        .iter()
        .enumerate()
        .filter(|(_, layout)| {
            let len = layout.segments.len();
            let fits = if strict { len < segments.len() } else { len <= segments.len() };
            fits && segments[..len] == layout.segments[..]
        })
        .max_by_key(|(_, layout)| layout.segments.len())
        .map(|(index, _)| index)
}

fn assemble(
    parent: Option<usize>,
    layouts: &[Entry],
    layout_parents: &[Option<usize>],
    pages: &[Entry],
    page_parents: &[Option<usize>],
) -> Vec<RouteNode> {
    let mut nodes = Vec::new();

    for (index, layout) in layouts.iter().enumerate() {
        if layout_parents[index] == parent {
            nodes.push(RouteNode {
                path: pattern_string(&layout.segments),
                segments: layout.segments.clone(),
                file: layout.file.clone(),
                kind: RouteKind::Layout,
                children: assemble(Some(index), layouts, layout_parents, pages, page_parents),
            });
        }
    }
    for (index, page) in pages.iter().enumerate() {
        if page_parents[index] == parent {
            nodes.push(RouteNode {
                path: pattern_string(&page.segments),
                segments: page.segments.clone(),
                file: page.file.clone(),
                kind: RouteKind::Page,
                children: Vec::new(),
            });
        }
    }

    nodes.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
    nodes
}

/// Static segments first, then parameters, then catch-alls; pages before
/// a layout at the same path
fn sort_key(node: &RouteNode) -> (Vec<(u8, String)>, u8) {
    let segments = node
        .segments
        .iter()
        .map(|s| (3 - s.rank(), s.normalized().to_string()))
        .collect();
    let kind = match node.kind {
        RouteKind::Page => 0,
        RouteKind::Layout => 1,
    };
    (segments, kind)
}

impl RouteTree {
    /// Every page route with the layouts enclosing it, outermost first
    pub fn pages(&self) -> Vec<(Vec<&RouteNode>, &RouteNode)> {
        let mut out = Vec::new();
        let mut stack = Vec::new();
        collect_pages(&self.routes, &mut stack, &mut out);
        out
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Find a route node by its pattern
    pub fn find(&self, path: &str) -> Option<&RouteNode> {
        fn search<'a>(nodes: &'a [RouteNode], path: &str) -> Option<&'a RouteNode> {
            for node in nodes {
                if node.path == path {
                    return Some(node);
                }
                if let Some(found) = search(&node.children, path) {
                    return Some(found);
                }
            }
            None
        }
        search(&self.routes, path)
    }
}

fn collect_pages<'a>(
    nodes: &'a [RouteNode],
    stack: &mut Vec<&'a RouteNode>,
    out: &mut Vec<(Vec<&'a RouteNode>, &'a RouteNode)>,
) {
    for node in nodes {
        match node.kind {
            RouteKind::Page => out.push((stack.clone(), node)),
            RouteKind::Layout => {
                stack.push(node);
                collect_pages(&node.children, stack, out);
                stack.pop();
            }
        }
    }
}
