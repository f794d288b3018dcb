use std::collections::BTreeMap;
use std::fmt;

/// Root-relative location inside a running application
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub path: String,
    pub query: BTreeMap<String, String>,
    pub hash: String,
}

impl Location {
    /// Parse `/path?query#hash`; the path is normalized to start with `/`
    /// and carry no trailing slash
    pub fn parse(url: &str) -> Location {
        let (rest, hash) = match url.split_once('#') {
            Some((rest, hash)) => (rest, hash.to_string()),
            None => (url, String::new()),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, parse_query(query)),
            None => (rest, BTreeMap::new()),
        };
        Location {
            path: normalize_path(path),
            query,
            hash,
        }
    }

    pub fn search(&self) -> String {
        if self.query.is_empty() {
            String::new()
        } else {
            format!("?{}", encode_query(&self.query))
        }
    }

    pub fn href(&self) -> String {
        let mut href = format!("{}{}", self.path, self.search());
        if !self.hash.is_empty() {
            href.push('#');
            href.push_str(&self.hash);
        }
        href
    }

    /// Resolve a link target written in user code against this location
    pub fn resolve(&self, to: &str) -> Location {
        if to.starts_with('/') {
            return Location::parse(to);
        }
        if to.starts_with('?') || to.starts_with('#') {
            return Location::parse(&format!("{}{}", self.path, to));
        }
        let mut segments: Vec<&str> = self.path.split('/').filter(|s| !s.is_empty()).collect();
        let (target, suffix) = match to.find(['?', '#']) {
            Some(i) => (&to[..i], &to[i..]),
            None => (to, ""),
        };
        for segment in target.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }
        Location::parse(&format!("/{}{}", segments.join("/"), suffix))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.href())
    }
}

pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

fn parse_query(query: &str) -> BTreeMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (decode_component(key), decode_component(value)),
            None => (decode_component(pair), String::new()),
        })
        .collect()
}

pub fn encode_query(query: &BTreeMap<String, String>) -> String {
    query
        .iter()
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn decode_component(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => match (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                (Some(high), Some(low)) => {
                    out.push(high << 4 | low);
                    i += 2;
                }
                _ => out.push(b'%'),
            },
            other => out.push(other),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_digit(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|d| d as u8)
}

fn encode_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(byte as char),
            b' ' => out.push('+'),
            other => out.push_str(&format!("%{:02X}", other)),
        }
    }
    out
}

/// Navigation requested by user code, applied by the shell after the
/// current render or event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationRequest {
    /// Root-relative target inside the application
    Internal { to: String, replace: bool },
    /// Browser-level URL, as produced by the unrewritten router primitives
    External { url: String, replace: bool },
    Back,
}

/// Maps root-relative paths written in user code onto the URLs the
/// browser sees
pub trait UrlRewriter {
    fn external_href(&self, internal: &str) -> String;
}

/// Application mounted at the root
pub struct RootUrls;

impl UrlRewriter for RootUrls {
    fn external_href(&self, internal: &str) -> String {
        internal.to_string()
    }
}
