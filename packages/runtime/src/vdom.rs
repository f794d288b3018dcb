use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Rendered output of an application
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum VNode {
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        /// Event name to handler id, see `Interpreter::dispatch`
        handlers: BTreeMap<String, String>,
        children: Vec<VNode>,
    },
    Text {
        text: String,
    },
    Fragment {
        children: Vec<VNode>,
    },
    /// Contained failure of one component or route
    Error {
        component: Option<String>,
        message: String,
    },
}

const VOID_ELEMENTS: &[&str] = &["area", "br", "col", "hr", "img", "input", "link", "meta", "source", "wbr"];

impl VNode {
    pub fn text(text: impl Into<String>) -> VNode {
        VNode::Text { text: text.into() }
    }

    pub fn error(component: Option<String>, message: impl Into<String>) -> VNode {
        VNode::Error {
            component,
            message: message.into(),
        }
    }

    pub fn children(&self) -> &[VNode] {
        match self {
            VNode::Element { children, .. } | VNode::Fragment { children } => children,
            _ => &[],
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            VNode::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        match self {
            VNode::Element { attributes, .. } => attributes.get(name).map(String::as_str),
            _ => None,
        }
    }

    pub fn handler(&self, event: &str) -> Option<&str> {
        match self {
            VNode::Element { handlers, .. } => handlers.get(event).map(String::as_str),
            _ => None,
        }
    }

    /// Concatenated text of this subtree
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            VNode::Text { text } => out.push_str(text),
            VNode::Error { message, .. } => out.push_str(message),
            _ => {
                for child in self.children() {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Depth-first search
    pub fn find(&self, predicate: &dyn Fn(&VNode) -> bool) -> Option<&VNode> {
        if predicate(self) {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(predicate))
    }

    pub fn find_tag(&self, tag: &str) -> Option<&VNode> {
        self.find(&|node| node.tag() == Some(tag))
    }

    pub fn errors(&self) -> Vec<&VNode> {
        let mut errors = Vec::new();
        self.collect_errors(&mut errors);
        errors
    }

    fn collect_errors<'a>(&'a self, out: &mut Vec<&'a VNode>) {
        if let VNode::Error { .. } = self {
            out.push(self);
        }
        for child in self.children() {
            child.collect_errors(out);
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            VNode::Text { text } => out.push_str(&escape(text)),
            VNode::Fragment { children } => {
                for child in children {
                    child.write_html(out);
                }
            }
            VNode::Error { component, message } => {
                out.push_str("<div class=\"pw-error\" role=\"alert\"");
                if let Some(component) = component {
                    let _ = write!(out, " data-component=\"{}\"", escape(component));
                }
                let _ = write!(out, ">{}</div>", escape(message));
            }
            VNode::Element {
                tag,
                attributes,
                children,
                ..
            } => {
                let _ = write!(out, "<{}", tag);
                for (name, value) in attributes {
                    if value.is_empty() {
                        let _ = write!(out, " {}", name);
                    } else {
                        let _ = write!(out, " {}=\"{}\"", name, escape(value));
                    }
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for child in children {
                    child.write_html(out);
                }
                let _ = write!(out, "</{}>", tag);
            }
        }
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
