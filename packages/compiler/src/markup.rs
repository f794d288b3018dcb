//! Markup (`<Card title="x">...</Card>`) parsing.
//!
//! Tag names, attribute names and text are scanned directly from the
//! source; embedded expressions go back through the expression parser.

use crate::ast::*;
use crate::error::{CompileError, CompileResult};
use crate::parser::Parser;
use crate::tokenizer::Token;

impl<'src> Parser<'src> {
    pub(crate) fn parse_markup(&mut self) -> CompileResult<Expr> {
        let element = self.parse_element()?;
        Ok(Expr::Markup(Box::new(element)))
    }

    fn parse_element(&mut self) -> CompileResult<MarkupElement> {
        let start = self.expect(Token::Lt, "'<'")?.start;

        if self.match_token(Token::Gt) {
            let children = self.parse_children(None, start)?;
            return Ok(MarkupElement {
                name: ElementName::Fragment,
                attributes: Vec::new(),
                children,
                span: Span::new(start, self.pos),
            });
        }

        let tag = self.scan_name(is_tag_char);
        if tag.is_empty() {
            return Err(self.unexpected("element name"));
        }
        let name = element_name(tag);

        let mut attributes = Vec::new();
        loop {
            self.skip_raw_whitespace();
            let rest = &self.source[self.pos..self.end];

            if rest.starts_with("/>") {
                self.pos += 2;
                return Ok(MarkupElement {
                    name,
                    attributes,
                    children: Vec::new(),
                    span: Span::new(start, self.pos),
                });
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break;
            }
            if rest.starts_with('{') {
                self.pos += 1;
                self.expect(Token::Ellipsis, "'...' in attribute spread")?;
                let expr = self.parse_assignment()?;
                self.expect(Token::RBrace, "'}'")?;
                attributes.push(Attribute::Spread(expr));
                continue;
            }

            let attr_start = self.pos;
            let attr_name = self.scan_name(is_attribute_char);
            if attr_name.is_empty() {
                return Err(match rest.chars().next() {
                    Some(ch) => CompileError::syntax(
                        self.source,
                        attr_start,
                        format!("Unexpected character '{}' in <{}>", ch, tag),
                    ),
                    None => CompileError::syntax(self.source, attr_start, format!("Unterminated element <{}>", tag)),
                });
            }

            self.skip_raw_whitespace();
            let value = if self.source[self.pos..self.end].starts_with('=') {
                self.pos += 1;
                self.skip_raw_whitespace();
                Some(self.parse_attribute_value(tag)?)
            } else {
                None
            };
            attributes.push(Attribute::Named {
                name: attr_name.to_string(),
                value,
            });
        }

        let children = self.parse_children(Some(tag), start)?;
        Ok(MarkupElement {
            name,
            attributes,
            children,
            span: Span::new(start, self.pos),
        })
    }

    fn parse_attribute_value(&mut self, tag: &str) -> CompileResult<Expr> {
        let rest = &self.source[self.pos..self.end];
        match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &rest[1..];
                let close = body.find(quote).ok_or_else(|| {
                    CompileError::syntax(self.source, self.pos, "Unterminated attribute string")
                })?;
                self.pos += close + 2;
                Ok(Expr::String(decode_entities(&body[..close])))
            }
            Some('{') => {
                self.pos += 1;
                let expr = self.parse_assignment()?;
                self.expect(Token::RBrace, "'}'")?;
                Ok(expr)
            }
            Some('<') => self.parse_markup(),
            _ => Err(CompileError::syntax(
                self.source,
                self.pos,
                format!("Expected attribute value in <{}>", tag),
            )),
        }
    }

    /// Parse children up to and including the closing tag
    fn parse_children(&mut self, tag: Option<&str>, start: usize) -> CompileResult<Vec<MarkupChild>> {
        let mut children = Vec::new();

        loop {
            let rest = &self.source[self.pos..self.end];
            let text_len = rest.find(['<', '{']).unwrap_or(rest.len());
            if text_len > 0 {
                let text = markup_text(&rest[..text_len]);
                if !text.is_empty() {
                    children.push(MarkupChild::Text(text));
                }
                self.pos += text_len;
            }

            if self.pos >= self.end {
                return Err(CompileError::syntax(
                    self.source,
                    start,
                    format!("Unterminated element <{}>", tag.unwrap_or("")),
                ));
            }

            if self.source[self.pos..].starts_with('{') {
                self.pos += 1;
                if self.match_token(Token::RBrace) {
                    // `{}` or `{/* comment */}`
                    continue;
                }
                if self.match_token(Token::Ellipsis) {
                    let expr = self.parse_expression()?;
                    self.expect(Token::RBrace, "'}'")?;
                    children.push(MarkupChild::Spread(expr));
                    continue;
                }
                let expr = self.parse_expression()?;
                self.expect(Token::RBrace, "'}'")?;
                children.push(MarkupChild::Expr(expr));
                continue;
            }

            // `<`: closing tag or nested element
            let close_start = self.pos;
            let after_lt = self.source[self.pos + 1..self.end].trim_start();
            if after_lt.starts_with('/') {
                self.pos = self.end - after_lt.len() + 1;
                self.skip_raw_whitespace();
                let closing = self.scan_name(is_tag_char);
                self.skip_raw_whitespace();
                if !self.source[self.pos..self.end].starts_with('>') {
                    return Err(self.unexpected("'>'"));
                }
                self.pos += 1;
                let expected = tag.unwrap_or("");
                if closing != expected {
                    return Err(CompileError::syntax(
                        self.source,
                        close_start,
                        format!("Expected closing tag </{}>, found </{}>", expected, closing),
                    ));
                }
                return Ok(children);
            }

            let element = self.parse_element()?;
            children.push(MarkupChild::Expr(Expr::Markup(Box::new(element))));
        }
    }

    fn skip_raw_whitespace(&mut self) {
        let rest = &self.source[self.pos..self.end];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn scan_name(&mut self, allowed: fn(char) -> bool) -> &'src str {
        let source: &'src str = self.source;
        let rest = &source[self.pos..self.end];
        let len = rest.find(|c: char| !allowed(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '-' | '.' | ':')
}

fn is_attribute_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '-' | ':')
}

/// `div` is an intrinsic tag; `Card` and `UI.Card` are component references
fn element_name(tag: &str) -> ElementName {
    if tag.contains('.') {
        let mut parts = tag.split('.');
        let head = parts.next().unwrap_or(tag);
        let expr = parts.fold(Expr::Ident(head.to_string()), |object, name| Expr::Member {
            object: Box::new(object),
            property: MemberProp::Named(name.to_string()),
            optional: false,
        });
        return ElementName::Component(expr);
    }
    match tag.chars().next() {
        Some(first) if first.is_ascii_lowercase() => ElementName::Intrinsic(tag.to_string()),
        _ => ElementName::Component(Expr::Ident(tag.to_string())),
    }
}

/// Collapse markup text the way JSX does: lines are trimmed where they meet
/// a line break, blank lines are dropped and the remaining lines are joined
/// with single spaces.
pub(crate) fn markup_text(raw: &str) -> String {
    let lines: Vec<&str> = raw.split('\n').collect();
    let last = lines.len() - 1;
    let mut out = String::new();

    for (i, line) in lines.iter().enumerate() {
        let mut line: &str = line;
        if i != 0 {
            line = line.trim_start();
        }
        if i != last {
            line = line.trim_end();
        }
        if line.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(line);
    }

    decode_entities(&out)
}

pub(crate) fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after.find(';').filter(|end| *end <= 10).and_then(|end| {
            let entity = &after[..end];
            decode_entity(entity).map(|ch| (ch, end + 1))
        });
        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &after[consumed..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    if let Some(numeric) = entity.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse().ok()?,
        };
        return char::from_u32(code);
    }
    Some(match entity {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "copy" => '©',
        "middot" => '·',
        "bull" => '•',
        "hellip" => '…',
        "mdash" => '—',
        "ndash" => '–',
        "times" => '×',
        "rarr" => '→',
        "larr" => '←',
        _ => return None,
    })
}
