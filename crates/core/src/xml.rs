//! A permissive parser for the tagged micro-format the model is prompted
//! to emit.
//!
//! The model is free to violate the schema baked into the prompt, so this
//! parser is deliberately forgiving: literal double quotes in element text
//! are escaped in a pre-pass before scanning, entities it doesn't know pass
//! through verbatim, and elements are mapped into plain [`serde_json::Value`]
//! objects rather than a rigid document model. Structural damage (an
//! unterminated element, a mismatched close tag) is still an error, and the
//! router treats it as an attempt failure.

use std::error::Error as StdError;
use std::fmt::{self, Display};

use serde_json::{Map, Value};

/// An error produced while scanning malformed markup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    message: String,
    offset: usize,
}

impl ParseError {
    /// Returns a description of what went wrong.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the byte offset into the caller's markup where the error was
    /// detected.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed markup at byte {}: {}", self.offset, self.message)
    }
}

impl StdError for ParseError {}

/// Parses a tagged markup fragment into a nested mapping.
///
/// The result maps the root element's name to its value. A text-only
/// element becomes a trimmed string; an element with attributes or child
/// elements becomes an object keyed by attribute and child names, where a
/// repeated child name collects into an array.
pub fn parse(markup: &str) -> Result<Value, ParseError> {
    let escaped = escape_quotes(markup);
    parse_escaped(&escaped).map_err(|err| ParseError {
        offset: unescaped_offset(markup, err.offset),
        ..err
    })
}

fn parse_escaped(escaped: &str) -> Result<Value, ParseError> {
    let mut parser = Parser {
        src: escaped.as_bytes(),
        pos: 0,
    };

    parser.skip_whitespace();
    let (name, value) = parser.parse_element(escaped)?;
    parser.skip_whitespace();
    if parser.pos < parser.src.len() {
        return Err(parser.error("trailing content after the root element"));
    }

    let mut root = Map::new();
    root.insert(name, value);
    Ok(Value::Object(root))
}

/// Rewrites literal `"` characters outside tags to `&quot;` so that a model
/// quoting something in its prose never breaks the scan. Quotes inside tags
/// are left alone, since they delimit attribute values.
fn escape_quotes(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut in_tag = false;
    for ch in markup.chars() {
        match ch {
            '<' => {
                in_tag = true;
                out.push(ch);
            }
            '>' => {
                in_tag = false;
                out.push(ch);
            }
            '"' if !in_tag => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Maps a byte offset into the quote-escaped copy back to the offset of the
/// corresponding character in the caller's markup, replaying the accounting
/// of [`escape_quotes`].
fn unescaped_offset(markup: &str, escaped_offset: usize) -> usize {
    let mut escaped_pos = 0;
    let mut in_tag = false;
    for (orig_pos, ch) in markup.char_indices() {
        let width = match ch {
            '<' => {
                in_tag = true;
                1
            }
            '>' => {
                in_tag = false;
                1
            }
            '"' if !in_tag => "&quot;".len(),
            _ => ch.len_utf8(),
        };
        if escaped_offset < escaped_pos + width {
            return orig_pos;
        }
        escaped_pos += width;
    }
    markup.len()
}

fn unescape_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            offset: self.pos,
        }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    #[inline]
    fn bump(&mut self) {
        self.pos += 1;
    }

    fn expect(&mut self, byte: u8) -> Result<(), ParseError> {
        if self.peek() == Some(byte) {
            self.bump();
            Ok(())
        } else {
            Err(self.error(format!("expected `{}`", byte as char)))
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.bump();
        }
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.src[self.pos..].starts_with(prefix.as_bytes())
    }

    fn read_name(&mut self, text: &str) -> Result<String, ParseError> {
        let start = self.pos;
        while matches!(
            self.peek(),
            Some(b) if b.is_ascii_alphanumeric()
                || matches!(b, b'_' | b'-' | b':' | b'.')
        ) {
            self.bump();
        }
        if self.pos == start {
            return Err(self.error("expected a tag or attribute name"));
        }
        Ok(text[start..self.pos].to_owned())
    }

    fn read_attribute(
        &mut self,
        text: &str,
    ) -> Result<(String, String), ParseError> {
        let name = self.read_name(text)?;
        self.skip_whitespace();
        self.expect(b'=')?;
        self.skip_whitespace();

        let quote = match self.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(self.error("expected a quoted attribute value")),
        };
        self.bump();
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b != quote) {
            self.bump();
        }
        if self.peek().is_none() {
            return Err(self.error("unterminated attribute value"));
        }
        let value = unescape_entities(&text[start..self.pos]);
        self.bump();
        Ok((name, value))
    }

    fn parse_element(
        &mut self,
        text: &str,
    ) -> Result<(String, Value), ParseError> {
        self.expect(b'<')?;
        let name = self.read_name(text)?;

        let mut attrs = Map::new();
        let mut children = Map::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b'/') => {
                    self.bump();
                    self.expect(b'>')?;
                    return Ok((name, assemble(attrs, children, String::new())));
                }
                Some(b'>') => {
                    self.bump();
                    break;
                }
                Some(_) => {
                    let (key, value) = self.read_attribute(text)?;
                    attrs.insert(key, Value::String(value));
                }
                None => {
                    return Err(self.error(format!(
                        "unterminated `<{name}>` element"
                    )));
                }
            }
        }

        let mut body = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(self.error(format!(
                        "missing close tag for `<{name}>`"
                    )));
                }
                Some(b'<') if self.starts_with("</") => {
                    self.pos += 2;
                    let close = self.read_name(text)?;
                    if close != name {
                        return Err(self.error(format!(
                            "close tag `</{close}>` does not match `<{name}>`"
                        )));
                    }
                    self.skip_whitespace();
                    self.expect(b'>')?;
                    break;
                }
                Some(b'<') => {
                    let (child_name, child) = self.parse_element(text)?;
                    insert_entry(&mut children, child_name, child);
                }
                Some(_) => {
                    let start = self.pos;
                    while matches!(self.peek(), Some(b) if b != b'<') {
                        self.bump();
                    }
                    body.push_str(&text[start..self.pos]);
                }
            }
        }

        Ok((name, assemble(attrs, children, body)))
    }
}

fn assemble(
    attrs: Map<String, Value>,
    children: Map<String, Value>,
    body: String,
) -> Value {
    // Whitespace around the text is prompt indentation, not content.
    let text = unescape_entities(body.trim());
    if children.is_empty() {
        // A leaf element collapses to its text. Attributes on a non-empty
        // leaf are schema decoration the model copied from the prompt
        // template (`<Thought type="string">`); the text wins over them.
        if attrs.is_empty() || !text.is_empty() {
            return Value::String(text);
        }
        return Value::Object(attrs);
    }
    let mut entries = attrs;
    entries.extend(children);
    Value::Object(entries)
}

fn insert_entry(entries: &mut Map<String, Value>, key: String, value: Value) {
    match entries.get_mut(&key) {
        None => {
            entries.insert(key, value);
        }
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
    }
}
