//! Lenient HTML/XML parsing for the selector backend.
//!
//! Real response bodies are rarely well-formed, so this parser never fails:
//! unknown constructs become text, stray closing tags are dropped, and
//! unclosed elements are closed implicitly at the end of input. The goal is
//! a usable element tree, not validation.

/// A node in the parsed tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// An element with attributes and children
    Element(Element),

    /// A run of character data, entities decoded
    Text(String),
}

/// One markup element.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Tag name, lowercased
    pub tag: String,

    /// Attributes in source order, names lowercased, values entity-decoded
    pub attributes: Vec<(String, String)>,

    /// Child nodes in source order
    pub children: Vec<Node>,
}

impl Element {
    /// Returns an attribute value by name (case-insensitive).
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Inner text: all descendant character data concatenated, with
    /// whitespace runs collapsed to single spaces and the ends trimmed.
    pub fn text(&self) -> String {
        let mut raw = String::new();
        collect_text(&self.children, &mut raw);
        collapse_whitespace(&raw)
    }

    /// Child elements, skipping text nodes.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// All descendant elements in document order, excluding `self`.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        collect_elements(&self.children, &mut out);
        out
    }
}

/// A parsed document: the forest of top-level nodes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    /// Top-level nodes in source order
    pub children: Vec<Node>,
}

impl Document {
    /// Parses markup text. Never fails; see the module docs for how
    /// malformed input degrades.
    pub fn parse(input: &str) -> Self {
        Parser::new(input).run()
    }

    /// All elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        let mut out = Vec::new();
        collect_elements(&self.children, &mut out);
        out.into_iter()
    }
}

/// Elements that never have children and need no closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose raw content is skipped entirely.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

struct Parser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    roots: Vec<Node>,
    stack: Vec<Element>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            roots: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn run(mut self) -> Document {
        let mut text_start = self.pos;

        while self.pos < self.bytes.len() {
            if self.bytes[self.pos] != b'<' {
                self.pos += 1;
                continue;
            }

            // Only a tag-looking '<' ends the current text run; a lone '<'
            // stays part of the text.
            let next = self.bytes.get(self.pos + 1).copied();
            let is_tag = matches!(next, Some(b) if b.is_ascii_alphabetic() || b == b'/' || b == b'!' || b == b'?');
            if !is_tag {
                self.pos += 1;
                continue;
            }

            self.flush_text(text_start, self.pos);
            match next {
                Some(b'/') => self.parse_closing_tag(),
                Some(b'!') | Some(b'?') => self.skip_declaration(),
                _ => self.parse_opening_tag(),
            }
            text_start = self.pos;
        }

        self.flush_text(text_start, self.bytes.len());

        // Implicitly close anything left open.
        while let Some(element) = self.stack.pop() {
            self.attach(Node::Element(element));
        }

        Document {
            children: self.roots,
        }
    }

    fn flush_text(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let text = &self.input[start..end];
        if text.is_empty() {
            return;
        }
        self.attach(Node::Text(decode_entities(text)));
    }

    fn attach(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }

    /// Skips `<!-- -->`, `<!DOCTYPE ...>` and `<? ... ?>` constructs.
    fn skip_declaration(&mut self) {
        if self.input[self.pos..].starts_with("<!--") {
            match self.input[self.pos + 4..].find("-->") {
                Some(offset) => self.pos += 4 + offset + 3,
                None => self.pos = self.bytes.len(),
            }
            return;
        }
        match self.input[self.pos..].find('>') {
            Some(offset) => self.pos += offset + 1,
            None => self.pos = self.bytes.len(),
        }
    }

    fn parse_closing_tag(&mut self) {
        self.pos += 2; // </
        let name = self.read_name();
        match self.input[self.pos..].find('>') {
            Some(offset) => self.pos += offset + 1,
            None => self.pos = self.bytes.len(),
        }

        if name.is_empty() {
            return;
        }

        // Close up to the matching open element; a stray closing tag with
        // no open counterpart is ignored.
        if let Some(depth) = self.stack.iter().rposition(|el| el.tag == name) {
            while self.stack.len() > depth {
                let element = match self.stack.pop() {
                    Some(el) => el,
                    None => break,
                };
                self.attach(Node::Element(element));
            }
        }
    }

    fn parse_opening_tag(&mut self) {
        self.pos += 1; // <
        let tag = self.read_name();

        let mut attributes = Vec::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            match self.bytes.get(self.pos) {
                None => break,
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(b'/') => {
                    self.pos += 1;
                    if self.bytes.get(self.pos) == Some(&b'>') {
                        self.pos += 1;
                        self_closing = true;
                        break;
                    }
                }
                Some(_) => {
                    if let Some(attr) = self.read_attribute() {
                        attributes.push(attr);
                    } else {
                        self.pos += 1;
                    }
                }
            }
        }

        if tag.is_empty() {
            return;
        }

        let element = Element {
            tag: tag.clone(),
            attributes,
            children: Vec::new(),
        };

        if self_closing || VOID_ELEMENTS.contains(&tag.as_str()) {
            self.attach(Node::Element(element));
            return;
        }

        if RAW_TEXT_ELEMENTS.contains(&tag.as_str()) {
            self.skip_raw_text(&tag);
            self.attach(Node::Element(element));
            return;
        }

        self.stack.push(element);
    }

    /// Skips the contents of `<script>`/`<style>` up to the matching close.
    fn skip_raw_text(&mut self, tag: &str) {
        let close = format!("</{}", tag);
        let rest = &self.input[self.pos..];
        match rest.to_ascii_lowercase().find(&close) {
            Some(offset) => {
                self.pos += offset;
                self.parse_closing_tag();
            }
            None => self.pos = self.bytes.len(),
        }
    }

    fn read_name(&mut self) -> String {
        let start = self.pos;
        while let Some(b) = self.bytes.get(self.pos) {
            if b.is_ascii_alphanumeric() || *b == b'-' || *b == b'_' || *b == b':' {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_ascii_lowercase()
    }

    fn read_attribute(&mut self) -> Option<(String, String)> {
        let name = self.read_name();
        if name.is_empty() {
            return None;
        }

        self.skip_whitespace();
        if self.bytes.get(self.pos) != Some(&b'=') {
            // Bare attribute, e.g. `disabled`.
            return Some((name, String::new()));
        }
        self.pos += 1;
        self.skip_whitespace();

        let value = match self.bytes.get(self.pos) {
            Some(b'"') | Some(b'\'') => {
                let quote = self.bytes[self.pos];
                self.pos += 1;
                let start = self.pos;
                while self.pos < self.bytes.len() && self.bytes[self.pos] != quote {
                    self.pos += 1;
                }
                let value = &self.input[start..self.pos];
                if self.pos < self.bytes.len() {
                    self.pos += 1;
                }
                value.to_string()
            }
            _ => {
                let start = self.pos;
                while let Some(b) = self.bytes.get(self.pos) {
                    if b.is_ascii_whitespace() || *b == b'>' || *b == b'/' {
                        break;
                    }
                    self.pos += 1;
                }
                self.input[start..self.pos].to_string()
            }
        };

        Some((name, decode_entities(&value)))
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.bytes.get(self.pos), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => collect_text(&el.children, out),
        }
    }
}

fn collect_elements<'a>(nodes: &'a [Node], out: &mut Vec<&'a Element>) {
    for node in nodes {
        if let Node::Element(el) = node {
            out.push(el);
            collect_elements(&el.children, out);
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space && !out.is_empty() {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Decodes the five standard entities. Numeric references pass through.
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
