//! CSS-selector subset for the `jquery` extraction backend.
//!
//! Supported grammar, the restricted form recorded scenarios actually use:
//!
//! ```text
//! selector := compound ((' ' | '>') compound)*
//! compound := ('*' | tag)? ('#' id | '.' class | '[' attr ('=' value)? ']')*
//! ```
//!
//! Whitespace between compounds is the descendant combinator, `>` the
//! direct-child combinator. Attribute values may be quoted with `'` or `"`.
//! Anything outside this grammar is a malformed query, which fails the
//! owning step, unlike a selector that simply matches nothing.

use super::dom::{Document, Element};
use std::fmt;

/// How one step relates to the elements matched so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    /// Any descendant (whitespace)
    Descendant,

    /// Direct child (`>`)
    Child,
}

/// An attribute predicate: `[name]` or `[name=value]`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrPredicate {
    name: String,
    value: Option<String>,
}

/// One compound selector: every listed condition must hold on the element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrPredicate>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.attrs.is_empty()
    }

    fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if !element.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class_attr = element.attr("class").unwrap_or("");
            let classes: Vec<&str> = class_attr.split_whitespace().collect();
            if !self.classes.iter().all(|c| classes.contains(&c.as_str())) {
                return false;
            }
        }
        self.attrs.iter().all(|pred| match &pred.value {
            Some(value) => element.attr(&pred.name) == Some(value.as_str()),
            None => element.attr(&pred.name).is_some(),
        })
    }
}

/// Error describing why a selector string failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorError {
    /// The offending selector text
    pub selector: String,
    /// Description of the problem
    pub message: String,
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid selector '{}': {}", self.selector, self.message)
    }
}

impl std::error::Error for SelectorError {}

/// A parsed selector, ready to run against parsed documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    steps: Vec<(Combinator, Compound)>,
}

impl Selector {
    /// Parses a selector string.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let error = |message: &str| SelectorError {
            selector: input.to_string(),
            message: message.to_string(),
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(error("selector is empty"));
        }

        let mut steps = Vec::new();
        let mut combinator = Combinator::Descendant;
        let chars: Vec<char> = trimmed.chars().collect();
        let mut pos = 0;

        while pos < chars.len() {
            // Combinator handling between compounds.
            if chars[pos].is_whitespace() || chars[pos] == '>' {
                let mut next = Combinator::Descendant;
                while pos < chars.len() && (chars[pos].is_whitespace() || chars[pos] == '>') {
                    if chars[pos] == '>' {
                        if next == Combinator::Child {
                            return Err(error("doubled '>' combinator"));
                        }
                        next = Combinator::Child;
                    }
                    pos += 1;
                }
                if pos == chars.len() {
                    return Err(error("selector ends on a combinator"));
                }
                combinator = next;
                if steps.is_empty() {
                    return Err(error("selector starts with a combinator"));
                }
            }

            let compound = parse_compound(&chars, &mut pos)
                .map_err(|message| error(&message))?;
            if compound.is_empty() {
                return Err(error("expected a tag, '#id', '.class' or '[attr]'"));
            }
            steps.push((combinator, compound));
            combinator = Combinator::Descendant;
        }

        Ok(Self { steps })
    }

    /// Runs the selector over a document, returning matches in document
    /// order without duplicates.
    pub fn select<'a>(&self, document: &'a Document) -> Vec<&'a Element> {
        let mut current: Vec<&Element> = document
            .elements()
            .filter(|el| self.steps[0].1.matches(el))
            .collect();

        for (combinator, compound) in &self.steps[1..] {
            let mut next: Vec<&Element> = Vec::new();
            for element in &current {
                let candidates: Vec<&Element> = match combinator {
                    Combinator::Descendant => element.descendants(),
                    Combinator::Child => element.child_elements().collect(),
                };
                for candidate in candidates {
                    if compound.matches(candidate)
                        && !next.iter().any(|seen| std::ptr::eq(*seen, candidate))
                    {
                        next.push(candidate);
                    }
                }
            }
            current = next;
        }

        current
    }
}

fn parse_compound(chars: &[char], pos: &mut usize) -> Result<Compound, String> {
    let mut compound = Compound::default();

    // Optional leading tag or universal selector.
    if *pos < chars.len() && chars[*pos] == '*' {
        *pos += 1;
        compound.tag = None;
    } else if *pos < chars.len() && (chars[*pos].is_ascii_alphabetic() || chars[*pos] == '_') {
        compound.tag = Some(read_ident(chars, pos));
    }

    loop {
        match chars.get(*pos) {
            Some('#') => {
                *pos += 1;
                let id = read_ident(chars, pos);
                if id.is_empty() {
                    return Err("missing id after '#'".to_string());
                }
                compound.id = Some(id);
            }
            Some('.') => {
                *pos += 1;
                let class = read_ident(chars, pos);
                if class.is_empty() {
                    return Err("missing class after '.'".to_string());
                }
                compound.classes.push(class);
            }
            Some('[') => {
                *pos += 1;
                compound.attrs.push(parse_attr_predicate(chars, pos)?);
            }
            Some(c) if c.is_whitespace() || *c == '>' => break,
            None => break,
            Some(c) => return Err(format!("unexpected character '{}'", c)),
        }
    }

    Ok(compound)
}

fn parse_attr_predicate(chars: &[char], pos: &mut usize) -> Result<AttrPredicate, String> {
    let name = read_ident(chars, pos);
    if name.is_empty() {
        return Err("missing attribute name in '[...]'".to_string());
    }

    match chars.get(*pos) {
        Some(']') => {
            *pos += 1;
            Ok(AttrPredicate { name, value: None })
        }
        Some('=') => {
            *pos += 1;
            let value = read_attr_value(chars, pos)?;
            if chars.get(*pos) != Some(&']') {
                return Err("missing ']' after attribute value".to_string());
            }
            *pos += 1;
            Ok(AttrPredicate {
                name,
                value: Some(value),
            })
        }
        _ => Err("expected '=' or ']' in attribute selector".to_string()),
    }
}

fn read_attr_value(chars: &[char], pos: &mut usize) -> Result<String, String> {
    match chars.get(*pos) {
        Some('"') | Some('\'') => {
            let quote = chars[*pos];
            *pos += 1;
            let start = *pos;
            while *pos < chars.len() && chars[*pos] != quote {
                *pos += 1;
            }
            if *pos == chars.len() {
                return Err("unterminated quoted attribute value".to_string());
            }
            let value: String = chars[start..*pos].iter().collect();
            *pos += 1;
            Ok(value)
        }
        _ => {
            let start = *pos;
            while *pos < chars.len() && chars[*pos] != ']' {
                *pos += 1;
            }
            Ok(chars[start..*pos].iter().collect())
        }
    }
}

fn read_ident(chars: &[char], pos: &mut usize) -> String {
    let start = *pos;
    while let Some(c) = chars.get(*pos) {
        if c.is_ascii_alphanumeric() || *c == '-' || *c == '_' {
            *pos += 1;
        } else {
            break;
        }
    }
    chars[start..*pos].iter().collect::<String>().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::parse(
            r#"<html><body>
                <div id="main" class="content wide">
                    <a href="/first" class="link">First</a>
                    <span><a href="/nested" class="link">Nested</a></span>
                </div>
                <div class="sidebar">
                    <a href="/side" data-role="nav">Side</a>
                </div>
            </body></html>"#,
        )
    }

    fn texts(selector: &str, document: &Document) -> Vec<String> {
        Selector::parse(selector)
            .unwrap()
            .select(document)
            .iter()
            .map(|el| el.text())
            .collect()
    }

    #[test]
    fn test_tag_selector() {
        let d = doc();
        assert_eq!(texts("a", &d), vec!["First", "Nested", "Side"]);
    }

    #[test]
    fn test_id_selector() {
        let d = doc();
        let matches = Selector::parse("#main").unwrap().select(&d);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].tag, "div");
    }

    #[test]
    fn test_class_selector() {
        let d = doc();
        assert_eq!(texts(".link", &d), vec!["First", "Nested"]);
        assert_eq!(texts("div.sidebar", &d), vec!["Side"]);
    }

    #[test]
    fn test_multi_class_compound() {
        let d = doc();
        let matches = Selector::parse("div.content.wide").unwrap().select(&d);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].attr("id"), Some("main"));
    }

    #[test]
    fn test_attribute_selectors() {
        let d = doc();
        assert_eq!(texts("a[data-role]", &d), vec!["Side"]);
        assert_eq!(texts(r#"a[href="/nested"]"#, &d), vec!["Nested"]);
        assert_eq!(texts("a[href='/first']", &d), vec!["First"]);
        assert_eq!(texts("a[href=/side]", &d), vec!["Side"]);
    }

    #[test]
    fn test_descendant_combinator() {
        let d = doc();
        assert_eq!(texts("#main a", &d), vec!["First", "Nested"]);
    }

    #[test]
    fn test_child_combinator() {
        let d = doc();
        assert_eq!(texts("#main > a", &d), vec!["First"]);
        assert_eq!(texts("#main>a", &d), vec!["First"]);
    }

    #[test]
    fn test_universal_selector() {
        let d = Document::parse("<ul><li>a</li><li>b</li></ul>");
        assert_eq!(texts("ul > *", &d), vec!["a", "b"]);
    }

    #[test]
    fn test_no_match_is_empty() {
        let d = doc();
        assert!(texts("table", &d).is_empty());
        assert!(texts("#missing a", &d).is_empty());
    }

    #[test]
    fn test_nested_descendants_deduplicated() {
        let d = Document::parse("<div><div><p>deep</p></div></div>");
        assert_eq!(texts("div p", &d), vec!["deep"]);
    }

    #[test]
    fn test_malformed_selectors() {
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("  ").is_err());
        assert!(Selector::parse("div >").is_err());
        assert!(Selector::parse("> div").is_err());
        assert!(Selector::parse("div > > a").is_err());
        assert!(Selector::parse("a[href").is_err());
        assert!(Selector::parse("a[]").is_err());
        assert!(Selector::parse("a[href='x").is_err());
        assert!(Selector::parse("div..x").is_err());
        assert!(Selector::parse("a:hover").is_err());
    }

    #[test]
    fn test_tag_match_is_case_insensitive() {
        let d = Document::parse("<DIV><P>x</P></DIV>");
        assert_eq!(texts("div p", &d), vec!["x"]);
    }
}
