//! CSS selector subset
//!
//! Supports what the results table lookups need: compound selectors made of
//! an optional tag, `#id`, `.class` and attribute matchers (`[a]`,
//! `[a="v"]`, `[a*="v"]`, `[a^="v"]`), joined by the descendant combinator.
//! CSS escapes in identifiers (`\3A `, `\:`) are decoded while parsing.

use crate::document::{Document, NodeId};
use crate::error::DomError;
use seqqc_model::rpt_key::unescape_ident;
use std::fmt;

/// Attribute test operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
    /// `[a]`
    Exists,
    /// `[a="v"]`
    Equals,
    /// `[a*="v"]`
    Contains,
    /// `[a^="v"]`
    StartsWith,
}

/// One attribute matcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrMatcher {
    /// Attribute name
    pub name: String,
    /// Operator
    pub op: AttrOp,
    /// Expected value (empty for `Exists`)
    pub value: String,
}

impl AttrMatcher {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(actual) = doc.attr(node, &self.name) else {
            return false;
        };
        match self.op {
            AttrOp::Exists => true,
            AttrOp::Equals => actual == self.value,
            AttrOp::Contains => !self.value.is_empty() && actual.contains(&self.value),
            AttrOp::StartsWith => !self.value.is_empty() && actual.starts_with(&self.value),
        }
    }
}

/// Compound selector: every part must match the same element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    /// Tag name, lower case
    pub tag: Option<String>,
    /// Decoded id
    pub id: Option<String>,
    /// Required classes
    pub classes: Vec<String>,
    /// Attribute matchers
    pub attributes: Vec<AttrMatcher>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.attributes.is_empty()
    }

    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        if let Some(tag) = &self.tag {
            if doc.tag(node) != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if doc.id(node) != Some(id.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|c| doc.has_class(node, c))
            && self.attributes.iter().all(|a| a.matches(doc, node))
    }
}

/// Parsed selector: compounds joined by descendant combinators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    compounds: Vec<Compound>,
    source: String,
}

impl Selector {
    /// Parse selector text
    ///
    /// # Errors
    /// `DomError::InvalidSelector` for empty input, unsupported syntax or
    /// unterminated attribute matchers.
    pub fn parse(text: &str) -> Result<Self, DomError> {
        let compounds = Parser::new(text).parse()?;
        Ok(Self {
            compounds,
            source: text.to_string(),
        })
    }

    /// Compounds from outermost to subject
    #[must_use]
    pub fn compounds(&self) -> &[Compound] {
        &self.compounds
    }

    /// Check if `node` matches; ancestors are searched for the outer compounds
    #[must_use]
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some((subject, outer)) = self.compounds.split_last() else {
            return false;
        };
        if !subject.matches(doc, node) {
            return false;
        }
        let mut current = doc.parent(node);
        for compound in outer.iter().rev() {
            loop {
                let Some(ancestor) = current else {
                    return false;
                };
                current = doc.parent(ancestor);
                if compound.matches(doc, ancestor) {
                    break;
                }
            }
        }
        true
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for Selector {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> DomError {
        DomError::selector(self.source, reason)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn parse(mut self) -> Result<Vec<Compound>, DomError> {
        let mut compounds = Vec::new();
        self.skip_whitespace();
        while self.peek().is_some() {
            compounds.push(self.compound()?);
            self.skip_whitespace();
        }
        if compounds.is_empty() {
            return Err(self.error("empty selector"));
        }
        Ok(compounds)
    }

    fn compound(&mut self) -> Result<Compound, DomError> {
        let mut compound = Compound::default();
        if self.peek() == Some('*') {
            self.pos += 1;
        } else if self.peek().is_some_and(is_ident_start) {
            compound.tag = Some(self.ident()?.to_ascii_lowercase());
        }
        while let Some(c) = self.peek() {
            match c {
                '#' => {
                    self.pos += 1;
                    if compound.id.is_some() {
                        return Err(self.error("more than one id"));
                    }
                    compound.id = Some(self.ident()?);
                }
                '.' => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                '[' => {
                    self.pos += 1;
                    compound.attributes.push(self.attribute()?);
                }
                c if c.is_whitespace() => break,
                ':' => return Err(self.error("pseudo-classes are not supported")),
                '>' | '+' | '~' | ',' => {
                    return Err(self.error(format!("combinator '{c}' is not supported")))
                }
                other => return Err(self.error(format!("unexpected '{other}'"))),
            }
        }
        if compound.is_empty() && self.chars.get(self.pos.saturating_sub(1)) != Some(&'*') {
            return Err(self.error("empty compound selector"));
        }
        Ok(compound)
    }

    /// Identifier with CSS escapes kept raw, then decoded
    fn ident(&mut self) -> Result<String, DomError> {
        let mut raw = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                raw.push(c);
                self.pos += 1;
                let mut hex_digits = 0;
                while hex_digits < 6 && self.peek().is_some_and(|h| h.is_ascii_hexdigit()) {
                    raw.push(self.chars[self.pos]);
                    self.pos += 1;
                    hex_digits += 1;
                }
                if hex_digits == 0 {
                    let escaped = self.peek().ok_or_else(|| self.error("dangling escape"))?;
                    raw.push(escaped);
                    self.pos += 1;
                } else if self.peek() == Some(' ') {
                    raw.push(' ');
                    self.pos += 1;
                }
            } else if is_ident_char(c) {
                raw.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        if raw.is_empty() {
            return Err(self.error("identifier expected"));
        }
        Ok(unescape_ident(&raw))
    }

    fn attribute(&mut self) -> Result<AttrMatcher, DomError> {
        self.skip_whitespace();
        let name = self.ident()?;
        self.skip_whitespace();
        let op = match self.peek() {
            Some(']') => {
                self.pos += 1;
                return Ok(AttrMatcher {
                    name,
                    op: AttrOp::Exists,
                    value: String::new(),
                });
            }
            Some('=') => {
                self.pos += 1;
                AttrOp::Equals
            }
            Some(c @ ('*' | '^')) => {
                self.pos += 1;
                if self.peek() != Some('=') {
                    return Err(self.error("'=' expected after attribute operator"));
                }
                self.pos += 1;
                if c == '*' {
                    AttrOp::Contains
                } else {
                    AttrOp::StartsWith
                }
            }
            _ => return Err(self.error("unsupported attribute operator")),
        };
        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let mut value = String::new();
                loop {
                    match self.peek() {
                        Some(c) if c == quote => {
                            self.pos += 1;
                            break;
                        }
                        Some(c) => {
                            value.push(c);
                            self.pos += 1;
                        }
                        None => return Err(self.error("unterminated attribute value")),
                    }
                }
                value
            }
            _ => self.ident()?,
        };
        self.skip_whitespace();
        if self.peek() != Some(']') {
            return Err(self.error("']' expected"));
        }
        self.pos += 1;
        Ok(AttrMatcher { name, op, value })
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || c == '\\' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}
