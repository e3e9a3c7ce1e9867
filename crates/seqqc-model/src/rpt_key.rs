//! Rpt keys and the DOM ids/selectors built from them
//!
//! A rpt key identifies a lane (`run:position`) or a library within a lane
//! (`run:position:tag`). Summary table rows carry the key in their id as
//! `rpt_key:<key>`; selectors need the `:` separators escaped.

use crate::error::ModelError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix of every summary table row id that carries a rpt key
pub const ID_PREFIX: &str = "rpt_key:";

/// CSS escape sequence for `:` in an id selector
pub const COLON_ESCAPE: &str = "\\3A ";

static LANE_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+:[0-9]+$").expect("valid regex"));

/// Parsed rpt key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RptKey {
    /// Run id
    pub id_run: u64,
    /// Lane position
    pub position: u32,
    /// Tag index, present for libraries only
    pub tag_index: Option<u32>,
}

impl RptKey {
    /// Lane-level key
    #[inline]
    #[must_use]
    pub fn lane(id_run: u64, position: u32) -> Self {
        Self {
            id_run,
            position,
            tag_index: None,
        }
    }

    /// Library-level key
    #[inline]
    #[must_use]
    pub fn library(id_run: u64, position: u32, tag_index: u32) -> Self {
        Self {
            id_run,
            position,
            tag_index: Some(tag_index),
        }
    }

    /// Check if the key addresses a whole lane
    #[inline]
    #[must_use]
    pub fn is_lane(&self) -> bool {
        self.tag_index.is_none()
    }

    /// Key of the lane this key belongs to
    #[inline]
    #[must_use]
    pub fn lane_key(&self) -> RptKey {
        RptKey::lane(self.id_run, self.position)
    }

    /// DOM id of the summary table row for this key
    #[must_use]
    pub fn row_id(&self) -> String {
        format!("{ID_PREFIX}{self}")
    }
}

impl fmt::Display for RptKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag_index {
            Some(tag) => write!(f, "{}:{}:{}", self.id_run, self.position, tag),
            None => write!(f, "{}:{}", self.id_run, self.position),
        }
    }
}

impl FromStr for RptKey {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ModelError::Format(format!("Rpt key {s}"));
        let parts: Vec<&str> = s.split(':').collect();
        if !(2..=3).contains(&parts.len())
            || parts
                .iter()
                .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(malformed());
        }
        let id_run = parts[0].parse().map_err(|_| malformed())?;
        let position = parts[1].parse().map_err(|_| malformed())?;
        let tag_index = match parts.get(2) {
            Some(tag) => Some(tag.parse().map_err(|_| malformed())?),
            None => None,
        };
        Ok(Self {
            id_run,
            position,
            tag_index,
        })
    }
}

impl TryFrom<String> for RptKey {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RptKey> for String {
    fn from(key: RptKey) -> Self {
        key.to_string()
    }
}

/// Strip the `rpt_key:` prefix from a row id
///
/// # Errors
/// `ModelError::Format` if the prefix is absent or the remainder is not a
/// well-formed rpt key.
pub fn rpt_key_from_id(id: &str) -> Result<RptKey, ModelError> {
    id.strip_prefix(ID_PREFIX)
        .ok_or_else(|| ModelError::Format(format!("Id {id}")))?
        .parse()
}

/// Check if a key has exactly two numeric segments
#[must_use]
pub fn is_lane_key(key: &str) -> bool {
    LANE_KEY.is_match(key)
}

/// Escape a DOM id for use in an id selector
#[must_use]
pub fn escape_id(id: &str) -> String {
    id.replace(':', COLON_ESCAPE)
}

/// Decode CSS escapes (`\3A `, `\:`) back into plain text
///
/// A hex escape consumes up to six hex digits and one optional trailing
/// space; any other escaped character stands for itself.
#[must_use]
pub fn unescape_ident(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let mut hex = String::new();
        while hex.len() < 6 {
            match chars.peek() {
                Some(h) if h.is_ascii_hexdigit() => {
                    hex.push(*h);
                    chars.next();
                }
                _ => break,
            }
        }
        if hex.is_empty() {
            if let Some(next) = chars.next() {
                out.push(next);
            }
            continue;
        }
        if chars.peek() == Some(&' ') {
            chars.next();
        }
        let decoded = u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        out.push(decoded);
    }
    out
}

/// Id selector for a DOM id (`#` plus the escaped id)
#[must_use]
pub fn build_id_selector(id: &str) -> String {
    format!("#{}", escape_id(id))
}

/// Id selector for the summary table row of a rpt key
#[must_use]
pub fn build_id_selector_from_rpt_key(key: &str) -> String {
    build_id_selector(&format!("{ID_PREFIX}{key}"))
}

/// Recover the DOM id from an id selector built by [`build_id_selector`]
///
/// # Errors
/// `ModelError::Format` if the selector does not start with `#`.
pub fn id_from_selector(selector: &str) -> Result<String, ModelError> {
    selector
        .strip_prefix('#')
        .map(unescape_ident)
        .ok_or_else(|| ModelError::Format(format!("Selector {selector}")))
}
