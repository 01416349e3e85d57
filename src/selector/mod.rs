//! CSS selector parsing and matching.
//!
//! A [`Selector`] is one selector string (which may itself be a
//! comma-separated group). A [`SelectorList`] is an ordered fallback list of
//! selectors: the first selector with any match wins.

mod error;
mod matcher;
mod parser;

use std::fmt;
use std::str::FromStr;

pub use error::SelectorError;

use crate::query::{ShadowMode, TreeView};
use parser::Complex;

/// A parsed CSS selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    groups: Vec<Complex>,
}

impl Selector {
    /// Parse a selector string.
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let groups = parser::parse_selector(source)?;
        Ok(Self {
            source: source.trim().to_string(),
            groups,
        })
    }

    /// The selector text as written (trimmed).
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Check whether `node` matches this selector.
    ///
    /// Non-element nodes never match.
    pub fn matches<V: TreeView>(&self, view: &V, node: V::NodeId, mode: ShadowMode) -> bool {
        self.groups
            .iter()
            .any(|complex| matcher::matches_complex(view, node, complex, mode))
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Raw selector input: one selector or an ordered fallback sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorInput {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for SelectorInput {
    fn from(value: &str) -> Self {
        SelectorInput::One(value.to_string())
    }
}

impl From<String> for SelectorInput {
    fn from(value: String) -> Self {
        SelectorInput::One(value)
    }
}

impl From<Vec<String>> for SelectorInput {
    fn from(value: Vec<String>) -> Self {
        SelectorInput::Many(value)
    }
}

impl From<Vec<&str>> for SelectorInput {
    fn from(value: Vec<&str>) -> Self {
        SelectorInput::Many(value.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for SelectorInput {
    fn from(value: &[&str]) -> Self {
        SelectorInput::Many(value.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for SelectorInput {
    fn from(value: [&str; N]) -> Self {
        SelectorInput::Many(value.iter().map(|s| s.to_string()).collect())
    }
}

/// Ordered list of fallback selectors.
///
/// Evaluation is sequential: the first selector that matches anything in
/// scope wins, even when a later selector's match appears earlier in
/// document order. Selectors are never unioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<Selector>,
}

impl SelectorList {
    /// Parse one selector or a fallback sequence. Every entry must parse.
    pub fn parse(input: impl Into<SelectorInput>) -> Result<Self, SelectorError> {
        let selectors = match input.into() {
            SelectorInput::One(source) => vec![Selector::parse(&source)?],
            SelectorInput::Many(sources) => sources
                .iter()
                .map(|source| Selector::parse(source))
                .collect::<Result<Vec<_>, _>>()?,
        };

        if selectors.is_empty() {
            return Err(SelectorError::EmptyList);
        }
        Ok(Self { selectors })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Selector> {
        self.selectors.iter()
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

impl From<Selector> for SelectorList {
    fn from(selector: Selector) -> Self {
        Self {
            selectors: vec![selector],
        }
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.selectors.iter().map(Selector::as_str).collect();
        write!(f, "[{}]", joined.join(" | "))
    }
}
