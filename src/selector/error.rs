//! Error types for selector parsing.

use thiserror::Error;

/// Errors produced while parsing a CSS selector.
///
/// Positions are character offsets into the original selector text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("Selector list is empty")]
    EmptyList,

    #[error("Empty selector in '{selector}'")]
    Empty { selector: String },

    #[error("Unexpected '{found}' at position {position} in selector '{selector}'")]
    Unexpected {
        selector: String,
        position: usize,
        found: char,
    },

    #[error("Unexpected end of selector '{selector}': expected {expected}")]
    UnexpectedEnd {
        selector: String,
        expected: &'static str,
    },

    #[error("Combinator without a right-hand side in selector '{selector}'")]
    DanglingCombinator { selector: String },

    #[error("Unsupported syntax '{syntax}' in selector '{selector}'")]
    Unsupported { selector: String, syntax: String },
}
