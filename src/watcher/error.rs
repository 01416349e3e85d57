//! Error types for the element watcher.

use thiserror::Error;

use crate::dom::DomError;
use crate::selector::SelectorError;

/// Errors from setting up or driving watchers.
///
/// A selector that matches nothing is not an error; neither is a closed
/// shadow root hiding content.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Invalid selector: {0}")]
    InvalidSelector(#[from] SelectorError),

    #[error("Watch root belongs to a different document")]
    ForeignRoot,

    #[error("Cannot observe root: {0}")]
    Observe(#[from] DomError),

    #[error("No tokio runtime available for {operation}")]
    NoRuntime { operation: &'static str },

    #[error("Watch group entry {index} failed: {source}")]
    GroupMember {
        index: usize,
        #[source]
        source: Box<WatchError>,
    },
}
