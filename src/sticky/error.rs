//! Errors from the sticky search interceptor.

use thiserror::Error;

use crate::selector::SelectorError;
use crate::watcher::WatchError;

#[derive(Error, Debug)]
pub enum StickyError {
    #[error("Invalid scope chip selector: {0}")]
    InvalidSelector(#[from] SelectorError),

    #[error("Failed to watch for the search input: {0}")]
    Watch(#[from] WatchError),

    #[error("Invalid URL pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Malformed query string: {0}")]
    Query(#[from] serde_urlencoded::de::Error),

    #[error("Failed to encode query string: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),
}
