//! Detect elements as they appear in a document.
//!
//! ```no_run
//! use domwatch::{Document, WatchConfig, observe};
//!
//! # async fn run() -> Result<(), domwatch::WatchError> {
//! let doc = Document::new();
//! let cleanup = observe(
//!     &doc,
//!     WatchConfig::builder([".modal", "#fallback"], |element| {
//!         println!("found {element:?}");
//!         true
//!     })
//!     .build()?,
//! )?;
//! cleanup.cleanup();
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod dom;
pub mod logging;
pub mod query;
pub mod selector;
pub mod sticky;
pub mod watcher;

pub use config::{LoggingConfig, Settings, StickySettings, WatchSettings};
pub use dom::{Document, DomError, Element, Node, ShadowRoot, ShadowRootMode};
pub use query::{ShadowMode, query_all, query_first};
pub use selector::{Selector, SelectorError, SelectorList};
pub use sticky::{PageHost, StickySearch, rewrite_search_url};
pub use watcher::{
    Cleanup, ElementWatcher, Flow, Phase, WatchConfig, WatchError, WatchGroup, observe,
    observe_all,
};
