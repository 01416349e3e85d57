//! Element-appearance watcher.
//!
//! Reports when elements matching a selector list appear below a root,
//! whether already present or rendered later, including inside open shadow
//! roots.
//!
//! # Architecture
//!
//! ```text
//! observe / observe_all
//!         |
//!   ElementWatcher (one per WatchConfig)
//!     - initial synchronous query
//!     - MutationObserver on the root
//!     - Debouncer (one pending check at most)
//!         |
//!   batch -> debounce -> query_first -> on_element -> Flow
//!                                                    |
//!                                     Continue: keep observing
//!                                     Stop: disconnect, cancel, Stopped
//!
//! WatchGroup -> Cleanup (idempotent, bindable to a CancellationToken)
//! ```

mod cleanup;
mod config;
mod debouncer;
mod element;
mod error;
mod group;
mod handler;

pub use cleanup::Cleanup;
pub use config::{DEFAULT_DEBOUNCE, WatchConfig, WatchConfigBuilder};
pub use debouncer::Debouncer;
pub use element::{ElementWatcher, Phase};
pub use error::WatchError;
pub use group::WatchGroup;
pub use handler::Flow;

use crate::dom::Document;

/// Watch for one selector list. The returned handle stops the watch.
pub fn observe(doc: &Document, config: WatchConfig) -> Result<Cleanup, WatchError> {
    Ok(ElementWatcher::start(doc, config)?.cleanup())
}

/// Watch several independent selector lists under one cleanup.
pub fn observe_all(
    doc: &Document,
    configs: impl IntoIterator<Item = WatchConfig>,
) -> Result<Cleanup, WatchError> {
    Ok(WatchGroup::start(doc, configs)?.cleanup())
}
