//! Several independent watchers under one cleanup.

use crate::dom::Document;

use super::cleanup::Cleanup;
use super::config::WatchConfig;
use super::element::ElementWatcher;
use super::error::WatchError;

/// Ordered set of watchers created together.
#[derive(Debug, Clone, Default)]
pub struct WatchGroup {
    watchers: Vec<ElementWatcher>,
}

impl WatchGroup {
    /// Start one watcher per config, in order.
    ///
    /// If an entry fails, the members already started are stopped and the
    /// error names the failing index.
    pub fn start(
        doc: &Document,
        configs: impl IntoIterator<Item = WatchConfig>,
    ) -> Result<Self, WatchError> {
        let mut watchers = Vec::new();
        for (index, config) in configs.into_iter().enumerate() {
            match ElementWatcher::start(doc, config) {
                Ok(watcher) => watchers.push(watcher),
                Err(e) => {
                    for watcher in &watchers {
                        watcher.stop();
                    }
                    return Err(WatchError::GroupMember {
                        index,
                        source: Box::new(e),
                    });
                }
            }
        }
        crate::debug_event!("group", "started", "{} watcher(s)", watchers.len());
        Ok(Self { watchers })
    }

    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }

    pub fn watchers(&self) -> &[ElementWatcher] {
        &self.watchers
    }

    /// Members that have not stopped yet.
    pub fn active_count(&self) -> usize {
        self.watchers.iter().filter(|w| !w.is_stopped()).count()
    }

    /// One handle that stops every member; members that already stopped are skipped.
    pub fn cleanup(&self) -> Cleanup {
        let watchers: Vec<_> = self.watchers.iter().map(ElementWatcher::downgrade).collect();
        Cleanup::new(move || {
            let stopped = watchers
                .iter()
                .filter(|w| w.stop("group cleanup"))
                .count();
            crate::debug_event!(
                "group",
                "cleanup",
                "stopped {stopped} of {} watcher(s)",
                watchers.len()
            );
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_member_stops_started_ones() {
        let doc = Document::new();
        let other = Document::new();
        let configs = vec![
            WatchConfig::builder(".a", |_| ()).build().unwrap(),
            WatchConfig::builder(".b", |_| ())
                .root(other.body())
                .build()
                .unwrap(),
        ];

        let err = WatchGroup::start(&doc, configs).unwrap_err();
        assert!(matches!(err, WatchError::GroupMember { index: 1, .. }));
        assert_eq!(doc.observer_count(), 0);
    }

    #[test]
    fn test_group_cleanup_skips_self_stopped_members() {
        let doc = Document::new();
        doc.body().append_child(&doc.create_element("nav")).unwrap();
        let configs = vec![
            WatchConfig::builder("nav", |_| true).build().unwrap(),
            WatchConfig::builder("footer", |_| ()).build().unwrap(),
        ];

        let group = WatchGroup::start(&doc, configs).unwrap();
        assert_eq!(group.len(), 2);
        assert_eq!(group.active_count(), 1);

        let cleanup = group.cleanup();
        assert!(cleanup.cleanup());
        assert_eq!(group.active_count(), 0);
        assert_eq!(doc.observer_count(), 0);
    }
}
