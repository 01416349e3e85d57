//! Single-element watcher.
//!
//! A watcher runs one synchronous query on start. If that does not end the
//! watch it attaches a mutation observer to its root and funnels every batch
//! through a [`Debouncer`]; each debounced firing re-runs the query.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex};

use crate::dom::{Document, Element, MutationObserver, MutationRecord, Node, ObserveOptions};
use crate::query::{self, ShadowMode};
use crate::selector::SelectorList;
use crate::{debug_event, log_event};

use super::cleanup::Cleanup;
use super::config::WatchConfig;
use super::debouncer::Debouncer;
use super::error::WatchError;
use super::handler::{ElementHandler, Flow};

/// Lifecycle phase of an [`ElementWatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Created, nothing queried yet.
    Init,
    /// Running the initial synchronous query.
    Scanning,
    /// Observing, no match reported yet.
    Waiting,
    /// At least one match reported; still observing.
    MatchedContinue,
    /// Terminal. No further callbacks.
    Stopped,
}

#[derive(Debug)]
struct WatchState {
    phase: Phase,
    observer: Option<MutationObserver>,
    matches: u64,
}

struct WatcherInner {
    root: Node,
    selectors: SelectorList,
    on_element: ElementHandler,
    mode: ShadowMode,
    /// Carries the record count of the newest batch.
    debouncer: Debouncer<usize>,
    state: Mutex<WatchState>,
    /// Held while the handler runs; `stop` waits on it.
    dispatching: ReentrantMutex<()>,
}

/// Watches one root for elements matching a selector list.
///
/// Cloning yields another handle to the same watcher.
#[derive(Clone)]
pub struct ElementWatcher {
    inner: Arc<WatcherInner>,
}

impl ElementWatcher {
    /// Create a watcher and run its initial query.
    ///
    /// When the target is already present the handler runs before this
    /// returns. A handler returning [`Flow::Stop`] at that point leaves the
    /// watcher stopped without ever attaching an observer.
    pub fn start(doc: &Document, config: WatchConfig) -> Result<Self, WatchError> {
        let root = match config.root {
            Some(root) => {
                doc.ensure_same(root.document())
                    .map_err(|_| WatchError::ForeignRoot)?;
                root
            }
            None => doc.body().into(),
        };
        let mode = ShadowMode::from(config.support_shadow_dom);
        let delay = config.debounce;

        let inner = Arc::new_cyclic(|weak: &Weak<WatcherInner>| {
            let weak = weak.clone();
            WatcherInner {
                root,
                selectors: config.selectors,
                on_element: config.on_element,
                mode,
                debouncer: Debouncer::new(delay, move |batch| {
                    if let Some(inner) = weak.upgrade() {
                        inner.on_debounced(batch);
                    }
                }),
                state: Mutex::new(WatchState {
                    phase: Phase::Init,
                    observer: None,
                    matches: 0,
                }),
                dispatching: ReentrantMutex::new(()),
            }
        });

        debug_event!(
            "watcher",
            "start",
            "{} (debounce {:?}, shadow {:?})",
            inner.selectors,
            delay,
            mode
        );
        inner.initial_scan()?;
        Ok(Self { inner })
    }

    pub fn phase(&self) -> Phase {
        self.inner.state.lock().phase
    }

    /// Number of times the handler has been invoked.
    pub fn match_count(&self) -> u64 {
        self.inner.state.lock().matches
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.is_stopped()
    }

    /// Whether a mutation observer is attached.
    pub fn is_observing(&self) -> bool {
        self.inner.state.lock().observer.is_some()
    }

    /// Whether a debounced re-check is waiting to fire.
    pub fn has_pending_check(&self) -> bool {
        self.inner.debouncer.has_pending()
    }

    pub fn selectors(&self) -> &SelectorList {
        &self.inner.selectors
    }

    pub fn root(&self) -> &Node {
        &self.inner.root
    }

    /// Stop the watcher. Returns `false` if it was already stopped.
    pub fn stop(&self) -> bool {
        self.inner.stop("cleanup")
    }

    /// Idempotent handle that stops this watcher.
    ///
    /// The handle only holds a weak reference: a running watcher is kept
    /// alive by its observer registration, a stopped one needs nothing.
    pub fn cleanup(&self) -> Cleanup {
        let watcher = self.downgrade();
        Cleanup::new(move || {
            watcher.stop("cleanup");
        })
    }

    pub(crate) fn downgrade(&self) -> WeakWatcher {
        WeakWatcher(Arc::downgrade(&self.inner))
    }
}

/// Non-owning handle used by cleanups.
#[derive(Clone)]
pub(crate) struct WeakWatcher(Weak<WatcherInner>);

impl WeakWatcher {
    /// Stop the watcher if it is still alive. Returns whether this call stopped it.
    pub(crate) fn stop(&self, reason: &str) -> bool {
        self.0.upgrade().is_some_and(|inner| inner.stop(reason))
    }
}

impl std::fmt::Debug for ElementWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("ElementWatcher")
            .field("selectors", &self.inner.selectors)
            .field("phase", &state.phase)
            .field("matches", &state.matches)
            .field("observer", &state.observer)
            .finish_non_exhaustive()
    }
}

impl WatcherInner {
    fn is_stopped(&self) -> bool {
        self.state.lock().phase == Phase::Stopped
    }

    fn initial_scan(self: &Arc<Self>) -> Result<(), WatchError> {
        self.state.lock().phase = Phase::Scanning;

        if let Some(element) = query::query_first(&self.root, &self.selectors, self.mode) {
            if self.dispatch(&element) == Flow::Stop {
                return Ok(());
            }
        }
        self.attach_observer()
    }

    fn attach_observer(self: &Arc<Self>) -> Result<(), WatchError> {
        let watcher = Arc::clone(self);
        let observer = MutationObserver::new(move |records| watcher.on_mutations(records));
        let options =
            ObserveOptions::subtree_changes().with_shadow_trees(self.mode == ShadowMode::Pierce);
        observer.observe(&self.root, options)?;

        let mut state = self.state.lock();
        if state.phase == Phase::Stopped {
            drop(state);
            observer.disconnect();
            return Ok(());
        }
        if state.phase == Phase::Scanning {
            state.phase = Phase::Waiting;
        }
        state.observer = Some(observer);
        Ok(())
    }

    fn on_mutations(&self, records: Vec<MutationRecord>) {
        if self.is_stopped() {
            return;
        }
        debug_event!("watcher", "batch", "{} record(s) for {}", records.len(), self.selectors);
        if let Err(e) = self.debouncer.schedule(records.len()) {
            tracing::warn!("[watcher] dropped mutation batch for {}: {e}", self.selectors);
        }
    }

    fn on_debounced(&self, batch: usize) {
        if self.is_stopped() {
            return;
        }
        debug_event!("watcher", "check", "{} after batch of {batch}", self.selectors);
        if let Some(element) = query::query_first(&self.root, &self.selectors, self.mode) {
            self.dispatch(&element);
        }
    }

    /// Run the handler for `element` unless stopped, then apply its decision.
    fn dispatch(&self, element: &Element) -> Flow {
        let _dispatching = self.dispatching.lock();
        {
            let mut state = self.state.lock();
            if state.phase == Phase::Stopped {
                return Flow::Stop;
            }
            state.matches += 1;
        }

        let flow = (self.on_element)(element);
        match flow {
            Flow::Stop => {
                self.stop("handler requested stop");
            }
            Flow::Continue => {
                let mut state = self.state.lock();
                if state.phase != Phase::Stopped {
                    state.phase = Phase::MatchedContinue;
                }
            }
        }
        flow
    }

    /// Stop permanently. A handler running on another thread finishes first.
    fn stop(&self, reason: &str) -> bool {
        let _dispatching = self.dispatching.lock();
        let observer = {
            let mut state = self.state.lock();
            if state.phase == Phase::Stopped {
                return false;
            }
            state.phase = Phase::Stopped;
            state.observer.take()
        };

        if let Some(observer) = observer {
            observer.disconnect();
        }
        self.debouncer.cancel();
        log_event!("watcher", "stopped", "{} ({reason})", self.selectors);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;
    use tokio_util::sync::CancellationToken;

    fn counter() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (Arc::clone(&calls), calls)
    }

    #[test]
    fn test_present_target_stops_without_observer() {
        let doc = Document::new();
        let modal = doc.create_element("div");
        modal.set_attribute("class", "modal");
        doc.body().append_child(&modal).unwrap();

        let (calls, sink) = counter();
        let config = WatchConfig::builder(".modal", move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
            true
        })
        .build()
        .unwrap();

        let watcher = ElementWatcher::start(&doc, config).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(watcher.phase(), Phase::Stopped);
        assert!(!watcher.is_observing());
        assert_eq!(doc.observer_count(), 0);
    }

    #[test]
    fn test_missing_target_waits_with_observer() {
        let doc = Document::new();
        let config = WatchConfig::builder(".later", |_| ()).build().unwrap();
        let watcher = ElementWatcher::start(&doc, config).unwrap();

        assert_eq!(watcher.phase(), Phase::Waiting);
        assert!(watcher.is_observing());
        assert_eq!(doc.observer_count(), 1);
        assert!(format!("{watcher:?}").contains("MutationObserver"));

        assert!(watcher.stop());
        assert!(!watcher.stop());
        assert_eq!(doc.observer_count(), 0);
    }

    #[test]
    fn test_foreign_root_rejected() {
        let doc = Document::new();
        let other = Document::new();
        let config = WatchConfig::builder("p", |_| ())
            .root(other.body())
            .build()
            .unwrap();
        assert!(matches!(
            ElementWatcher::start(&doc, config),
            Err(WatchError::ForeignRoot)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_continue_reports_every_debounced_match() {
        let doc = Document::new();
        let (calls, sink) = counter();
        let config = WatchConfig::builder("li", move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        })
        .debounce_ms(50)
        .build()
        .unwrap();
        let watcher = ElementWatcher::start(&doc, config).unwrap();

        doc.body().append_child(&doc.create_element("li")).unwrap();
        sleep(Duration::from_millis(60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(watcher.phase(), Phase::MatchedContinue);

        doc.body().append_child(&doc.create_element("li")).unwrap();
        sleep(Duration::from_millis(60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(watcher.match_count(), 2);
        assert!(watcher.is_observing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_pending_check() {
        let doc = Document::new();
        let (calls, sink) = counter();
        let config = WatchConfig::builder("li", move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        })
        .debounce_ms(50)
        .build()
        .unwrap();
        let watcher = ElementWatcher::start(&doc, config).unwrap();

        doc.body().append_child(&doc.create_element("li")).unwrap();
        sleep(Duration::from_millis(10)).await;
        assert!(watcher.has_pending_check());

        watcher.stop();
        assert!(!watcher.has_pending_check());
        sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lifecycle_binding_releases_self_stopped_watcher() {
        let doc = Document::new();
        let marker = Arc::new(());
        let held = Arc::clone(&marker);
        let config = WatchConfig::builder("li", move |_| {
            let _ = &held;
            true
        })
        .debounce_ms(10)
        .build()
        .unwrap();

        let cleanup = ElementWatcher::start(&doc, config).unwrap().cleanup();
        let token = CancellationToken::new();
        cleanup.bind_to(&token).unwrap();
        assert_eq!(Arc::strong_count(&marker), 2);

        doc.body().append_child(&doc.create_element("li")).unwrap();
        sleep(Duration::from_millis(50)).await;

        // Stopped by its handler while the token is still live
        assert_eq!(doc.observer_count(), 0);
        assert_eq!(Arc::strong_count(&marker), 1);
        assert!(!cleanup.is_done());
        assert!(cleanup.cleanup());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stop_waits_for_running_handler() {
        let doc = Document::new();
        let entered = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let (on_enter, on_finish) = (Arc::clone(&entered), Arc::clone(&finished));
        let config = WatchConfig::builder("li", move |_| {
            on_enter.store(true, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(50));
            on_finish.store(true, Ordering::SeqCst);
        })
        .debounce(Duration::ZERO)
        .build()
        .unwrap();
        let watcher = ElementWatcher::start(&doc, config).unwrap();

        doc.body().append_child(&doc.create_element("li")).unwrap();
        while !entered.load(Ordering::SeqCst) {
            sleep(Duration::from_millis(1)).await;
        }

        assert!(watcher.stop());
        assert!(
            finished.load(Ordering::SeqCst),
            "stop returned while the handler was still running"
        );
    }
}
