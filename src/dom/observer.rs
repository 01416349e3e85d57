//! Mutation observers with batched, asynchronous delivery.
//!
//! Records are queued on the observer as mutations happen. The first record
//! of a batch spawns a delivery task on the current tokio runtime; the task
//! yields once before draining the queue, so every mutation made in the same
//! synchronous turn lands in a single callback invocation.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use super::{DocumentInner, DomError, Node, NodeId};

/// What changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    ChildList {
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    Attributes {
        name: String,
        old_value: Option<String>,
    },
}

/// A single observed change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// Parent for child-list changes, the element for attribute changes.
    pub target: NodeId,
    pub kind: MutationKind,
}

/// Which changes an observer registration reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObserveOptions {
    pub child_list: bool,
    pub attributes: bool,
    pub subtree: bool,
    /// Extend `subtree` into open shadow trees below the target.
    pub shadow_trees: bool,
}

impl ObserveOptions {
    /// Child-list and attribute changes anywhere below the target.
    pub const fn subtree_changes() -> Self {
        Self {
            child_list: true,
            attributes: true,
            subtree: true,
            shadow_trees: false,
        }
    }

    pub const fn with_shadow_trees(mut self, enabled: bool) -> Self {
        self.shadow_trees = enabled;
        self
    }

    pub(crate) fn accepts(&self, kind: &MutationKind) -> bool {
        match kind {
            MutationKind::ChildList { .. } => self.child_list,
            MutationKind::Attributes { .. } => self.attributes,
        }
    }
}

type MutationCallback = dyn Fn(Vec<MutationRecord>) + Send + Sync;

/// Observer registration kept by a document.
pub(crate) struct Registration {
    pub observer: Arc<ObserverShared>,
    pub target: NodeId,
    pub options: ObserveOptions,
}

pub(crate) struct ObserverShared {
    callback: Box<MutationCallback>,
    state: Mutex<ObserverState>,
}

#[derive(Default)]
struct ObserverState {
    pending: Vec<MutationRecord>,
    delivery: Option<JoinHandle<()>>,
    documents: Vec<Weak<DocumentInner>>,
}

impl ObserverShared {
    /// Queue a record and make sure a delivery is scheduled.
    pub(crate) fn enqueue(self: &Arc<Self>, record: MutationRecord) {
        let mut state = self.state.lock();
        state.pending.push(record);
        if state.delivery.is_some() {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let shared = Arc::clone(self);
                state.delivery = Some(handle.spawn(async move {
                    tokio::task::yield_now().await;
                    shared.deliver();
                }));
            }
            Err(_) => {
                crate::debug_event!(
                    "observer",
                    "queued",
                    "no runtime, {} record(s) waiting",
                    state.pending.len()
                );
            }
        }
    }

    fn deliver(&self) {
        let records = {
            let mut state = self.state.lock();
            state.delivery = None;
            std::mem::take(&mut state.pending)
        };
        if !records.is_empty() {
            (self.callback)(records);
        }
    }
}

/// Watches a document subtree and reports batches of [`MutationRecord`]s.
///
/// A registered observer is kept alive by the document until
/// [`disconnect`](Self::disconnect) is called.
#[derive(Clone)]
pub struct MutationObserver {
    shared: Arc<ObserverShared>,
}

impl MutationObserver {
    pub fn new(callback: impl Fn(Vec<MutationRecord>) + Send + Sync + 'static) -> Self {
        Self {
            shared: Arc::new(ObserverShared {
                callback: Box::new(callback),
                state: Mutex::new(ObserverState::default()),
            }),
        }
    }

    /// Start observing `target`. Observing the same target again replaces its options.
    pub fn observe(&self, target: &Node, options: ObserveOptions) -> Result<(), DomError> {
        if !options.child_list && !options.attributes {
            return Err(DomError::InvalidObserveOptions);
        }

        let inner = &target.document().inner;
        {
            let mut registrations = inner.observers.lock();
            registrations.retain(|registration| {
                !(Arc::ptr_eq(&registration.observer, &self.shared)
                    && registration.target == target.id())
            });
            registrations.push(Registration {
                observer: Arc::clone(&self.shared),
                target: target.id(),
                options,
            });
        }

        let mut state = self.shared.state.lock();
        let weak = Arc::downgrade(inner);
        if !state.documents.iter().any(|doc| doc.ptr_eq(&weak)) {
            state.documents.push(weak);
        }
        Ok(())
    }

    /// Stop observing everything.
    ///
    /// Queued records are discarded and a scheduled delivery is aborted, so
    /// the callback never runs after this returns.
    pub fn disconnect(&self) {
        let documents = {
            let mut state = self.shared.state.lock();
            state.pending.clear();
            if let Some(delivery) = state.delivery.take() {
                delivery.abort();
            }
            std::mem::take(&mut state.documents)
        };

        for document in documents.iter().filter_map(Weak::upgrade) {
            document
                .observers
                .lock()
                .retain(|registration| !Arc::ptr_eq(&registration.observer, &self.shared));
        }
    }

    /// Drain queued records without invoking the callback.
    pub fn take_records(&self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.shared.state.lock().pending)
    }

    /// Whether any document still holds a registration for this observer.
    pub fn is_observing(&self) -> bool {
        !self.shared.state.lock().documents.is_empty()
    }
}

impl std::fmt::Debug for MutationObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("MutationObserver")
            .field("observing", &!state.documents.is_empty())
            .field("pending", &state.pending.len())
            .finish_non_exhaustive()
    }
}
