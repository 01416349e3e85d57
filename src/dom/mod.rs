//! In-memory document model.
//!
//! Provides the platform surface the watcher runs against: an element tree
//! with attributes, open and closed shadow roots, and mutation observers
//! with batched asynchronous delivery.
//!
//! # Architecture
//!
//! ```text
//! Document (Arc, cheap to clone)
//!   - RwLock<Tree>            arena of nodes
//!   - Mutex<Vec<Registration>> observer registrations
//!         |
//!   mutation -> records -> matching registrations -> MutationObserver queue
//!                                                    -> delivery task (tokio)
//! ```

mod error;
mod node;
mod observer;
mod tree;

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

pub use error::DomError;
pub use node::{Element, Node, ShadowRoot};
pub use observer::{MutationKind, MutationObserver, MutationRecord, ObserveOptions};
pub use tree::{NodeId, ShadowRootMode, Tree};

use observer::Registration;

pub(crate) struct DocumentInner {
    tree: RwLock<Tree>,
    observers: Mutex<Vec<Registration>>,
}

/// A document: a shared handle to one node tree.
#[derive(Clone)]
pub struct Document {
    inner: Arc<DocumentInner>,
}

impl Document {
    /// Create an empty `html > (head, body)` document.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DocumentInner {
                tree: RwLock::new(Tree::new()),
                observers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// The document node itself.
    pub fn root(&self) -> Node {
        let root = self.with_tree(Tree::root);
        Node::new(self.clone(), root)
    }

    pub fn body(&self) -> Element {
        let body = self.with_tree(Tree::body);
        Element::new(self.clone(), body)
    }

    /// Create a detached element.
    pub fn create_element(&self, tag: &str) -> Element {
        let id = self.inner.tree.write().create_element(tag);
        Element::new(self.clone(), id)
    }

    pub fn node(&self, id: NodeId) -> Option<Node> {
        self.with_tree(|tree| tree.contains(id))
            .then(|| Node::new(self.clone(), id))
    }

    pub fn element(&self, id: NodeId) -> Option<Element> {
        self.node(id)?.as_element()
    }

    /// Run `f` against a read-only view of the tree.
    ///
    /// The tree stays read-locked for the duration of `f`; do not mutate the
    /// document from inside it.
    pub fn with_view<R>(&self, f: impl FnOnce(&Tree) -> R) -> R {
        self.with_tree(f)
    }

    pub(crate) fn with_tree<R>(&self, f: impl FnOnce(&Tree) -> R) -> R {
        f(&self.inner.tree.read())
    }

    /// Number of active observer registrations on this document.
    pub fn observer_count(&self) -> usize {
        self.inner.observers.lock().len()
    }

    pub fn ptr_eq(&self, other: &Document) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn ensure_same(&self, other: &Document) -> Result<(), DomError> {
        if self.ptr_eq(other) {
            Ok(())
        } else {
            Err(DomError::WrongDocument)
        }
    }

    /// Route records to every registration that covers their target.
    ///
    /// Each observer receives a given record at most once, even when several
    /// of its registrations cover the target.
    fn notify(&self, records: Vec<MutationRecord>) {
        let deliveries = {
            let registrations = self.inner.observers.lock();
            if registrations.is_empty() {
                return;
            }

            let tree = self.inner.tree.read();
            let mut deliveries = Vec::new();
            for record in records {
                let mut seen: Vec<&Arc<observer::ObserverShared>> = Vec::new();
                for registration in registrations.iter() {
                    if seen.iter().any(|o| Arc::ptr_eq(o, &registration.observer)) {
                        continue;
                    }
                    if registration.options.accepts(&record.kind)
                        && tree.is_observed(
                            registration.target,
                            &registration.options,
                            record.target,
                        )
                    {
                        seen.push(&registration.observer);
                        deliveries.push((Arc::clone(&registration.observer), record.clone()));
                    }
                }
            }
            deliveries
        };

        for (observer, record) in deliveries {
            observer.enqueue(record);
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("observers", &self.observer_count())
            .finish_non_exhaustive()
    }
}
