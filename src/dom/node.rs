//! Cheap, cloneable handles to nodes of a [`Document`].

use std::fmt;
use std::ops::Deref;

use super::tree::NodeKind;
use super::{Document, DomError, NodeId, ShadowRootMode};
use crate::query::{self, ShadowMode};
use crate::selector::{SelectorError, SelectorList};

/// Handle to any node: the document node, an element or a shadow root.
#[derive(Clone)]
pub struct Node {
    doc: Document,
    id: NodeId,
}

impl Node {
    pub(crate) fn new(doc: Document, id: NodeId) -> Self {
        Self { doc, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn is_element(&self) -> bool {
        self.doc.with_tree(|tree| tree.element(self.id).is_some())
    }

    /// Lowercase tag name for elements.
    pub fn tag_name(&self) -> Option<String> {
        self.doc
            .with_tree(|tree| tree.element(self.id).map(|data| data.tag.clone()))
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        self.doc.with_tree(|tree| {
            tree.element(self.id)
                .and_then(|data| data.attrs.get(&name).cloned())
        })
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    pub fn parent(&self) -> Option<Node> {
        let parent = self.doc.with_tree(|tree| {
            use crate::query::TreeView;
            tree.parent(self.id)
        })?;
        Some(Node::new(self.doc.clone(), parent))
    }

    pub fn children(&self) -> Vec<Node> {
        let ids = self.doc.with_tree(|tree| {
            use crate::query::TreeView;
            tree.children(self.id).to_vec()
        });
        ids.into_iter()
            .map(|id| Node::new(self.doc.clone(), id))
            .collect()
    }

    /// Whether the node is reachable from the document root, shadow hosts included.
    pub fn is_connected(&self) -> bool {
        self.doc.with_tree(|tree| tree.is_connected(self.id))
    }

    pub fn as_element(&self) -> Option<Element> {
        self.is_element().then(|| Element(self.clone()))
    }

    pub fn append_child(&self, child: &Node) -> Result<(), DomError> {
        self.insert_before(child, None)
    }

    /// Insert `child` before `reference`, or last when `reference` is `None`.
    pub fn insert_before(&self, child: &Node, reference: Option<&Node>) -> Result<(), DomError> {
        self.doc.ensure_same(child.document())?;
        if let Some(reference) = reference {
            self.doc.ensure_same(reference.document())?;
        }

        let records = self.doc.inner.tree.write().insert_before(
            self.id,
            child.id,
            reference.map(Node::id),
        )?;
        self.doc.notify(records);
        Ok(())
    }

    /// Detach this node from its parent. Detached nodes are left untouched.
    pub fn remove(&self) {
        let record = self.doc.inner.tree.write().detach(self.id);
        if let Some(record) = record {
            self.doc.notify(vec![record]);
        }
    }

    /// First matching descendant in the light tree.
    pub fn query_selector(&self, selector: &str) -> Result<Option<Element>, SelectorError> {
        let selectors = SelectorList::parse(selector)?;
        Ok(query::query_first(self, &selectors, ShadowMode::Light))
    }

    /// First matching descendant, descending into open shadow roots.
    pub fn query_selector_deep(&self, selector: &str) -> Result<Option<Element>, SelectorError> {
        let selectors = SelectorList::parse(selector)?;
        Ok(query::query_first(self, &selectors, ShadowMode::Pierce))
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.doc.ptr_eq(&other.doc)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.doc.with_tree(|tree| match tree.kind(self.id) {
            NodeKind::Document => write!(f, "Node({} document)", self.id),
            NodeKind::Element(data) => write!(f, "Node({} <{}>)", self.id, data.tag),
            NodeKind::ShadowRoot { host, mode } => {
                write!(f, "Node({} shadow-root {mode:?} of {host})", self.id)
            }
        })
    }
}

/// Handle to an element node.
#[derive(Clone, PartialEq, Eq)]
pub struct Element(Node);

impl Element {
    pub(crate) fn new(doc: Document, id: NodeId) -> Self {
        Self(Node::new(doc, id))
    }

    pub fn as_node(&self) -> &Node {
        &self.0
    }

    pub fn tag(&self) -> String {
        self.0.tag_name().unwrap_or_default()
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        let record = self
            .doc
            .inner
            .tree
            .write()
            .set_attribute(self.id, name, value);
        if let Ok(record) = record {
            self.doc.notify(vec![record]);
        }
    }

    pub fn remove_attribute(&self, name: &str) {
        let record = self.doc.inner.tree.write().remove_attribute(self.id, name);
        if let Ok(Some(record)) = record {
            self.doc.notify(vec![record]);
        }
    }

    pub fn attach_shadow(&self, mode: ShadowRootMode) -> Result<ShadowRoot, DomError> {
        let shadow = self.doc.inner.tree.write().attach_shadow(self.id, mode)?;
        Ok(ShadowRoot(Node::new(self.doc.clone(), shadow)))
    }

    /// The open shadow root of this element. Closed roots are not exposed.
    pub fn shadow_root(&self) -> Option<ShadowRoot> {
        let shadow = self.doc.with_tree(|tree| {
            use crate::query::TreeView;
            tree.open_shadow_root(self.id)
        })?;
        Some(ShadowRoot(Node::new(self.doc.clone(), shadow)))
    }
}

impl Deref for Element {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.0
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        element.0
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Handle to a shadow root.
#[derive(Clone, PartialEq, Eq)]
pub struct ShadowRoot(Node);

impl ShadowRoot {
    pub fn host(&self) -> Element {
        let host = self.doc.with_tree(|tree| match tree.kind(self.id) {
            NodeKind::ShadowRoot { host, .. } => *host,
            _ => unreachable!("shadow root handle points at a non-shadow node"),
        });
        Element::new(self.doc.clone(), host)
    }

    pub fn mode(&self) -> ShadowRootMode {
        self.doc.with_tree(|tree| match tree.kind(self.id) {
            NodeKind::ShadowRoot { mode, .. } => *mode,
            _ => unreachable!("shadow root handle points at a non-shadow node"),
        })
    }
}

impl Deref for ShadowRoot {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.0
    }
}

impl From<ShadowRoot> for Node {
    fn from(shadow: ShadowRoot) -> Self {
        shadow.0
    }
}

impl fmt::Debug for ShadowRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
