//! Arena-backed document tree.
//!
//! Nodes are never freed; detached nodes simply have no parent. Every
//! mutating operation returns the mutation records it produced so the
//! owning [`Document`](super::Document) can route them to observers.

use std::fmt;

use indexmap::IndexMap;

use super::DomError;
use super::observer::{MutationKind, MutationRecord, ObserveOptions};
use crate::query::TreeView;

/// Stable identifier of a node within one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Encapsulation mode of a shadow root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowRootMode {
    /// Traversable from outside the host.
    Open,
    /// Unreachable from outside the host; treated as absent content.
    Closed,
}

#[derive(Debug)]
pub(crate) struct ElementData {
    pub tag: String,
    pub attrs: IndexMap<String, String>,
    pub shadow_root: Option<NodeId>,
}

#[derive(Debug)]
pub(crate) enum NodeKind {
    Document,
    Element(ElementData),
    ShadowRoot { host: NodeId, mode: ShadowRootMode },
}

#[derive(Debug)]
pub(crate) struct NodeData {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// The node arena of one document.
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<NodeData>,
    root: NodeId,
    body: NodeId,
}

impl Tree {
    /// Create a tree holding `document > html > (head, body)`.
    pub(crate) fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            body: NodeId(0),
        };
        let root = tree.push(NodeKind::Document);
        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");
        tree.link(root, html, None);
        tree.link(html, head, None);
        tree.link(html, body, None);
        tree.root = root;
        tree.body = body;
        tree
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn link(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) {
        let children = &mut self.nodes[parent.0].children;
        match index {
            Some(index) => children.insert(index, child),
            None => children.push(child),
        }
        self.nodes[child.0].parent = Some(parent);
    }

    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn body(&self) -> NodeId {
        self.body
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub(crate) fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub(crate) fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(data) => Ok(data),
            _ => Err(DomError::NotAnElement { node: id }),
        }
    }

    pub(crate) fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            attrs: IndexMap::new(),
            shadow_root: None,
        }))
    }

    /// Parent in the composed tree: the light parent, or the host for a shadow root.
    fn composed_parent(&self, id: NodeId) -> Option<NodeId> {
        match &self.nodes[id.0].kind {
            NodeKind::ShadowRoot { host, .. } => Some(*host),
            _ => self.nodes[id.0].parent,
        }
    }

    /// Whether `id` is reachable from the document root.
    pub(crate) fn is_connected(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(node) = cursor {
            if node == self.root {
                return true;
            }
            cursor = self.composed_parent(node);
        }
        false
    }

    /// Insert `child` under `parent`, before `reference` (or last).
    ///
    /// Moving an attached node produces a removal record for the old parent.
    pub(crate) fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<Vec<MutationRecord>, DomError> {
        if matches!(self.nodes[parent.0].kind, NodeKind::Document) {
            return Err(DomError::NotAParent { node: parent });
        }
        if !matches!(self.nodes[child.0].kind, NodeKind::Element(_)) {
            return Err(DomError::InvalidChild { node: child });
        }

        let mut cursor = Some(parent);
        while let Some(node) = cursor {
            if node == child {
                return Err(DomError::HierarchyCycle { parent, child });
            }
            cursor = self.composed_parent(node);
        }

        if let Some(reference) = reference {
            if self.nodes[reference.0].parent != Some(parent) {
                return Err(DomError::NotAChild { parent, reference });
            }
        }

        // Inserting a node before itself keeps it in place
        let reference = match reference {
            Some(reference) if reference == child => {
                let siblings = &self.nodes[parent.0].children;
                siblings
                    .iter()
                    .position(|&c| c == child)
                    .and_then(|index| siblings.get(index + 1).copied())
            }
            other => other,
        };

        let mut records = Vec::new();
        if let Some(record) = self.detach(child) {
            records.push(record);
        }

        let index = reference.and_then(|reference| {
            self.nodes[parent.0]
                .children
                .iter()
                .position(|&c| c == reference)
        });
        self.link(parent, child, index);

        records.push(MutationRecord {
            target: parent,
            kind: MutationKind::ChildList {
                added: vec![child],
                removed: Vec::new(),
            },
        });
        Ok(records)
    }

    /// Detach `child` from its parent, if any.
    pub(crate) fn detach(&mut self, child: NodeId) -> Option<MutationRecord> {
        let parent = self.nodes[child.0].parent.take()?;
        self.nodes[parent.0].children.retain(|&c| c != child);
        Some(MutationRecord {
            target: parent,
            kind: MutationKind::ChildList {
                added: Vec::new(),
                removed: vec![child],
            },
        })
    }

    pub(crate) fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: &str,
    ) -> Result<MutationRecord, DomError> {
        let name = name.to_ascii_lowercase();
        let element = self.element_mut(id)?;
        let old_value = element.attrs.insert(name.clone(), value.to_string());
        Ok(MutationRecord {
            target: id,
            kind: MutationKind::Attributes { name, old_value },
        })
    }

    pub(crate) fn remove_attribute(
        &mut self,
        id: NodeId,
        name: &str,
    ) -> Result<Option<MutationRecord>, DomError> {
        let name = name.to_ascii_lowercase();
        let element = self.element_mut(id)?;
        Ok(element
            .attrs
            .shift_remove(&name)
            .map(|old| MutationRecord {
                target: id,
                kind: MutationKind::Attributes {
                    name,
                    old_value: Some(old),
                },
            }))
    }

    /// Attach a shadow root to `host`. Attaching produces no mutation record.
    pub(crate) fn attach_shadow(
        &mut self,
        host: NodeId,
        mode: ShadowRootMode,
    ) -> Result<NodeId, DomError> {
        if self.element_mut(host)?.shadow_root.is_some() {
            return Err(DomError::ShadowRootExists { host });
        }
        let shadow = self.push(NodeKind::ShadowRoot { host, mode });
        self.element_mut(host)?.shadow_root = Some(shadow);
        Ok(shadow)
    }

    /// Whether a registration on `observed` with `options` sees a mutation of `target`.
    pub(crate) fn is_observed(
        &self,
        observed: NodeId,
        options: &ObserveOptions,
        target: NodeId,
    ) -> bool {
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            if node == observed {
                return node == target || options.subtree;
            }
            cursor = match &self.nodes[node.0].kind {
                NodeKind::ShadowRoot { host, mode } => {
                    if options.shadow_trees && *mode == ShadowRootMode::Open {
                        Some(*host)
                    } else {
                        None
                    }
                }
                _ => self.nodes[node.0].parent,
            };
        }
        false
    }
}

impl TreeView for Tree {
    type NodeId = NodeId;

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|data| data.tag.as_str())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)
            .and_then(|data| data.attrs.get(name))
            .map(String::as_str)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    fn open_shadow_root(&self, node: NodeId) -> Option<NodeId> {
        let shadow = self.element(node)?.shadow_root?;
        match self.nodes[shadow.0].kind {
            NodeKind::ShadowRoot {
                mode: ShadowRootMode::Open,
                ..
            } => Some(shadow),
            _ => None,
        }
    }

    fn shadow_host(&self, node: NodeId) -> Option<NodeId> {
        match self.nodes[node.0].kind {
            NodeKind::ShadowRoot { host, .. } => Some(host),
            _ => None,
        }
    }
}
