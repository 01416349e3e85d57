//! Read-only tree capabilities needed by traversal and selector matching.

/// A read-only view of a node tree.
///
/// Traversal and matching only ever go through this trait, so they work on
/// any tree that can answer these questions.
pub trait TreeView {
    type NodeId: Copy + Eq;

    /// Lowercase tag name; `None` for anything that is not an element.
    fn tag_name(&self, node: Self::NodeId) -> Option<&str>;

    /// Attribute value by lowercase name.
    fn attribute(&self, node: Self::NodeId, name: &str) -> Option<&str>;

    /// Light-tree parent. Shadow roots have none.
    fn parent(&self, node: Self::NodeId) -> Option<Self::NodeId>;

    /// Light-tree children in document order.
    fn children(&self, node: Self::NodeId) -> &[Self::NodeId];

    /// The element's shadow root if it is open.
    fn open_shadow_root(&self, node: Self::NodeId) -> Option<Self::NodeId>;

    /// The host element when `node` is a shadow root.
    fn shadow_host(&self, node: Self::NodeId) -> Option<Self::NodeId>;
}
