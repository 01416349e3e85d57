//! Error types for document tree operations.

use thiserror::Error;

use super::NodeId;

/// Errors from invalid tree operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("Node {node} cannot have children")]
    NotAParent { node: NodeId },

    #[error("Node {node} cannot be inserted as a child (only elements can)")]
    InvalidChild { node: NodeId },

    #[error("Inserting {child} under {parent} would create a cycle")]
    HierarchyCycle { parent: NodeId, child: NodeId },

    #[error("Reference node {reference} is not a child of {parent}")]
    NotAChild { parent: NodeId, reference: NodeId },

    #[error("Element {host} already hosts a shadow root")]
    ShadowRootExists { host: NodeId },

    #[error("Node {node} is not an element")]
    NotAnElement { node: NodeId },

    #[error("Nodes belong to different documents")]
    WrongDocument,

    #[error("Observe options must include child list or attribute changes")]
    InvalidObserveOptions,
}
