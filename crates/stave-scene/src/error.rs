use crate::document::NodeId;
use thiserror::Error;

/// Failures of tree construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("no open element to close")]
    NoOpenElement,
    #[error("no open block to close")]
    NoOpenBlock,
    #[error("no remote element to pop")]
    NoRemoteElement,
    #[error("node {0:?} does not belong to this document")]
    UnknownNode(NodeId),
    #[error("node {0:?} cannot have children")]
    NotAnElement(NodeId),
    #[error("node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },
    #[error("inserting {child:?} into {parent:?} would create a cycle")]
    HierarchyRequest { parent: NodeId, child: NodeId },
}
