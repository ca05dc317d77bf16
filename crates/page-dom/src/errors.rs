//! Error types for the page model

use thiserror::Error;

use crate::node::NodeId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomError {
    /// Selector the parser rejects
    #[error("unsupported selector: {0}")]
    UnsupportedSelector(String),

    /// Operation needs an element but got a text/document node
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),

    /// Node is not attached to the document
    #[error("node {0} is detached")]
    Detached(NodeId),

    /// Node id does not exist in this document
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// Tree operation would create a cycle or orphan the root
    #[error("hierarchy request error: {0}")]
    HierarchyRequest(String),
}

impl DomError {
    pub fn selector(selector: impl Into<String>) -> Self {
        Self::UnsupportedSelector(selector.into())
    }

    /// Errors caused by the page changing underneath a caller, as opposed to
    /// malformed input.
    pub fn is_stale_node(&self) -> bool {
        matches!(self, DomError::Detached(_) | DomError::UnknownNode(_))
    }
}

pub type DomResult<T> = Result<T, DomError>;
