use thiserror::Error;

use crate::node::NodeType;
use crate::tree::NodeId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),
    /// Raised when a container is asked to hold a node kind it does not accept.
    /// Groups and abstract groups only take groups and shapes.
    #[error("{parent_type} {parent} cannot contain {child_type} {child}")]
    InvalidChild {
        parent: NodeId,
        parent_type: NodeType,
        child: NodeId,
        child_type: NodeType,
    },
    #[error("Cannot add {child} to {parent}: {parent} is inside {child}")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("Node {node} is a {found}, expected {expected}")]
    WrongType {
        node: NodeId,
        expected: NodeType,
        found: NodeType,
    },
}

pub type Result<T> = std::result::Result<T, SceneError>;
