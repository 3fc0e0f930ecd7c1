use thiserror::Error;

use crate::tree::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("node {0:?} is no longer alive")]
    StaleNode(NodeId),

    #[error("node {0:?} is not a group")]
    NotAGroup(NodeId),

    #[error("node {0:?} is not a shape")]
    NotAShape(NodeId),

    #[error("node {0:?} is not a container")]
    NotAContainer(NodeId),

    #[error("node {0:?} is locked")]
    Locked(NodeId),

    #[error("inserting {child:?} into {parent:?} would make it its own ancestor")]
    WouldCreateCycle { parent: NodeId, child: NodeId },

    #[error("unknown geometric property `{0}`")]
    UnknownProperty(String),

    #[error("node {0:?} has no mask")]
    NoMask(NodeId),
}
