use thiserror::Error;

use crate::rendering::config::ConfigError;
use crate::scene_graph::node::NodeId;

pub type Result<T> = std::result::Result<T, SceneError>;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Unknown node: {0:?}")]
    UnknownNode(NodeId),

    #[error("Node {child:?} already has a parent ({parent:?})")]
    AlreadyAttached { child: NodeId, parent: NodeId },

    #[error("Node {0:?} is listed more than once")]
    DuplicateChild(NodeId),

    #[error("Attaching {child:?} under {parent:?} would create a cycle")]
    CycleDetected { parent: NodeId, child: NodeId },

    #[error("Node {0:?} cannot have children")]
    NotAContainer(NodeId),

    #[error("Transform node {0:?} already wraps a child")]
    TransformOccupied(NodeId),

    #[error("Node {0:?} is not a transform")]
    NotATransform(NodeId),

    #[error("Node {0:?} is not a light")]
    NotALight(NodeId),

    #[error("Node {0:?} is not a camera")]
    NotACamera(NodeId),

    #[error("Scene does not contain a {0} model")]
    UnknownModel(String),

    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("Invalid polyhedron: {0}")]
    InvalidPolyhedron(String),

    #[error("Light index {0} is out of range (0..8)")]
    InvalidLightIndex(usize),

    #[error("Matrix stack overflow (max depth {0})")]
    StackOverflow(usize),

    #[error("Matrix stack underflow")]
    StackUnderflow,

    #[error("World transform of {0:?} is not invertible")]
    SingularTransform(NodeId),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
