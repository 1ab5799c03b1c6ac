//! Scene graph for immediate-mode style 3D rendering.
//!
//! A [`Scene`] owns a tree of nodes (groups, primitive models, polyhedra,
//! transforms, cameras and lights). [`SceneRenderer`] walks it depth-first
//! with a matrix stack and replays it on any [`RenderBackend`].

pub mod camera;
pub mod error;
pub mod math;
pub mod model;
pub mod rendering;
pub mod scene_graph;

pub use camera::{Camera, Limits, Trackball};
pub use error::{Result, SceneError};
pub use model::{Mesh, MeshId, ModelKind, Polyhedron};
pub use rendering::{
    CommandRecorder, FrameStats, RenderBackend, RenderCommand, RenderConfig, SceneRenderer,
    SoftwareRasterizer,
};
pub use scene_graph::{Environment, Light, Node, NodeId, NodeKind, Scene, Transform};
