use std::cell::Cell;

use glam::{Mat4, Vec3};
use id_arena::Id;

use crate::camera::Camera;
use crate::model::{MeshId, ModelKind};
use crate::scene_graph::light::Light;
use crate::scene_graph::transform::Transform;

pub type NodeId = Id<Node>;

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Any number of children drawn in order
    Group,
    Model { kind: ModelKind, mesh: MeshId },
    Polyhedron { mesh: MeshId },
    /// Applies its transform to at most one child
    Transform(Transform),
    Camera(Camera),
    Light(Light),
}

impl NodeKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Group => "Group",
            NodeKind::Model { .. } => "Model",
            NodeKind::Polyhedron { .. } => "Polyhedron",
            NodeKind::Transform(_) => "Transform",
            NodeKind::Camera(_) => "Camera",
            NodeKind::Light(_) => "Light",
        }
    }

    /// Maximum number of children, `None` meaning unbounded.
    pub fn child_capacity(&self) -> Option<usize> {
        match self {
            NodeKind::Group => None,
            NodeKind::Transform(_) => Some(1),
            _ => Some(0),
        }
    }

    pub fn mesh(&self) -> Option<MeshId> {
        match self {
            NodeKind::Model { mesh, .. } | NodeKind::Polyhedron { mesh } => Some(*mesh),
            _ => None,
        }
    }
}

pub struct Node {
    pub name: String,
    pub color: Vec3,
    pub line_color: Option<Vec3>,
    pub(crate) kind: NodeKind,
    pub(crate) parent_id: Option<NodeId>,
    pub(crate) child_ids: Vec<NodeId>,

    world_matrix: Cell<Mat4>,
    world_dirty: Cell<bool>,
    changed_since_last_update: Cell<bool>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            name: String::new(),
            color: Vec3::ONE,
            line_color: None,
            kind,
            parent_id: None,
            child_ids: Vec::new(),
            world_matrix: Cell::new(Mat4::IDENTITY),
            world_dirty: Cell::new(true),
            changed_since_last_update: Cell::new(true),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn parent_id(&self) -> Option<NodeId> {
        self.parent_id
    }

    pub fn child_ids(&self) -> &[NodeId] {
        &self.child_ids
    }

    pub fn local_matrix(&self) -> Mat4 {
        match &self.kind {
            NodeKind::Transform(transform) => transform.local_matrix(),
            _ => Mat4::IDENTITY,
        }
    }

    pub(crate) fn world_matrix_cached(&self) -> Option<Mat4> {
        (!self.world_dirty.get()).then(|| self.world_matrix.get())
    }

    pub(crate) fn set_world_matrix(&self, world_matrix: Mat4) {
        self.world_matrix.set(world_matrix);
        self.world_dirty.set(false);
    }

    pub(crate) fn invalidate_world(&self) {
        self.world_dirty.set(true);
        self.changed_since_last_update.set(true);
    }

    pub fn is_world_dirty(&self) -> bool {
        self.world_dirty.get()
    }

    pub(crate) fn reset_flags(&self) {
        self.changed_since_last_update.set(false);
    }

    /// Whether the world transform was invalidated since the last
    /// `Scene::early_update`.
    pub fn has_changed(&self) -> bool {
        self.changed_since_last_update.get()
    }

    /// Copy of this node with no parent, no children and a dirty world cache.
    pub(crate) fn detached_copy(&self) -> Self {
        Self {
            name: self.name.clone(),
            color: self.color,
            line_color: self.line_color,
            ..Self::new(self.kind.clone())
        }
    }
}
