use std::collections::HashMap;

use glam::{Mat4, Vec3};
use id_arena::Arena;

use crate::camera::Camera;
use crate::error::{Result, SceneError};
use crate::math::Aabb;
use crate::model::{Mesh, MeshId, ModelKind, Polyhedron};
use crate::scene_graph::environment::Environment;
use crate::scene_graph::light::Light;
use crate::scene_graph::node::{Node, NodeId, NodeKind};
use crate::scene_graph::transform::Transform;

pub struct Scene {
    nodes: Arena<Node>,
    meshes: Arena<Mesh>,
    pub environment: Environment,
    active_camera: Option<NodeId>,
    builtin_meshes: HashMap<ModelKind, MeshId>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            nodes: Arena::new(),
            meshes: Arena::new(),
            environment: Environment::default(),
            active_camera: None,
            builtin_meshes: HashMap::new(),
        }
    }

    pub fn add_node(&mut self, node: Node) -> NodeId {
        self.nodes.alloc(node)
    }

    /// Creates a group over `children`. Every child must be an existing root
    /// and listed once; otherwise nothing is created or moved.
    pub fn add_group(&mut self, children: impl IntoIterator<Item = NodeId>) -> Result<NodeId> {
        let child_ids: Vec<NodeId> = children.into_iter().collect();

        for (position, &child_id) in child_ids.iter().enumerate() {
            self.check_detached(child_id)?;

            if child_ids[..position].contains(&child_id) {
                return Err(SceneError::DuplicateChild(child_id));
            }
        }

        let group_id = self.add_node(Node::new(NodeKind::Group));

        for child_id in child_ids {
            self.attach(group_id, child_id)?;
        }

        Ok(group_id)
    }

    pub fn add_model(&mut self, kind: ModelKind) -> Result<NodeId> {
        let mesh = self.builtin_mesh(kind)?;
        Ok(self.add_node(Node::new(NodeKind::Model { kind, mesh })))
    }

    pub fn add_model_named(&mut self, name: &str) -> Result<NodeId> {
        let kind = name.parse::<ModelKind>()?;
        self.add_model(kind)
    }

    pub fn add_polyhedron(&mut self, polyhedron: &Polyhedron) -> NodeId {
        let mesh = self.add_mesh(polyhedron.to_mesh("Polyhedron"));
        self.add_node(Node::new(NodeKind::Polyhedron { mesh }))
    }

    pub fn add_transform(&mut self, child_id: NodeId) -> Result<NodeId> {
        self.check_detached(child_id)?;

        let transform_id = self.add_node(Node::new(NodeKind::Transform(Transform::identity())));
        self.attach(transform_id, child_id)?;
        Ok(transform_id)
    }

    pub fn add_camera(&mut self, camera: Camera) -> NodeId {
        self.add_node(Node::new(NodeKind::Camera(camera)))
    }

    pub fn add_light(&mut self, index: usize) -> Result<NodeId> {
        let light = Light::new(index)?;
        Ok(self.add_node(Node::new(NodeKind::Light(light))))
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.alloc(mesh)
    }

    fn builtin_mesh(&mut self, kind: ModelKind) -> Result<MeshId> {
        match self.builtin_meshes.get(&kind).copied() {
            Some(mesh_id) => Ok(mesh_id),
            None => {
                let mesh = kind.build_mesh()?;
                log::debug!(
                    "Generated {} mesh with {} vertices and {} triangles",
                    kind,
                    mesh.vertices.len(),
                    mesh.triangle_count()
                );

                let mesh_id = self.add_mesh(mesh);
                self.builtin_meshes.insert(kind, mesh_id);
                Ok(mesh_id)
            }
        }
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id)
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id).ok_or(SceneError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id).ok_or(SceneError::UnknownNode(id))
    }

    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.name == name)
            .map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 0
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|node| node.parent_id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|node| node.child_ids.as_slice())
            .unwrap_or(&[])
    }

    /// Nodes without a parent, in creation order.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(|(_, node)| node.parent_id.is_none())
            .map(|(id, _)| id)
    }

    /// `root` and everything below it, depth-first, parents before children.
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        let stack = if self.nodes.get(root).is_some() {
            vec![root]
        } else {
            Vec::new()
        };

        Descendants { scene: self, stack }
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);

        while let Some(current_id) = current {
            if current_id == candidate {
                return true;
            }
            current = self.parent(current_id);
        }

        false
    }

    fn check_detached(&self, child_id: NodeId) -> Result<()> {
        match self.node(child_id)?.parent_id {
            Some(parent_id) => Err(SceneError::AlreadyAttached {
                child: child_id,
                parent: parent_id,
            }),
            None => Ok(()),
        }
    }

    pub fn attach(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<()> {
        let parent = self.node(parent_id)?;
        self.check_detached(child_id)?;
        let child = self.node(child_id)?;

        if self.is_ancestor_or_self(child_id, parent_id) {
            return Err(SceneError::CycleDetected {
                parent: parent_id,
                child: child_id,
            });
        }

        match parent.kind.child_capacity() {
            Some(0) => return Err(SceneError::NotAContainer(parent_id)),
            Some(capacity) if parent.child_ids.len() >= capacity => {
                return Err(SceneError::TransformOccupied(parent_id));
            }
            _ => {}
        }

        log::debug!(
            "Attaching {} {:?} to {} {:?}",
            child.kind.type_name(),
            child_id,
            parent.kind.type_name(),
            parent_id
        );

        self.node_mut(parent_id)?.child_ids.push(child_id);
        self.node_mut(child_id)?.parent_id = Some(parent_id);

        // Invalidate world transforms for the moved node and its descendants
        self.invalidate_node_hierarchy(child_id);

        Ok(())
    }

    /// Detaches `child_id` from its parent, if any. The node stays in the
    /// scene as a root.
    pub fn detach(&mut self, child_id: NodeId) -> Result<()> {
        let Some(parent_id) = self.node(child_id)?.parent_id else {
            return Ok(());
        };

        log::debug!("Detaching {:?} from {:?}", child_id, parent_id);

        self.node_mut(parent_id)?
            .child_ids
            .retain(|&id| id != child_id);
        self.node_mut(child_id)?.parent_id = None;
        self.invalidate_node_hierarchy(child_id);

        Ok(())
    }

    /// Moves `child_id` under `new_parent_id`, or makes it a root. On error
    /// the node keeps its previous parent.
    pub fn set_parent(&mut self, child_id: NodeId, new_parent_id: Option<NodeId>) -> Result<()> {
        let old_parent_id = self.node(child_id)?.parent_id;

        if old_parent_id == new_parent_id {
            return Ok(());
        }

        self.detach(child_id)?;

        let Some(new_parent_id) = new_parent_id else {
            return Ok(());
        };

        if let Err(error) = self.attach(new_parent_id, child_id) {
            if let Some(old_parent_id) = old_parent_id {
                self.attach(old_parent_id, child_id)?;
            }
            return Err(error);
        }

        Ok(())
    }

    /// Deep copy of a node and its descendants. The copy has no parent and
    /// shares meshes with the original.
    pub fn clone_subtree(&mut self, id: NodeId) -> Result<NodeId> {
        let copy = self.node(id)?.detached_copy();
        let child_ids = self.node(id)?.child_ids.clone();
        let copy_id = self.add_node(copy);

        for child_id in child_ids {
            let child_copy_id = self.clone_subtree(child_id)?;
            self.node_mut(copy_id)?.child_ids.push(child_copy_id);
            self.node_mut(child_copy_id)?.parent_id = Some(copy_id);
        }

        Ok(copy_id)
    }

    /// Invalidates world transforms for a node and all its descendants
    pub fn invalidate_node_hierarchy(&self, id: NodeId) {
        if let Some(node) = self.nodes.get(id) {
            node.invalidate_world();

            for &child_id in &node.child_ids {
                self.invalidate_node_hierarchy(child_id);
            }
        }
    }

    /// World transform of a node, recomputed from its ancestors when stale.
    pub fn world_matrix(&self, id: NodeId) -> Result<Mat4> {
        let node = self.node(id)?;

        if let Some(world_matrix) = node.world_matrix_cached() {
            return Ok(world_matrix);
        }

        let parent_world_matrix = match node.parent_id {
            Some(parent_id) => self.world_matrix(parent_id)?,
            None => Mat4::IDENTITY,
        };

        let world_matrix = parent_world_matrix * node.local_matrix();
        node.set_world_matrix(world_matrix);

        Ok(world_matrix)
    }

    /// Updates all node transforms in hierarchical order
    fn update_transforms(&self) {
        for (root_id, _) in self
            .nodes
            .iter()
            .filter(|(_, node)| node.parent_id.is_none())
        {
            self.update_node_transform_recursive(root_id, Mat4::IDENTITY);
        }
    }

    fn update_node_transform_recursive(&self, id: NodeId, parent_world_matrix: Mat4) {
        if let Some(node) = self.nodes.get(id) {
            let world_matrix = match node.world_matrix_cached() {
                Some(world_matrix) => world_matrix,
                None => {
                    let world_matrix = parent_world_matrix * node.local_matrix();
                    node.set_world_matrix(world_matrix);
                    world_matrix
                }
            };

            for &child_id in &node.child_ids {
                self.update_node_transform_recursive(child_id, world_matrix);
            }
        }
    }

    /// World-space bounds of all geometry under `root`. Meshes are scaled by
    /// `model_scale` first, as they are when drawn.
    pub fn bounds(&self, root: NodeId, model_scale: f32) -> Option<Aabb> {
        let scale = Mat4::from_scale(Vec3::splat(model_scale));

        self.descendants(root)
            .filter_map(|id| {
                let mesh = self.meshes.get(self.nodes.get(id)?.kind.mesh()?)?;
                let world_matrix = self.world_matrix(id).ok()?;
                Some(mesh.bounds()?.transform(&(world_matrix * scale)))
            })
            .reduce(|a, b| a.union(&b))
    }

    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> Result<()> {
        self.node_mut(id)?.name = name.into();
        Ok(())
    }

    pub fn set_color(&mut self, id: NodeId, r: f32, g: f32, b: f32) -> Result<()> {
        self.node_mut(id)?.color = Vec3::new(r, g, b);
        Ok(())
    }

    pub fn set_line_color(&mut self, id: NodeId, line_color: Option<Vec3>) -> Result<()> {
        self.node_mut(id)?.line_color = line_color;
        Ok(())
    }

    pub fn transform(&self, id: NodeId) -> Result<&Transform> {
        match &self.node(id)?.kind {
            NodeKind::Transform(transform) => Ok(transform),
            _ => Err(SceneError::NotATransform(id)),
        }
    }

    fn update_transform(&mut self, id: NodeId, update: impl FnOnce(&mut Transform)) -> Result<()> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Transform(transform) => update(transform),
            _ => return Err(SceneError::NotATransform(id)),
        }

        self.invalidate_node_hierarchy(id);
        Ok(())
    }

    pub fn set_translation(&mut self, id: NodeId, dx: f32, dy: f32, dz: f32) -> Result<()> {
        self.update_transform(id, |transform| {
            transform.set_translation(Vec3::new(dx, dy, dz))
        })
    }

    pub fn set_rotation(&mut self, id: NodeId, angle: f32, axis: Vec3) -> Result<()> {
        self.update_transform(id, |transform| transform.set_rotation(angle, axis))
    }

    pub fn set_scale(&mut self, id: NodeId, sx: f32, sy: f32, sz: f32) -> Result<()> {
        self.update_transform(id, |transform| {
            transform.set_scale(Vec3::new(sx, sy, sz))
        })
    }

    pub fn set_uniform_scale(&mut self, id: NodeId, scale: f32) -> Result<()> {
        self.update_transform(id, |transform| transform.set_uniform_scale(scale))
    }

    pub fn light(&self, id: NodeId) -> Result<&Light> {
        match &self.node(id)?.kind {
            NodeKind::Light(light) => Ok(light),
            _ => Err(SceneError::NotALight(id)),
        }
    }

    pub fn light_mut(&mut self, id: NodeId) -> Result<&mut Light> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Light(light) => Ok(light),
            _ => Err(SceneError::NotALight(id)),
        }
    }

    pub fn camera(&self, id: NodeId) -> Result<&Camera> {
        match &self.node(id)?.kind {
            NodeKind::Camera(camera) => Ok(camera),
            _ => Err(SceneError::NotACamera(id)),
        }
    }

    pub fn camera_mut(&mut self, id: NodeId) -> Result<&mut Camera> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Camera(camera) => Ok(camera),
            _ => Err(SceneError::NotACamera(id)),
        }
    }

    pub fn set_active_camera(&mut self, camera_id: Option<NodeId>) -> Result<()> {
        if let Some(camera_id) = camera_id {
            self.camera(camera_id)?;
        }

        self.active_camera = camera_id;
        Ok(())
    }

    pub fn active_camera(&self) -> Option<NodeId> {
        self.active_camera
    }

    /// The active camera, or else the first camera found depth-first from
    /// `root`.
    pub fn resolve_camera(&self, root: NodeId) -> Option<NodeId> {
        self.active_camera
            .filter(|&id| self.camera(id).is_ok())
            .or_else(|| {
                self.descendants(root).find(|&id| {
                    matches!(
                        self.nodes.get(id).map(Node::kind),
                        Some(NodeKind::Camera(_))
                    )
                })
            })
    }

    pub fn early_update(&mut self) {
        for (_, node) in self.nodes.iter() {
            node.reset_flags();
        }
    }

    pub fn late_update(&mut self) {
        self.update_transforms();
    }
}

pub struct Descendants<'a> {
    scene: &'a Scene,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.scene.children(id).iter().rev().copied());
        Some(id)
    }
}
