use glam::{Mat4, Vec3, Vec4};

use crate::error::{Result, SceneError};
use crate::math::{try_inverse, MatrixStack};
use crate::rendering::backend::{DrawCall, DrawMode, LightState, RenderBackend};
use crate::rendering::config::RenderConfig;
use crate::scene_graph::{Light, Node, NodeId, NodeKind, Scene, MAX_LIGHTS};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub nodes_visited: usize,
    pub draw_calls: usize,
    pub triangles: usize,
    pub lights: usize,
}

/// Walks a scene depth-first and replays it on a [`RenderBackend`].
pub struct SceneRenderer {
    config: RenderConfig,
}

impl SceneRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut RenderConfig {
        &mut self.config
    }

    /// Renders the subtree under `root` as if it were the whole scene.
    ///
    /// Camera and lights are resolved before anything reaches the backend.
    /// Once a frame has begun, `end_frame` is sent even when traversal fails.
    pub fn render<B: RenderBackend + ?Sized>(
        &self,
        scene: &Scene,
        root: NodeId,
        backend: &mut B,
    ) -> Result<FrameStats> {
        scene.get_node(root).ok_or(SceneError::UnknownNode(root))?;

        let to_root_frame = root_frame(scene, root)?;
        let (projection, view) = self.camera_matrices(scene, root, to_root_frame)?;
        let lights = collect_lights(scene, root, to_root_frame, view)?;

        backend.begin_frame((self.config.viewport_width, self.config.viewport_height));
        backend.clear(scene.environment.background);
        backend.set_global_ambient(scene.environment.global_ambient);
        backend.set_projection(projection);

        for (index, slot) in lights.iter().enumerate() {
            backend.set_light(index, slot.as_ref());
        }

        let mut traversal = Traversal {
            scene,
            config: &self.config,
            stack: MatrixStack::with_max_depth(view, self.config.max_stack_depth),
            backend: &mut *backend,
            stats: FrameStats {
                lights: lights.iter().flatten().count(),
                ..FrameStats::default()
            },
        };
        let result = traversal.visit(root);
        let stats = traversal.stats;

        backend.end_frame();
        result?;

        log::debug!(
            "Rendered frame: {} nodes, {} draw calls, {} triangles, {} lights",
            stats.nodes_visited,
            stats.draw_calls,
            stats.triangles,
            stats.lights
        );

        Ok(stats)
    }

    /// Projection and view for the camera resolved from `root`. The view
    /// undoes everything the camera node's ancestors below the render root's
    /// frame do to it.
    fn camera_matrices(
        &self,
        scene: &Scene,
        root: NodeId,
        to_root_frame: Mat4,
    ) -> Result<(Mat4, Mat4)> {
        let Some(camera_id) = scene.resolve_camera(root) else {
            log::debug!("No camera under {:?}, using identity projection", root);
            return Ok((Mat4::IDENTITY, Mat4::IDENTITY));
        };

        let camera = scene.camera(camera_id)?;
        let placement = to_root_frame * scene.world_matrix(camera_id)?;
        let inverse = try_inverse(&placement).ok_or(SceneError::SingularTransform(camera_id))?;

        let projection = camera.projection_matrix(self.config.aspect());
        let view = camera.view_matrix() * inverse;

        Ok((projection, view))
    }
}

/// Maps world space into the frame traversal starts from: the parent frame
/// of `root`. Identity for top-level roots.
fn root_frame(scene: &Scene, root: NodeId) -> Result<Mat4> {
    match scene.parent(root) {
        Some(parent_id) => {
            let parent_world = scene.world_matrix(parent_id)?;
            try_inverse(&parent_world).ok_or(SceneError::SingularTransform(parent_id))
        }
        None => Ok(Mat4::IDENTITY),
    }
}

/// Slot contents for every light index. Light nodes are taken in depth-first
/// order, so a later node overrides an earlier one with the same index.
fn collect_lights(
    scene: &Scene,
    root: NodeId,
    to_root_frame: Mat4,
    view: Mat4,
) -> Result<[Option<LightState>; MAX_LIGHTS]> {
    let mut slots: [Option<LightState>; MAX_LIGHTS] = [None; MAX_LIGHTS];
    let mut claimed: [Option<NodeId>; MAX_LIGHTS] = [None; MAX_LIGHTS];

    for id in scene.descendants(root) {
        let Ok(light) = scene.light(id) else {
            continue;
        };

        let index = light.index();
        if let Some(previous) = claimed[index] {
            log::warn!(
                "Light slot {} is used by both {:?} and {:?}, {:?} wins",
                index,
                previous,
                id,
                id
            );
        }
        claimed[index] = Some(id);

        slots[index] = if light.enabled {
            let eye_position = view * to_root_frame * scene.world_matrix(id)? * light.position;
            Some(light_state(light, eye_position))
        } else {
            None
        };
    }

    if claimed[0].is_none() && scene.environment.default_light {
        // The default light is defined directly in eye space
        let light = Light::new(0)?;
        slots[0] = Some(light_state(&light, light.position));
    }

    Ok(slots)
}

struct Traversal<'a, B: RenderBackend + ?Sized> {
    scene: &'a Scene,
    config: &'a RenderConfig,
    stack: MatrixStack,
    backend: &'a mut B,
    stats: FrameStats,
}

impl<B: RenderBackend + ?Sized> Traversal<'_, B> {
    fn visit(&mut self, id: NodeId) -> Result<()> {
        let scene = self.scene;
        let node = scene.get_node(id).ok_or(SceneError::UnknownNode(id))?;
        self.stats.nodes_visited += 1;

        self.stack.push()?;

        match node.kind() {
            NodeKind::Group => {
                for &child_id in node.child_ids() {
                    self.visit(child_id)?;
                }
            }
            NodeKind::Transform(transform) => {
                self.stack.multiply(transform.local_matrix());

                for &child_id in node.child_ids() {
                    self.visit(child_id)?;
                }
            }
            NodeKind::Model { .. } | NodeKind::Polyhedron { .. } => self.draw_mesh(id, node),
            // Placed before geometry traversal
            NodeKind::Camera(_) | NodeKind::Light(_) => {}
        }

        self.stack.pop()
    }

    fn draw_mesh(&mut self, id: NodeId, node: &Node) {
        let scene = self.scene;
        let Some(mesh) = node.kind().mesh().and_then(|mesh_id| scene.mesh(mesh_id)) else {
            log::warn!("Node {:?} refers to a missing mesh", id);
            return;
        };

        self.stack.scale(Vec3::splat(self.config.model_scale));

        self.backend.draw(&DrawCall {
            node: id,
            model_view: self.stack.top(),
            color: node.color,
            mesh,
            mode: DrawMode::Fill,
            polygon_offset: true,
        });
        self.stats.draw_calls += 1;
        self.stats.triangles += mesh.triangle_count();

        if let Some(line_color) = node.line_color {
            self.backend.draw(&DrawCall {
                node: id,
                model_view: self.stack.top(),
                color: line_color,
                mesh,
                mode: DrawMode::Outline,
                polygon_offset: false,
            });
            self.stats.draw_calls += 1;
        }
    }
}

fn light_state(light: &Light, eye_position: Vec4) -> LightState {
    LightState {
        ambient: light.ambient,
        diffuse: light.diffuse,
        specular: light.specular,
        eye_position,
    }
}
