use glam::{Mat4, Vec3, Vec4};

use crate::model::Mesh;
use crate::scene_graph::{NodeId, MAX_LIGHTS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    Fill,
    Outline,
}

/// Light slot parameters with the position already in eye space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightState {
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    pub eye_position: Vec4,
}

pub struct DrawCall<'a> {
    pub node: NodeId,
    pub model_view: Mat4,
    pub color: Vec3,
    pub mesh: &'a Mesh,
    pub mode: DrawMode,
    pub polygon_offset: bool,
}

/// Fixed-function style target of scene traversal.
pub trait RenderBackend {
    fn begin_frame(&mut self, _viewport: (u32, u32)) {}

    fn clear(&mut self, color: Vec4);

    fn set_global_ambient(&mut self, ambient: Vec4);

    /// `None` disables the slot.
    fn set_light(&mut self, index: usize, light: Option<&LightState>);

    fn set_projection(&mut self, projection: Mat4);

    fn draw(&mut self, call: &DrawCall<'_>);

    fn end_frame(&mut self) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    BeginFrame {
        viewport: (u32, u32),
    },
    Clear(Vec4),
    SetGlobalAmbient(Vec4),
    SetLight {
        index: usize,
        light: Option<LightState>,
    },
    SetProjection(Mat4),
    Draw {
        node: NodeId,
        mesh: String,
        model_view: Mat4,
        color: Vec3,
        mode: DrawMode,
        polygon_offset: bool,
        triangles: usize,
    },
    EndFrame,
}

/// Backend that keeps every command it receives.
#[derive(Debug, Default)]
pub struct CommandRecorder {
    pub commands: Vec<RenderCommand>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn draws(&self) -> impl Iterator<Item = &RenderCommand> + '_ {
        self.commands
            .iter()
            .filter(|command| matches!(command, RenderCommand::Draw { .. }))
    }

    /// Enabled lights from the most recent frame, by slot.
    pub fn enabled_lights(&self) -> [Option<LightState>; MAX_LIGHTS] {
        let mut lights = [None; MAX_LIGHTS];

        for command in &self.commands {
            match command {
                RenderCommand::BeginFrame { .. } => lights = [None; MAX_LIGHTS],
                RenderCommand::SetLight { index, light } => lights[*index] = *light,
                _ => {}
            }
        }

        lights
    }

    pub fn log_commands(&self) {
        for command in &self.commands {
            log::debug!("{:?}", command);
        }
    }
}

impl RenderBackend for CommandRecorder {
    fn begin_frame(&mut self, viewport: (u32, u32)) {
        self.commands.push(RenderCommand::BeginFrame { viewport });
    }

    fn clear(&mut self, color: Vec4) {
        self.commands.push(RenderCommand::Clear(color));
    }

    fn set_global_ambient(&mut self, ambient: Vec4) {
        self.commands.push(RenderCommand::SetGlobalAmbient(ambient));
    }

    fn set_light(&mut self, index: usize, light: Option<&LightState>) {
        self.commands.push(RenderCommand::SetLight {
            index,
            light: light.copied(),
        });
    }

    fn set_projection(&mut self, projection: Mat4) {
        self.commands.push(RenderCommand::SetProjection(projection));
    }

    fn draw(&mut self, call: &DrawCall<'_>) {
        let triangles = match call.mode {
            DrawMode::Fill => call.mesh.triangle_count(),
            DrawMode::Outline => 0,
        };

        self.commands.push(RenderCommand::Draw {
            node: call.node,
            mesh: call.mesh.name.clone(),
            model_view: call.model_view,
            color: call.color,
            mode: call.mode,
            polygon_offset: call.polygon_offset,
            triangles,
        });
    }

    fn end_frame(&mut self) {
        self.commands.push(RenderCommand::EndFrame);
    }
}
