pub mod backend;
pub mod config;
pub mod renderer;
pub mod software;

pub use backend::{
    CommandRecorder, DrawCall, DrawMode, LightState, RenderBackend, RenderCommand,
};
pub use config::{ConfigError, PolygonOffset, RenderConfig};
pub use renderer::{FrameStats, SceneRenderer};
pub use software::SoftwareRasterizer;
