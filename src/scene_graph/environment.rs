use glam::{vec4, Vec4};

/// Scene-wide render state: what the frame is cleared to and the light that
/// exists regardless of light nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    pub background: Vec4,
    pub global_ambient: Vec4,
    /// Enables slot 0 with its default parameters when no light node uses it
    pub default_light: bool,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            background: vec4(0.0, 0.0, 0.0, 1.0),
            global_ambient: vec4(0.2, 0.2, 0.2, 1.0),
            default_light: true,
        }
    }
}

impl Environment {
    pub fn set_background(&mut self, r: f32, g: f32, b: f32, a: f32) -> &mut Self {
        self.background = vec4(r, g, b, a);
        self
    }

    pub fn set_global_ambient(&mut self, r: f32, g: f32, b: f32, a: f32) -> &mut Self {
        self.global_ambient = vec4(r, g, b, a);
        self
    }
}
