use glam::{vec4, Vec4};

use crate::error::{Result, SceneError};

/// Number of fixed-function light slots.
pub const MAX_LIGHTS: usize = 8;

/// Parameters of one light slot. Slot 0 is the default light; slots 1-7 are
/// free for the scene.
///
/// `position` is in the light node's coordinate frame. A `w` of zero makes
/// the light directional.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    index: usize,
    pub enabled: bool,
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    pub position: Vec4,
}

impl Light {
    pub fn new(index: usize) -> Result<Self> {
        if index >= MAX_LIGHTS {
            return Err(SceneError::InvalidLightIndex(index));
        }

        // Only the default light starts out white
        let (diffuse, specular) = if index == 0 {
            (Vec4::ONE, Vec4::ONE)
        } else {
            (Vec4::W, Vec4::W)
        };

        Ok(Self {
            index,
            enabled: true,
            ambient: Vec4::W,
            diffuse,
            specular,
            position: Vec4::Z,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn set_ambient(&mut self, r: f32, g: f32, b: f32, a: f32) -> &mut Self {
        self.ambient = vec4(r, g, b, a);
        self
    }

    pub fn set_diffuse(&mut self, r: f32, g: f32, b: f32, a: f32) -> &mut Self {
        self.diffuse = vec4(r, g, b, a);
        self
    }

    pub fn set_specular(&mut self, r: f32, g: f32, b: f32, a: f32) -> &mut Self {
        self.specular = vec4(r, g, b, a);
        self
    }

    pub fn set_position(&mut self, x: f32, y: f32, z: f32, w: f32) -> &mut Self {
        self.position = vec4(x, y, z, w);
        self
    }

    pub fn is_directional(&self) -> bool {
        self.position.w == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_light_is_white_and_directional() {
        let light = Light::new(0).unwrap();

        assert_eq!(light.diffuse, Vec4::ONE);
        assert_eq!(light.specular, Vec4::ONE);
        assert_eq!(light.ambient, vec4(0.0, 0.0, 0.0, 1.0));
        assert!(light.is_directional());
        assert!(light.enabled);
    }

    #[test]
    fn other_lights_start_dark() {
        let light = Light::new(3).unwrap();

        assert_eq!(light.index(), 3);
        assert_eq!(light.diffuse, vec4(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn rejects_out_of_range_index() {
        assert!(matches!(
            Light::new(MAX_LIGHTS),
            Err(SceneError::InvalidLightIndex(8))
        ));
    }

    #[test]
    fn setters_chain() {
        let mut light = Light::new(1).unwrap();
        light
            .set_diffuse(1.0, 0.5, 0.25, 1.0)
            .set_position(0.0, 10.0, 0.0, 1.0);

        assert_eq!(light.diffuse, vec4(1.0, 0.5, 0.25, 1.0));
        assert!(!light.is_directional());
    }
}
