use std::cell::Cell;

use glam::{Mat4, Vec3};

use crate::math::matrix_stack::rotation_degrees;

/// Local transform of a transform node: translate, then scale, then rotate.
#[derive(Debug, Clone)]
pub struct Transform {
    translation: Vec3,
    scale: Vec3,
    rotation_degrees: f32,
    rotation_axis: Vec3,

    local_matrix: Cell<Mat4>,
    local_dirty: Cell<bool>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            translation: Vec3::ZERO,
            scale: Vec3::ONE,
            rotation_degrees: 0.0,
            rotation_axis: Vec3::ZERO,
            local_matrix: Cell::new(Mat4::IDENTITY),
            local_dirty: Cell::new(false),
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        let mut transform = Self::identity();
        transform.set_translation(translation);
        transform
    }

    pub fn local_matrix(&self) -> Mat4 {
        if self.local_dirty.get() {
            let mut matrix = Mat4::from_translation(self.translation) * Mat4::from_scale(self.scale);

            if let Some(rotation) = rotation_degrees(self.rotation_degrees, self.rotation_axis) {
                matrix *= rotation;
            }

            self.local_matrix.set(matrix);
            self.local_dirty.set(false);
        }

        self.local_matrix.get()
    }

    fn invalidate_local(&self) {
        self.local_dirty.set(true);
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
        self.invalidate_local();
    }

    pub fn translate(&mut self, delta: Vec3) {
        self.translation += delta;
        self.invalidate_local();
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.invalidate_local();
    }

    pub fn set_uniform_scale(&mut self, scale: f32) {
        self.set_scale(Vec3::splat(scale));
    }

    /// Rotation of `angle` degrees about `axis`. A zero angle or a zero axis
    /// means no rotation.
    pub fn set_rotation(&mut self, angle: f32, axis: Vec3) {
        self.rotation_degrees = angle;
        self.rotation_axis = axis;
        self.invalidate_local();
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn rotation(&self) -> (f32, Vec3) {
        (self.rotation_degrees, self.rotation_axis)
    }
}
