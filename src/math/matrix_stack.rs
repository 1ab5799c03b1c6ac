use glam::{Mat4, Vec3};

use crate::error::{Result, SceneError};

/// Save/restore stack of transformation matrices.
///
/// The current matrix is not part of the saved list: `push` copies it and
/// `pop` replaces it with the most recent copy, like `glPushMatrix` and
/// `glPopMatrix`.
#[derive(Debug, Clone)]
pub struct MatrixStack {
    current: Mat4,
    saved: Vec<Mat4>,
    max_depth: usize,
}

impl MatrixStack {
    pub const DEFAULT_MAX_DEPTH: usize = 32;

    pub fn new(initial: Mat4) -> Self {
        Self::with_max_depth(initial, Self::DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(initial: Mat4, max_depth: usize) -> Self {
        Self {
            current: initial,
            saved: Vec::with_capacity(max_depth.min(64)),
            max_depth,
        }
    }

    pub fn top(&self) -> Mat4 {
        self.current
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn push(&mut self) -> Result<()> {
        if self.saved.len() >= self.max_depth {
            return Err(SceneError::StackOverflow(self.max_depth));
        }

        self.saved.push(self.current);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<()> {
        self.current = self.saved.pop().ok_or(SceneError::StackUnderflow)?;
        Ok(())
    }

    pub fn load(&mut self, matrix: Mat4) {
        self.current = matrix;
    }

    pub fn multiply(&mut self, matrix: Mat4) {
        self.current *= matrix;
    }

    pub fn translate(&mut self, translation: Vec3) {
        self.multiply(Mat4::from_translation(translation));
    }

    pub fn scale(&mut self, scale: Vec3) {
        self.multiply(Mat4::from_scale(scale));
    }

    /// Zero angles and zero axes leave the matrix unchanged.
    pub fn rotate_degrees(&mut self, angle: f32, axis: Vec3) {
        if let Some(rotation) = rotation_degrees(angle, axis) {
            self.multiply(rotation);
        }
    }
}

pub(crate) fn rotation_degrees(angle: f32, axis: Vec3) -> Option<Mat4> {
    if angle == 0.0 {
        return None;
    }

    let axis = axis.try_normalize()?;
    Some(Mat4::from_axis_angle(axis, angle.to_radians()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn pop_restores_pushed_matrix() {
        let mut stack = MatrixStack::new(Mat4::IDENTITY);

        stack.translate(Vec3::X);
        stack.push().unwrap();
        stack.scale(Vec3::splat(2.0));
        stack.translate(Vec3::Y);

        assert_relative_eq!(
            stack.top().transform_point3(Vec3::ZERO),
            Vec3::new(1.0, 2.0, 0.0)
        );

        stack.pop().unwrap();

        assert_eq!(stack.top(), Mat4::from_translation(Vec3::X));
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn pop_without_push_underflows() {
        let mut stack = MatrixStack::new(Mat4::IDENTITY);

        assert!(matches!(stack.pop(), Err(SceneError::StackUnderflow)));
    }

    #[test]
    fn push_beyond_max_depth_overflows() {
        let mut stack = MatrixStack::with_max_depth(Mat4::IDENTITY, 2);

        stack.push().unwrap();
        stack.push().unwrap();

        assert!(matches!(stack.push(), Err(SceneError::StackOverflow(2))));
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn rotation_with_zero_axis_is_ignored() {
        let mut stack = MatrixStack::new(Mat4::IDENTITY);

        stack.rotate_degrees(90.0, Vec3::ZERO);
        assert_eq!(stack.top(), Mat4::IDENTITY);

        stack.rotate_degrees(90.0, Vec3::new(0.0, 0.0, 5.0));
        assert_relative_eq!(
            stack.top().transform_point3(Vec3::X),
            Vec3::Y,
            epsilon = 1e-6
        );
    }
}
