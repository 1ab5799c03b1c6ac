use glam::Mat4;

pub mod bounds;
pub mod frustum;
pub mod matrix_stack;

pub use bounds::Aabb;
pub use frustum::Frustum;
pub use matrix_stack::MatrixStack;

/// Inverse of `matrix`, or `None` when it has no finite inverse. Tiny but
/// non-zero scales are still invertible.
pub fn try_inverse(matrix: &Mat4) -> Option<Mat4> {
    if matrix.determinant() == 0.0 {
        return None;
    }

    let inverse = matrix.inverse();
    inverse.is_finite().then_some(inverse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec3;

    #[test]
    fn small_uniform_scale_is_invertible() {
        let matrix = Mat4::from_scale(Vec3::splat(0.004));

        let inverse = try_inverse(&matrix).unwrap();
        assert_relative_eq!(inverse * matrix, Mat4::IDENTITY, epsilon = 1e-4);
    }

    #[test]
    fn flattened_matrix_has_no_inverse() {
        assert!(try_inverse(&Mat4::from_scale(Vec3::new(0.0, 1.0, 1.0))).is_none());
        assert!(try_inverse(&Mat4::ZERO).is_none());
    }
}
