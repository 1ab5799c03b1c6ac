use glam::{vec4, Mat4, Vec3, Vec4Swizzles};

/// View volume in eye space, in the `glFrustum`/`glOrtho` parameter order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl Frustum {
    pub fn perspective_matrix(&self) -> Mat4 {
        let Frustum {
            left,
            right,
            bottom,
            top,
            near,
            far,
        } = *self;

        Mat4::from_cols(
            vec4(2.0 * near / (right - left), 0.0, 0.0, 0.0),
            vec4(0.0, 2.0 * near / (top - bottom), 0.0, 0.0),
            vec4(
                (right + left) / (right - left),
                (top + bottom) / (top - bottom),
                -(far + near) / (far - near),
                -1.0,
            ),
            vec4(0.0, 0.0, -2.0 * far * near / (far - near), 0.0),
        )
    }

    pub fn orthographic_matrix(&self) -> Mat4 {
        Mat4::orthographic_rh_gl(
            self.left,
            self.right,
            self.bottom,
            self.top,
            self.near,
            self.far,
        )
    }

    /// Eye-space corners of the volume described by `projection`.
    pub fn corners(projection: Mat4) -> [Vec3; 8] {
        let corners: [glam::Vec4; 8] = [
            // Left - Bottom - Near
            vec4(-1.0, -1.0, -1.0, 1.0),
            // Right - Bottom - Near
            vec4(1.0, -1.0, -1.0, 1.0),
            // Left - Top - Near
            vec4(-1.0, 1.0, -1.0, 1.0),
            // Right - Top - Near
            vec4(1.0, 1.0, -1.0, 1.0),
            // Left - Bottom - Far
            vec4(-1.0, -1.0, 1.0, 1.0),
            // Right - Bottom - Far
            vec4(1.0, -1.0, 1.0, 1.0),
            // Left - Top - Far
            vec4(-1.0, 1.0, 1.0, 1.0),
            // Right - Top - Far
            vec4(1.0, 1.0, 1.0, 1.0),
        ];

        let inverse = projection.inverse();

        corners.map(|corner| {
            let mut corner = inverse * corner;
            corner = corner / corner.w;
            corner.xyz()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn perspective_corners_match_parameters() {
        let frustum = Frustum {
            left: -1.0,
            right: 1.0,
            bottom: -0.5,
            top: 0.5,
            near: 2.0,
            far: 10.0,
        };

        let corners = Frustum::corners(frustum.perspective_matrix());

        assert_relative_eq!(corners[0], Vec3::new(-1.0, -0.5, -2.0), epsilon = 1e-4);
        assert_relative_eq!(corners[3], Vec3::new(1.0, 0.5, -2.0), epsilon = 1e-4);
        // Far plane is scaled by far / near
        assert_relative_eq!(corners[7], Vec3::new(5.0, 2.5, -10.0), epsilon = 1e-3);
    }

    #[test]
    fn orthographic_corners_match_parameters() {
        let frustum = Frustum {
            left: -3.0,
            right: 3.0,
            bottom: -2.0,
            top: 2.0,
            near: -1.0,
            far: 1.0,
        };

        let corners = Frustum::corners(frustum.orthographic_matrix());

        assert_relative_eq!(corners[0], Vec3::new(-3.0, -2.0, 1.0), epsilon = 1e-5);
        assert_relative_eq!(corners[7], Vec3::new(3.0, 2.0, -1.0), epsilon = 1e-5);
    }
}
