//! Viewing volume and viewpoint of a camera node.
//!
//! The view volume is given as limits around the centre of view, the way the
//! fixed-function `Camera` helper did it: x and y limits are measured in the
//! plane through the centre, z limits along the viewing direction.

use glam::{vec3, Mat4, Quat, Vec2, Vec3};

use crate::math::Frustum;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    pub xmin: f32,
    pub xmax: f32,
    pub ymin: f32,
    pub ymax: f32,
    pub zmin: f32,
    pub zmax: f32,
}

impl Limits {
    pub fn from_scale(limit: f32) -> Self {
        Self {
            xmin: -limit,
            xmax: limit,
            ymin: -limit,
            ymax: limit,
            zmin: -2.0 * limit,
            zmax: 2.0 * limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub center: Vec3,
    pub up: Vec3,
    limits: Limits,
    pub orthographic: bool,
    pub preserve_aspect: bool,
    pub trackball: Trackball,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: vec3(0.0, 0.0, 20.0),
            center: Vec3::ZERO,
            up: Vec3::Y,
            limits: Limits::from_scale(10.0),
            orthographic: false,
            preserve_aspect: true,
            trackball: Trackball::default(),
        }
    }
}

impl Camera {
    pub fn look_at(&mut self, eye: Vec3, center: Vec3, up: Vec3) -> &mut Self {
        self.eye = eye;
        self.center = center;
        self.up = up;
        self
    }

    pub fn set_scale(&mut self, limit: f32) -> &mut Self {
        self.limits = Limits::from_scale(limit);
        self
    }

    pub fn set_limits(&mut self, limits: Limits) -> &mut Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn set_orthographic(&mut self, orthographic: bool) -> &mut Self {
        self.orthographic = orthographic;
        self
    }

    pub fn set_preserve_aspect(&mut self, preserve_aspect: bool) -> &mut Self {
        self.preserve_aspect = preserve_aspect;
        self
    }

    pub fn view_distance(&self) -> f32 {
        (self.eye - self.center).length()
    }

    /// Eye-space view volume for a viewport of the given width / height.
    pub fn frustum(&self, aspect: f32) -> Frustum {
        let Limits {
            mut xmin,
            mut xmax,
            mut ymin,
            mut ymax,
            zmin,
            zmax,
        } = self.limits;

        if self.preserve_aspect && aspect > 0.0 {
            let width = xmax - xmin;
            let height = ymax - ymin;

            // Widen whichever axis is short for the viewport
            if aspect > width / height {
                let extra = (aspect * height - width) / 2.0;
                xmin -= extra;
                xmax += extra;
            } else {
                let extra = (width / aspect - height) / 2.0;
                ymin -= extra;
                ymax += extra;
            }
        }

        let distance = self.view_distance();
        let near = distance - zmax;
        let far = distance - zmin;

        if self.orthographic {
            return Frustum {
                left: xmin,
                right: xmax,
                bottom: ymin,
                top: ymax,
                near,
                far,
            };
        }

        let near = near.max(0.1 * distance).max(1e-3);
        let far = far.max(near * 2.0);
        // Limits describe the plane through the centre of view
        let ratio = if distance > 0.0 { near / distance } else { 1.0 };

        Frustum {
            left: xmin * ratio,
            right: xmax * ratio,
            bottom: ymin * ratio,
            top: ymax * ratio,
            near,
            far,
        }
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        let frustum = self.frustum(aspect);

        if self.orthographic {
            frustum.orthographic_matrix()
        } else {
            frustum.perspective_matrix()
        }
    }

    /// Look-at matrix with the trackball rotation applied about the centre.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.center, self.up)
            * Mat4::from_translation(self.center)
            * Mat4::from_quat(self.trackball.rotation())
            * Mat4::from_translation(-self.center)
    }
}

/// Virtual trackball turning pointer drags into rotations.
///
/// Points are in normalized viewport coordinates: `[-1, 1]` on both axes,
/// y pointing up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trackball {
    rotation: Quat,
}

impl Default for Trackball {
    fn default() -> Self {
        Self {
            rotation: Quat::IDENTITY,
        }
    }
}

impl Trackball {
    // Sphere near the middle, hyperbolic sheet towards the edges
    fn project(point: Vec2) -> Vec3 {
        let distance_squared = point.length_squared();

        let z = if distance_squared <= 0.5 {
            (1.0 - distance_squared).sqrt()
        } else {
            0.5 / distance_squared.sqrt()
        };

        point.extend(z).normalize()
    }

    pub fn drag(&mut self, from: Vec2, to: Vec2) {
        let start = Self::project(from);
        let end = Self::project(to);
        let axis = start.cross(end);

        if axis.length_squared() < 1e-12 {
            return;
        }

        let angle = start.dot(end).clamp(-1.0, 1.0).acos();
        self.rotation = (Quat::from_axis_angle(axis.normalize(), angle) * self.rotation).normalize();
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn reset(&mut self) {
        self.rotation = Quat::IDENTITY;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_camera_sees_scale_limits_at_center() {
        let camera = Camera::default();
        let view_projection = camera.projection_matrix(1.0) * camera.view_matrix();

        // The corner of the limits window lands on the corner of clip space
        let corner = view_projection.project_point3(vec3(10.0, 10.0, 0.0));
        assert_relative_eq!(corner.x, 1.0, epsilon = 1e-4);
        assert_relative_eq!(corner.y, 1.0, epsilon = 1e-4);

        let frustum = camera.frustum(1.0);
        assert_relative_eq!(frustum.near, 2.0);
        assert_relative_eq!(frustum.far, 40.0);
    }

    #[test]
    fn preserve_aspect_widens_short_axis() {
        let mut camera = Camera::default();
        camera.set_orthographic(true);

        let wide = camera.frustum(2.0);
        assert_relative_eq!(wide.right, 20.0);
        assert_relative_eq!(wide.top, 10.0);

        let tall = camera.frustum(0.5);
        assert_relative_eq!(tall.right, 10.0);
        assert_relative_eq!(tall.top, 20.0);

        camera.set_preserve_aspect(false);
        let stretched = camera.frustum(2.0);
        assert_relative_eq!(stretched.right, 10.0);
    }

    #[test]
    fn orthographic_near_far_follow_view_distance() {
        let mut camera = Camera::default();
        camera.set_orthographic(true).set_scale(5.0);

        let frustum = camera.frustum(1.0);
        assert_relative_eq!(frustum.near, 10.0);
        assert_relative_eq!(frustum.far, 30.0);
    }

    #[test]
    fn view_looks_from_eye_to_center() {
        let mut camera = Camera::default();
        camera.look_at(vec3(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);

        let center_in_eye_space = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert_relative_eq!(center_in_eye_space, vec3(0.0, 0.0, -5.0), epsilon = 1e-6);
    }

    #[test]
    fn trackball_drag_rotates_towards_pointer() {
        let mut trackball = Trackball::default();
        trackball.drag(Vec2::ZERO, Vec2::new(0.5, 0.0));

        let rotated = trackball.rotation() * Vec3::Z;
        let expected = Vec3::new(0.5, 0.0, 0.75_f32.sqrt());
        assert_relative_eq!(rotated, expected, epsilon = 1e-5);

        trackball.reset();
        assert_eq!(trackball.rotation(), Quat::IDENTITY);
    }

    #[test]
    fn zero_length_drag_is_ignored() {
        let mut trackball = Trackball::default();
        trackball.drag(Vec2::new(0.3, 0.3), Vec2::new(0.3, 0.3));

        assert_eq!(trackball.rotation(), Quat::IDENTITY);
    }
}
