//! CPU implementation of [`RenderBackend`] writing into an RGBA image.
//!
//! Lighting follows the fixed-function model with color material: the node
//! color is used as ambient and diffuse reflectance, specular reflectance is
//! black. Lighting is evaluated per vertex and interpolated across
//! triangles. Triangles with a vertex behind the eye are skipped rather than
//! clipped.

use std::path::Path;

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4, Vec4Swizzles};
use image::{ImageResult, Rgba, RgbaImage};

use crate::rendering::backend::{DrawCall, DrawMode, LightState, RenderBackend};
use crate::rendering::config::PolygonOffset;
use crate::scene_graph::MAX_LIGHTS;

/// Smallest depth difference treated as resolvable, for polygon offset units.
const DEPTH_UNIT: f32 = 1.0 / (1 << 16) as f32;
const MIN_CLIP_W: f32 = 1e-5;

#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    position: Vec2,
    depth: f32,
    color: Vec3,
}

pub struct SoftwareRasterizer {
    color: RgbaImage,
    depth: Vec<f32>,
    projection: Mat4,
    global_ambient: Vec4,
    lights: [Option<LightState>; MAX_LIGHTS],
    polygon_offset: PolygonOffset,
}

impl SoftwareRasterizer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            color: RgbaImage::new(width, height),
            depth: vec![f32::INFINITY; pixel_count(width, height)],
            projection: Mat4::IDENTITY,
            global_ambient: Vec4::ZERO,
            lights: [None; MAX_LIGHTS],
            polygon_offset: PolygonOffset::default(),
        }
    }

    pub fn with_polygon_offset(mut self, polygon_offset: PolygonOffset) -> Self {
        self.polygon_offset = polygon_offset;
        self
    }

    pub fn width(&self) -> u32 {
        self.color.width()
    }

    pub fn height(&self) -> u32 {
        self.color.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.color
    }

    pub fn into_image(self) -> RgbaImage {
        self.color
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.color.get_pixel(x, y).0
    }

    pub fn save(&self, path: impl AsRef<Path>) -> ImageResult<()> {
        self.color.save(path)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.color = RgbaImage::new(width, height);
        self.depth = vec![f32::INFINITY; pixel_count(width, height)];
    }

    fn shade(&self, eye_position: Vec3, normal: Vec3, material: Vec3) -> Vec3 {
        let mut color = self.global_ambient.xyz() * material;

        for light in self.lights.iter().flatten() {
            let to_light = if light.eye_position.w == 0.0 {
                light.eye_position.xyz().normalize_or_zero()
            } else {
                (light.eye_position.xyz() / light.eye_position.w - eye_position).normalize_or_zero()
            };

            let diffuse = normal.dot(to_light).max(0.0);
            color += light.ambient.xyz() * material + light.diffuse.xyz() * material * diffuse;
        }

        color.clamp(Vec3::ZERO, Vec3::ONE)
    }

    /// Window coordinates, or `None` when the point is behind the eye.
    fn to_screen(&self, clip: Vec4) -> Option<(Vec2, f32)> {
        if clip.w <= MIN_CLIP_W {
            return None;
        }

        let ndc = clip.xyz() / clip.w;
        let position = Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.width() as f32,
            (1.0 - ndc.y) * 0.5 * self.height() as f32,
        );

        Some((position, (ndc.z + 1.0) * 0.5))
    }

    fn fill(&mut self, call: &DrawCall<'_>) {
        let model_view = call.model_view;
        let normal_matrix = normal_matrix(&model_view);

        for triangle in call.mesh.triangles() {
            let mut screen = [None; 3];

            for (slot, vertex) in screen.iter_mut().zip(triangle) {
                let eye = model_view * vertex.position.extend(1.0);
                let normal = (normal_matrix * vertex.normal).normalize_or_zero();
                let color = self.shade(eye.xyz(), normal, call.color);

                *slot = self
                    .to_screen(self.projection * eye)
                    .map(|(position, depth)| ScreenVertex {
                        position,
                        depth,
                        color,
                    });
            }

            if let [Some(a), Some(b), Some(c)] = screen {
                self.rasterize_triangle([a, b, c], call.polygon_offset);
            }
        }
    }

    fn rasterize_triangle(&mut self, [a, b, c]: [ScreenVertex; 3], polygon_offset: bool) {
        let area = edge(a.position, b.position, c.position);
        if area.abs() < 1e-8 {
            return;
        }

        let bias = if polygon_offset {
            // Depth slope from the plane equation of the triangle
            let ab = b.position - a.position;
            let ac = c.position - a.position;
            let dz_ab = b.depth - a.depth;
            let dz_ac = c.depth - a.depth;
            let dzdx = (dz_ab * ac.y - dz_ac * ab.y) / area;
            let dzdy = (dz_ac * ab.x - dz_ab * ac.x) / area;

            self.polygon_offset.factor * dzdx.abs().max(dzdy.abs())
                + self.polygon_offset.units * DEPTH_UNIT
        } else {
            0.0
        };

        let width = self.width() as i64;
        let height = self.height() as i64;
        let min = a.position.min(b.position).min(c.position).floor();
        let max = a.position.max(b.position).max(c.position).ceil();

        let x_range = (min.x as i64).max(0)..(max.x as i64).min(width);
        let y_range = (min.y as i64).max(0)..(max.y as i64).min(height);

        for y in y_range {
            for x in x_range.clone() {
                let point = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let wa = edge(b.position, c.position, point) / area;
                let wb = edge(c.position, a.position, point) / area;
                let wc = edge(a.position, b.position, point) / area;

                if wa < 0.0 || wb < 0.0 || wc < 0.0 {
                    continue;
                }

                let depth = wa * a.depth + wb * b.depth + wc * c.depth;
                if !(0.0..=1.0).contains(&depth) {
                    continue;
                }

                let color = a.color * wa + b.color * wb + c.color * wc;
                self.write_pixel(x as u32, y as u32, depth + bias, color);
            }
        }
    }

    fn outline(&mut self, call: &DrawCall<'_>) {
        for [start, end] in &call.mesh.edges {
            let project = |point: Vec3| {
                self.to_screen(self.projection * call.model_view * point.extend(1.0))
            };

            let (Some((from, from_depth)), Some((to, to_depth))) = (project(*start), project(*end))
            else {
                continue;
            };

            let steps = (to - from).abs().max_element().ceil().max(1.0) as usize;

            for step in 0..=steps {
                let t = step as f32 / steps as f32;
                let point = from.lerp(to, t);
                let depth = from_depth + (to_depth - from_depth) * t;

                if point.x < 0.0 || point.y < 0.0 || !(0.0..=1.0).contains(&depth) {
                    continue;
                }

                let (x, y) = (point.x as u32, point.y as u32);
                if x < self.width() && y < self.height() {
                    self.write_pixel(x, y, depth, call.color);
                }
            }
        }
    }

    fn write_pixel(&mut self, x: u32, y: u32, depth: f32, color: Vec3) {
        let index = y as usize * self.width() as usize + x as usize;

        if depth <= self.depth[index] {
            self.depth[index] = depth;
            self.color.put_pixel(x, y, to_rgba(color.extend(1.0)));
        }
    }
}

impl RenderBackend for SoftwareRasterizer {
    fn begin_frame(&mut self, (width, height): (u32, u32)) {
        if width != self.width() || height != self.height() {
            log::debug!("Resizing software framebuffer to {}x{}", width, height);
            self.resize(width, height);
        }
    }

    fn clear(&mut self, color: Vec4) {
        let pixel = to_rgba(color);

        for target in self.color.pixels_mut() {
            *target = pixel;
        }
        self.depth.fill(f32::INFINITY);
    }

    fn set_global_ambient(&mut self, ambient: Vec4) {
        self.global_ambient = ambient;
    }

    fn set_light(&mut self, index: usize, light: Option<&LightState>) {
        if let Some(slot) = self.lights.get_mut(index) {
            *slot = light.copied();
        }
    }

    fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    fn draw(&mut self, call: &DrawCall<'_>) {
        match call.mode {
            DrawMode::Fill => self.fill(call),
            DrawMode::Outline => self.outline(call),
        }
    }
}

fn normal_matrix(model_view: &Mat4) -> Mat3 {
    let linear = Mat3::from_mat4(*model_view);

    if linear.determinant().abs() <= f32::EPSILON {
        linear
    } else {
        linear.inverse().transpose()
    }
}

fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

fn edge(a: Vec2, b: Vec2, point: Vec2) -> f32 {
    (b.x - a.x) * (point.y - a.y) - (b.y - a.y) * (point.x - a.x)
}

fn to_rgba(color: Vec4) -> Rgba<u8> {
    let [r, g, b, a] = color
        .clamp(Vec4::ZERO, Vec4::ONE)
        .to_array()
        .map(|channel| (channel * 255.0).round() as u8);

    Rgba([r, g, b, a])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Mesh, Vertex};
    use crate::scene_graph::Scene;
    use glam::vec4;

    fn triangle(z: f32) -> Mesh {
        let vertex = |x: f32, y: f32| Vertex::new(Vec3::new(x, y, z), Vec3::Z, Vec2::ZERO);
        Mesh::triangle_list(
            "triangle",
            vec![vertex(-1.0, -1.0), vertex(3.0, -1.0), vertex(-1.0, 3.0)],
            Vec::new(),
        )
    }

    fn draw(rasterizer: &mut SoftwareRasterizer, mesh: &Mesh, color: Vec3) {
        let mut scene = Scene::new();
        let node = scene.add_node(crate::scene_graph::Node::new(
            crate::scene_graph::NodeKind::Group,
        ));

        rasterizer.draw(&DrawCall {
            node,
            model_view: Mat4::IDENTITY,
            color,
            mesh,
            mode: DrawMode::Fill,
            polygon_offset: false,
        });
    }

    #[test]
    fn clear_fills_every_pixel() {
        let mut rasterizer = SoftwareRasterizer::new(4, 3);
        rasterizer.clear(vec4(1.0, 0.0, 0.0, 1.0));

        assert!(rasterizer
            .image()
            .pixels()
            .all(|pixel| pixel.0 == [255, 0, 0, 255]));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn pixel_count_does_not_wrap_in_u32() {
        assert_eq!(pixel_count(70_000, 70_000), 4_900_000_000);
    }

    #[test]
    fn begin_frame_resizes_target() {
        let mut rasterizer = SoftwareRasterizer::new(4, 4);
        rasterizer.begin_frame((16, 8));

        assert_eq!(rasterizer.width(), 16);
        assert_eq!(rasterizer.height(), 8);
    }

    #[test]
    fn lit_triangle_uses_ambient_and_diffuse() {
        let mut rasterizer = SoftwareRasterizer::new(8, 8);
        rasterizer.clear(Vec4::ZERO);
        rasterizer.set_global_ambient(vec4(0.2, 0.2, 0.2, 1.0));

        // Without lights only the global ambient term remains
        draw(&mut rasterizer, &triangle(0.0), Vec3::ONE);
        assert_eq!(rasterizer.pixel(4, 4), [51, 51, 51, 255]);

        rasterizer.set_light(
            0,
            Some(&LightState {
                ambient: Vec4::W,
                diffuse: vec4(0.6, 0.6, 0.6, 1.0),
                specular: Vec4::ONE,
                eye_position: Vec4::Z,
            }),
        );
        rasterizer.clear(Vec4::ZERO);
        draw(&mut rasterizer, &triangle(0.0), Vec3::new(1.0, 0.0, 0.0));

        // 0.2 ambient + 0.6 diffuse facing the light
        assert_eq!(rasterizer.pixel(4, 4), [204, 0, 0, 255]);
    }

    #[test]
    fn nearer_triangle_wins_depth_test() {
        let mut rasterizer = SoftwareRasterizer::new(8, 8);
        rasterizer.clear(Vec4::ZERO);
        rasterizer.set_global_ambient(Vec4::ONE);

        draw(&mut rasterizer, &triangle(-0.5), Vec3::new(0.0, 1.0, 0.0));
        draw(&mut rasterizer, &triangle(0.5), Vec3::new(0.0, 0.0, 1.0));

        assert_eq!(rasterizer.pixel(4, 4), [0, 255, 0, 255]);
    }

    #[test]
    fn polygon_offset_keeps_outline_over_its_fill() {
        let vertex = |x: f32, y: f32, z: f32| Vertex::new(Vec3::new(x, y, z), Vec3::Z, Vec2::ZERO);
        // Planar quad tilted away from the eye, so its depth varies per pixel
        let quad = Mesh::indexed(
            "quad",
            vec![
                vertex(-1.0, -1.0, -3.0),
                vertex(1.0, -1.0, -4.0),
                vertex(1.0, 1.0, -4.0),
                vertex(-1.0, 1.0, -3.0),
            ],
            vec![0, 1, 2, 0, 2, 3],
        )
        .unwrap();
        let white = [255, 255, 255, 255];

        let mut scene = Scene::new();
        let node = scene.add_node(crate::scene_graph::Node::new(
            crate::scene_graph::NodeKind::Group,
        ));
        let mesh = &quad;
        let call = |mode, color, polygon_offset| DrawCall {
            node,
            model_view: Mat4::IDENTITY,
            color,
            mesh,
            mode,
            polygon_offset,
        };

        let mut rasterizer = SoftwareRasterizer::new(32, 32);
        rasterizer.set_global_ambient(Vec4::ONE);
        rasterizer.set_projection(
            crate::math::Frustum {
                left: -1.0,
                right: 1.0,
                bottom: -1.0,
                top: 1.0,
                near: 1.0,
                far: 10.0,
            }
            .perspective_matrix(),
        );

        let line_pixels = |rasterizer: &SoftwareRasterizer| {
            rasterizer
                .image()
                .pixels()
                .filter(|pixel| pixel.0 == white)
                .count()
        };

        rasterizer.clear(Vec4::W);
        rasterizer.draw(&call(DrawMode::Outline, Vec3::ONE, false));
        let outline_alone = line_pixels(&rasterizer);
        assert!(outline_alone > 0);

        rasterizer.clear(Vec4::W);
        rasterizer.draw(&call(DrawMode::Fill, Vec3::X, true));
        rasterizer.draw(&call(DrawMode::Outline, Vec3::ONE, false));

        assert_eq!(line_pixels(&rasterizer), outline_alone);
    }

    #[test]
    fn triangles_behind_the_eye_are_skipped() {
        let mut rasterizer = SoftwareRasterizer::new(8, 8);
        rasterizer.clear(Vec4::ZERO);
        rasterizer.set_global_ambient(Vec4::ONE);
        rasterizer.set_projection(
            crate::math::Frustum {
                left: -1.0,
                right: 1.0,
                bottom: -1.0,
                top: 1.0,
                near: 1.0,
                far: 10.0,
            }
            .perspective_matrix(),
        );

        draw(&mut rasterizer, &triangle(2.0), Vec3::ONE);

        assert!(rasterizer.image().pixels().all(|pixel| pixel.0 == [0, 0, 0, 0]));
    }
}
