//! Indexed-face-set models: the built-in primitive shapes.
//!
//! Sizes and tessellation defaults follow the classic `basic-object-models`
//! tables. Cylinders and cones have their axis along z and are centred on the
//! origin.

use std::f32::consts::{PI, TAU};
use std::fmt;
use std::str::FromStr;

use glam::{vec2, vec3, Vec3};
use itertools::iproduct;

use crate::error::{Result, SceneError};
use crate::model::{Mesh, Vertex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelKind {
    Cube,
    Sphere,
    Torus,
    Cone,
    Cylinder,
}

impl ModelKind {
    pub const ALL: [ModelKind; 5] = [
        ModelKind::Cube,
        ModelKind::Sphere,
        ModelKind::Torus,
        ModelKind::Cone,
        ModelKind::Cylinder,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModelKind::Cube => "Cube",
            ModelKind::Sphere => "Sphere",
            ModelKind::Torus => "Torus",
            ModelKind::Cone => "Cone",
            ModelKind::Cylinder => "Cylinder",
        }
    }

    pub fn build_mesh(self) -> Result<Mesh> {
        match self {
            ModelKind::Cube => cube(1.0),
            ModelKind::Sphere => uv_sphere(0.5, 32, 16),
            ModelKind::Torus => uv_torus(0.5, 0.5 / 3.0, 32, 16),
            ModelKind::Cone => uv_cone(0.5, 1.0, 32, false),
            ModelKind::Cylinder => uv_cylinder(0.5, 1.0, 32, false, false),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = SceneError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| SceneError::UnknownModel(s.to_string()))
    }
}

fn index(i: usize) -> Result<u16> {
    u16::try_from(i)
        .map_err(|_| SceneError::InvalidMesh(format!("vertex {} exceeds 16-bit indices", i)))
}

fn check_segments(name: &str, what: &str, count: usize, minimum: usize) -> Result<()> {
    if count < minimum {
        return Err(SceneError::InvalidMesh(format!(
            "{} needs at least {} {}, got {}",
            name, minimum, what, count
        )));
    }

    Ok(())
}

/// Rejects tessellations whose vertices cannot all be addressed with `u16`
/// before anything is generated.
fn check_vertex_count(name: &str, count: usize) -> Result<()> {
    if count > u16::MAX as usize + 1 {
        return Err(SceneError::InvalidMesh(format!(
            "{} with {} vertices exceeds 16-bit indices",
            name, count
        )));
    }

    Ok(())
}

pub fn cube(side: f32) -> Result<Mesh> {
    let s = side / 2.0;
    // (normal, u, v) with u x v == normal so that faces wind counter-clockwise
    let faces = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    ];
    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, u, v) in faces {
        let base = index(vertices.len())?;

        for (cu, cv) in corners {
            let position = (normal + u * cu + v * cv) * s;
            let tex_coords = vec2((cu + 1.0) / 2.0, (cv + 1.0) / 2.0);
            vertices.push(Vertex::new(position, normal, tex_coords));
        }

        indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    Mesh::indexed("Cube", vertices, indices)
}

/// Grid triangulation shared by the sphere and the torus. `rows` and
/// `columns` count quads; vertices are laid out row-major with
/// `columns + 1` per row.
fn grid_indices(rows: usize, columns: usize) -> Result<Vec<u16>> {
    let stride = columns + 1;

    iproduct!(0..rows, 0..columns)
        .flat_map(|(row, column)| {
            let a = row * stride + column;
            let b = a + stride;
            [a, a + 1, b + 1, a, b + 1, b]
        })
        .map(index)
        .collect()
}

pub fn uv_sphere(radius: f32, slices: usize, stacks: usize) -> Result<Mesh> {
    check_segments("Sphere", "slices", slices, 3)?;
    check_segments("Sphere", "stacks", stacks, 2)?;
    check_vertex_count("Sphere", (slices + 1) * (stacks + 1))?;

    let vertices = iproduct!(0..=stacks, 0..=slices)
        .map(|(i, j)| {
            let v = i as f32 / stacks as f32;
            let u = j as f32 / slices as f32;
            let latitude = -PI / 2.0 + v * PI;
            let longitude = u * TAU;

            let normal = vec3(
                latitude.cos() * longitude.cos(),
                latitude.cos() * longitude.sin(),
                latitude.sin(),
            );

            Vertex::new(normal * radius, normal, vec2(u, v))
        })
        .collect();

    Mesh::indexed("Sphere", vertices, grid_indices(stacks, slices)?)
}

/// `outer_radius` reaches the outside of the tube, `inner_radius` the inside.
pub fn uv_torus(
    outer_radius: f32,
    inner_radius: f32,
    slices: usize,
    stacks: usize,
) -> Result<Mesh> {
    check_segments("Torus", "slices", slices, 3)?;
    check_segments("Torus", "stacks", stacks, 3)?;
    check_vertex_count("Torus", (slices + 1) * (stacks + 1))?;

    let tube_radius = (outer_radius - inner_radius) / 2.0;
    let center_radius = (outer_radius + inner_radius) / 2.0;

    let vertices = iproduct!(0..=slices, 0..=stacks)
        .map(|(i, j)| {
            let u = i as f32 / slices as f32;
            let v = j as f32 / stacks as f32;
            let (sin_u, cos_u) = (u * TAU).sin_cos();
            let (sin_v, cos_v) = (v * TAU).sin_cos();

            let w = center_radius + tube_radius * cos_v;
            let position = vec3(w * cos_u, w * sin_u, tube_radius * sin_v);
            let normal = vec3(cos_v * cos_u, cos_v * sin_u, sin_v);

            Vertex::new(position, normal, vec2(u, v))
        })
        .collect();

    // Rows advance around the ring, so the grid winding is flipped here
    let indices = grid_indices(slices, stacks)?
        .chunks_exact(3)
        .flat_map(|tri| [tri[0], tri[2], tri[1]])
        .collect();

    Mesh::indexed("Torus", vertices, indices)
}

fn push_cap(
    vertices: &mut Vec<Vertex>,
    indices: &mut Vec<u16>,
    radius: f32,
    z: f32,
    slices: usize,
    facing_up: bool,
) -> Result<()> {
    let normal = if facing_up { Vec3::Z } else { Vec3::NEG_Z };
    let center = index(vertices.len())?;

    vertices.push(Vertex::new(vec3(0.0, 0.0, z), normal, vec2(0.5, 0.5)));

    for j in 0..=slices {
        let (sin, cos) = (j as f32 / slices as f32 * TAU).sin_cos();
        vertices.push(Vertex::new(
            vec3(radius * cos, radius * sin, z),
            normal,
            vec2(0.5 + 0.5 * cos, 0.5 + 0.5 * sin),
        ));
    }

    for j in 0..slices {
        let current = index(center as usize + 1 + j)?;
        if facing_up {
            indices.extend([center, current, current + 1]);
        } else {
            indices.extend([center, current + 1, current]);
        }
    }

    Ok(())
}

pub fn uv_cylinder(
    radius: f32,
    height: f32,
    slices: usize,
    no_top: bool,
    no_bottom: bool,
) -> Result<Mesh> {
    check_segments("Cylinder", "slices", slices, 3)?;
    check_vertex_count("Cylinder", 2 * (slices + 1) + 2 * (slices + 2))?;

    let half = height / 2.0;
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    // Side vertices alternate bottom, top
    for j in 0..=slices {
        let u = j as f32 / slices as f32;
        let (sin, cos) = (u * TAU).sin_cos();
        let normal = vec3(cos, sin, 0.0);

        vertices.push(Vertex::new(
            vec3(radius * cos, radius * sin, -half),
            normal,
            vec2(u, 0.0),
        ));
        vertices.push(Vertex::new(
            vec3(radius * cos, radius * sin, half),
            normal,
            vec2(u, 1.0),
        ));
    }

    for j in 0..slices {
        let a = index(2 * j)?;
        indices.extend([a, a + 2, a + 3, a, a + 3, a + 1]);
    }

    if !no_top {
        push_cap(&mut vertices, &mut indices, radius, half, slices, true)?;
    }
    if !no_bottom {
        push_cap(&mut vertices, &mut indices, radius, -half, slices, false)?;
    }

    Mesh::indexed("Cylinder", vertices, indices)
}

pub fn uv_cone(radius: f32, height: f32, slices: usize, no_bottom: bool) -> Result<Mesh> {
    check_segments("Cone", "slices", slices, 3)?;
    check_vertex_count("Cone", 2 * (slices + 1) + slices + 2)?;

    let half = height / 2.0;
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    // Side vertices alternate base, apex; the apex is duplicated per slice so
    // that each copy carries the normal of its slice
    for j in 0..=slices {
        let u = j as f32 / slices as f32;
        let (sin, cos) = (u * TAU).sin_cos();
        let normal = vec3(height * cos, height * sin, radius).normalize();

        vertices.push(Vertex::new(
            vec3(radius * cos, radius * sin, -half),
            normal,
            vec2(u, 0.0),
        ));
        vertices.push(Vertex::new(vec3(0.0, 0.0, half), normal, vec2(u, 1.0)));
    }

    for j in 0..slices {
        let a = index(2 * j)?;
        indices.extend([a, a + 2, a + 1]);
    }

    if !no_bottom {
        push_cap(&mut vertices, &mut indices, radius, -half, slices, false)?;
    }

    Mesh::indexed("Cone", vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_unit_normals(mesh: &Mesh) {
        for vertex in &mesh.vertices {
            assert_relative_eq!(vertex.normal.length(), 1.0, epsilon = 1e-4);
        }
    }

    /// Every non-degenerate triangle's winding agrees with its vertex normals.
    fn assert_outward_winding(mesh: &Mesh) {
        for [a, b, c] in mesh.triangles() {
            let face_normal = (b.position - a.position).cross(c.position - a.position);
            if face_normal.length() < 1e-6 {
                continue;
            }
            let vertex_normal = a.normal + b.normal + c.normal;
            assert!(
                face_normal.dot(vertex_normal) > 0.0,
                "{} has an inward facing triangle",
                mesh.name
            );
        }
    }

    #[test]
    fn cube_counts() {
        let mesh = cube(1.0).unwrap();

        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.as_ref().unwrap().len(), 36);

        let bounds = mesh.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::splat(-0.5));
        assert_eq!(bounds.max, Vec3::splat(0.5));

        assert_unit_normals(&mesh);
        assert_outward_winding(&mesh);
    }

    #[test]
    fn sphere_counts() {
        let mesh = uv_sphere(0.5, 32, 16).unwrap();

        assert_eq!(mesh.vertices.len(), 33 * 17);
        assert_eq!(mesh.triangle_count(), 32 * 16 * 2);
        for vertex in &mesh.vertices {
            assert_relative_eq!(vertex.position.length(), 0.5, epsilon = 1e-5);
        }

        assert_unit_normals(&mesh);
        assert_outward_winding(&mesh);
    }

    #[test]
    fn torus_stays_within_outer_radius() {
        let mesh = uv_torus(0.5, 0.5 / 3.0, 32, 16).unwrap();

        assert_eq!(mesh.vertices.len(), 33 * 17);
        for vertex in &mesh.vertices {
            let radial = vertex.position.truncate().length();
            assert!(radial <= 0.5 + 1e-5);
            assert!(radial >= 0.5 / 3.0 - 1e-5);
        }

        assert_unit_normals(&mesh);
        assert_outward_winding(&mesh);
    }

    #[test]
    fn cylinder_caps_are_optional() {
        let closed = uv_cylinder(0.5, 1.0, 32, false, false).unwrap();
        let open = uv_cylinder(0.5, 1.0, 32, true, true).unwrap();

        assert_eq!(open.vertices.len(), 2 * 33);
        assert_eq!(closed.vertices.len(), 2 * 33 + 2 * 34);
        assert_eq!(closed.triangle_count(), 32 * 2 + 2 * 32);

        assert_unit_normals(&closed);
        assert_outward_winding(&closed);
    }

    #[test]
    fn cone_apex_on_positive_z() {
        let mesh = uv_cone(0.5, 1.0, 32, false).unwrap();

        let bounds = mesh.bounds().unwrap();
        assert_relative_eq!(bounds.max.z, 0.5);
        assert_relative_eq!(bounds.min.z, -0.5);
        assert_eq!(mesh.triangle_count(), 32 + 32);

        assert_unit_normals(&mesh);
        assert_outward_winding(&mesh);
    }

    #[test]
    fn oversized_tessellation_is_rejected() {
        // 301 * 301 vertices do not fit 16-bit indices
        assert!(matches!(
            uv_sphere(0.5, 300, 300),
            Err(SceneError::InvalidMesh(_))
        ));
        assert!(uv_torus(0.5, 0.1, 300, 300).is_err());
        assert!(uv_cylinder(0.5, 1.0, 40_000, false, false).is_err());
        assert!(uv_cone(0.5, 1.0, 40_000, false).is_err());

        // Largest sphere that still fits
        assert!(uv_sphere(0.5, 255, 255).is_ok());
    }

    #[test]
    fn degenerate_tessellation_is_rejected() {
        assert!(uv_sphere(0.5, 0, 16).is_err());
        assert!(uv_torus(0.5, 0.1, 32, 2).is_err());
        assert!(uv_cone(0.5, 1.0, 2, false).is_err());
    }

    #[test]
    fn builtin_kinds_build() {
        for kind in ModelKind::ALL {
            let mesh = kind.build_mesh().unwrap();
            assert_eq!(mesh.name, kind.name());
        }
    }

    #[test]
    fn model_kind_parses_names() {
        assert_eq!("Torus".parse::<ModelKind>().unwrap(), ModelKind::Torus);
        assert_eq!(ModelKind::Cylinder.to_string(), "Cylinder");

        let error = "Teapot".parse::<ModelKind>().unwrap_err();
        assert!(matches!(error, SceneError::UnknownModel(ref name) if name == "Teapot"));
        assert_eq!(error.to_string(), "Scene does not contain a Teapot model");
    }
}
