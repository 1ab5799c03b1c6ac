use glam::{vec3, Vec2, Vec3};
use itertools::Itertools;

use crate::error::{Result, SceneError};
use crate::model::{Mesh, Vertex};

/// Polygonal solid described by vertex-index faces and one normal per face.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyhedron {
    faces: Vec<Vec<usize>>,
    vertices: Vec<Vec3>,
    normals: Vec<Vec3>,
}

impl Polyhedron {
    pub fn new(faces: Vec<Vec<usize>>, vertices: Vec<Vec3>, normals: Vec<Vec3>) -> Result<Self> {
        validate_faces(&faces, vertices.len())?;

        if normals.len() != faces.len() {
            return Err(SceneError::InvalidPolyhedron(format!(
                "{} faces but {} normals",
                faces.len(),
                normals.len()
            )));
        }

        Ok(Self {
            faces,
            vertices,
            normals,
        })
    }

    /// Derives each face normal with Newell's method.
    pub fn with_computed_normals(faces: Vec<Vec<usize>>, vertices: Vec<Vec3>) -> Result<Self> {
        validate_faces(&faces, vertices.len())?;

        let normals = faces
            .iter()
            .map(|face| newell_normal(face, &vertices))
            .collect();

        Ok(Self {
            faces,
            vertices,
            normals,
        })
    }

    pub fn faces(&self) -> &[Vec<usize>] {
        &self.faces
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Fan-triangulates every face from its first vertex. Each emitted
    /// vertex carries the normal of its face.
    pub fn generate_coords(&self) -> Vec<Vertex> {
        self.faces
            .iter()
            .zip(&self.normals)
            .flat_map(|(face, &normal)| {
                let start = self.vertices[face[0]];
                face[1..].iter().tuple_windows().flat_map(move |(&a, &b)| {
                    [start, self.vertices[a], self.vertices[b]]
                        .map(|position| Vertex::new(position, normal, Vec2::ZERO))
                })
            })
            .collect()
    }

    pub fn face_edges(&self) -> Vec<[Vec3; 2]> {
        self.faces
            .iter()
            .flat_map(|face| {
                face.iter()
                    .circular_tuple_windows()
                    .map(|(&a, &b)| [self.vertices[a], self.vertices[b]])
            })
            .collect()
    }

    pub fn to_mesh(&self, name: impl Into<String>) -> Mesh {
        Mesh::triangle_list(name, self.generate_coords(), self.face_edges())
    }

    pub fn tetrahedron() -> Self {
        Self::builtin(
            vec![vec![0, 1, 2], vec![1, 3, 2], vec![0, 2, 3], vec![0, 3, 1]],
            vec![
                vec3(1.0, 1.0, 1.0),
                vec3(1.0, -1.0, -1.0),
                vec3(-1.0, 1.0, -1.0),
                vec3(-1.0, -1.0, 1.0),
            ],
        )
    }

    pub fn cube() -> Self {
        // Vertex i has x, y, z set from bits 0, 1, 2
        let vertices = (0..8)
            .map(|i: u32| {
                let sign = |bit: u32| if i & bit != 0 { 1.0 } else { -1.0 };
                vec3(sign(1), sign(2), sign(4))
            })
            .collect();

        Self::builtin(
            vec![
                vec![1, 3, 7, 5],
                vec![0, 4, 6, 2],
                vec![2, 6, 7, 3],
                vec![0, 1, 5, 4],
                vec![4, 5, 7, 6],
                vec![0, 2, 3, 1],
            ],
            vertices,
        )
    }

    pub fn octahedron() -> Self {
        Self::builtin(
            vec![
                vec![0, 2, 4],
                vec![1, 4, 2],
                vec![0, 4, 3],
                vec![1, 3, 4],
                vec![0, 5, 2],
                vec![1, 2, 5],
                vec![0, 3, 5],
                vec![1, 5, 3],
            ],
            vec![Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z],
        )
    }

    pub fn icosahedron() -> Self {
        let phi = (1.0 + 5.0_f32.sqrt()) / 2.0;

        Self::builtin(
            vec![
                vec![0, 11, 5],
                vec![0, 5, 1],
                vec![0, 1, 7],
                vec![0, 7, 10],
                vec![0, 10, 11],
                vec![1, 5, 9],
                vec![5, 11, 4],
                vec![11, 10, 2],
                vec![10, 7, 6],
                vec![7, 1, 8],
                vec![3, 9, 4],
                vec![3, 4, 2],
                vec![3, 2, 6],
                vec![3, 6, 8],
                vec![3, 8, 9],
                vec![4, 9, 5],
                vec![2, 4, 11],
                vec![6, 2, 10],
                vec![8, 6, 7],
                vec![9, 8, 1],
            ],
            vec![
                vec3(-1.0, phi, 0.0),
                vec3(1.0, phi, 0.0),
                vec3(-1.0, -phi, 0.0),
                vec3(1.0, -phi, 0.0),
                vec3(0.0, -1.0, phi),
                vec3(0.0, 1.0, phi),
                vec3(0.0, -1.0, -phi),
                vec3(0.0, 1.0, -phi),
                vec3(phi, 0.0, -1.0),
                vec3(phi, 0.0, 1.0),
                vec3(-phi, 0.0, -1.0),
                vec3(-phi, 0.0, 1.0),
            ],
        )
    }

    // Built-in tables are valid by construction and wind counter-clockwise
    fn builtin(faces: Vec<Vec<usize>>, vertices: Vec<Vec3>) -> Self {
        let normals = faces
            .iter()
            .map(|face| newell_normal(face, &vertices))
            .collect();

        Self {
            faces,
            vertices,
            normals,
        }
    }
}

fn validate_faces(faces: &[Vec<usize>], vertex_count: usize) -> Result<()> {
    if faces.is_empty() {
        return Err(SceneError::InvalidPolyhedron("no faces".to_string()));
    }

    for (face_index, face) in faces.iter().enumerate() {
        if face.len() < 3 {
            return Err(SceneError::InvalidPolyhedron(format!(
                "face {face_index} has {} vertices",
                face.len()
            )));
        }

        if let Some(&bad) = face.iter().find(|&&index| index >= vertex_count) {
            return Err(SceneError::InvalidPolyhedron(format!(
                "face {face_index} references vertex {bad} of {vertex_count}"
            )));
        }
    }

    Ok(())
}

fn newell_normal(face: &[usize], vertices: &[Vec3]) -> Vec3 {
    face.iter()
        .map(|&index| vertices[index])
        .circular_tuple_windows()
        .fold(Vec3::ZERO, |normal, (current, next)| {
            normal
                + vec3(
                    (current.y - next.y) * (current.z + next.z),
                    (current.z - next.z) * (current.x + next.x),
                    (current.x - next.x) * (current.y + next.y),
                )
        })
        .normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_outward(polyhedron: &Polyhedron) {
        for (face, normal) in polyhedron.faces().iter().zip(polyhedron.normals()) {
            let centroid = face
                .iter()
                .map(|&index| polyhedron.vertices()[index])
                .sum::<Vec3>()
                / face.len() as f32;

            assert_relative_eq!(normal.length(), 1.0, epsilon = 1e-5);
            assert!(normal.dot(centroid) > 0.0, "face {face:?} points inward");
        }
    }

    #[test]
    fn builtin_solids_face_outward() {
        let solids = [
            Polyhedron::tetrahedron(),
            Polyhedron::cube(),
            Polyhedron::octahedron(),
            Polyhedron::icosahedron(),
        ];

        for solid in &solids {
            assert_outward(solid);
        }

        assert_eq!(solids[3].faces().len(), 20);
        assert_eq!(solids[3].vertices().len(), 12);
    }

    #[test]
    fn fan_triangulation_emits_n_minus_two_triangles() {
        let cube = Polyhedron::cube();
        let coords = cube.generate_coords();

        // Six quads, two triangles each
        assert_eq!(coords.len(), 6 * 2 * 3);

        // Every vertex of a face repeats that face's normal
        for (chunk, normal) in coords.chunks_exact(6).zip(cube.normals()) {
            assert!(chunk.iter().all(|vertex| vertex.normal == *normal));
        }

        // No degenerate triangle at the start of a fan
        for tri in coords.chunks_exact(3) {
            assert_ne!(tri[0].position, tri[1].position);
        }
    }

    #[test]
    fn pentagon_face_becomes_three_triangles() {
        let vertices = (0..5)
            .map(|i| {
                let angle = i as f32 / 5.0 * std::f32::consts::TAU;
                vec3(angle.cos(), angle.sin(), 0.0)
            })
            .collect();

        let polyhedron =
            Polyhedron::with_computed_normals(vec![vec![0, 1, 2, 3, 4]], vertices).unwrap();

        assert_relative_eq!(polyhedron.normals()[0], Vec3::Z, epsilon = 1e-6);
        assert_eq!(polyhedron.generate_coords().len(), 9);

        let mesh = polyhedron.to_mesh("pentagon");
        assert_eq!(mesh.triangle_count(), 3);
        assert_eq!(mesh.edges.len(), 5);
    }

    #[test]
    fn rejects_invalid_tables() {
        let vertices = vec![Vec3::ZERO, Vec3::X, Vec3::Y];

        let missing_normal = Polyhedron::new(vec![vec![0, 1, 2]], vertices.clone(), vec![]);
        assert!(matches!(missing_normal, Err(SceneError::InvalidPolyhedron(_))));

        let out_of_range = Polyhedron::new(vec![vec![0, 1, 3]], vertices.clone(), vec![Vec3::Z]);
        assert!(matches!(out_of_range, Err(SceneError::InvalidPolyhedron(_))));

        let too_small = Polyhedron::new(vec![vec![0, 1]], vertices, vec![Vec3::Z]);
        assert!(matches!(too_small, Err(SceneError::InvalidPolyhedron(_))));
    }
}
