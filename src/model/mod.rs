use std::collections::BTreeSet;

use glam::{Vec2, Vec3};
use id_arena::Id;
use itertools::Either;

use crate::error::{Result, SceneError};
use crate::math::Aabb;

pub mod ifs;
pub mod polyhedron;

pub use ifs::ModelKind;
pub use polyhedron::Polyhedron;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coords: Vec2,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, tex_coords: Vec2) -> Self {
        Self {
            position,
            normal,
            tex_coords,
        }
    }
}

pub type MeshId = Id<Mesh>;

/// Triangle geometry for a single drawable node.
///
/// Indexed meshes are drawn like `glDrawElements` with 16-bit indices, the
/// others like `glDrawArrays` over a plain triangle list.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Option<Vec<u16>>,
    /// Object-space line segments drawn when a node has a line color
    pub edges: Vec<[Vec3; 2]>,
}

impl Mesh {
    /// Fails when the indices do not form whole triangles or point past the
    /// end of `vertices`.
    pub fn indexed(
        name: impl Into<String>,
        vertices: Vec<Vertex>,
        indices: Vec<u16>,
    ) -> Result<Self> {
        let name = name.into();

        if indices.len() % 3 != 0 {
            return Err(SceneError::InvalidMesh(format!(
                "{} has {} indices, not a multiple of 3",
                name,
                indices.len()
            )));
        }

        if let Some(&out_of_range) = indices
            .iter()
            .find(|&&index| index as usize >= vertices.len())
        {
            return Err(SceneError::InvalidMesh(format!(
                "{} refers to vertex {} but has only {} vertices",
                name,
                out_of_range,
                vertices.len()
            )));
        }

        let unique_edges = indices
            .chunks_exact(3)
            .flat_map(|tri| [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])])
            .map(|(a, b)| (a.min(b), a.max(b)))
            .filter(|(a, b)| a != b)
            .collect::<BTreeSet<_>>();

        let edges = unique_edges
            .into_iter()
            .map(|(a, b)| {
                [
                    vertices[a as usize].position,
                    vertices[b as usize].position,
                ]
            })
            .collect();

        Ok(Self {
            name,
            vertices,
            indices: Some(indices),
            edges,
        })
    }

    pub fn triangle_list(
        name: impl Into<String>,
        vertices: Vec<Vertex>,
        edges: Vec<[Vec3; 2]>,
    ) -> Self {
        Self {
            name: name.into(),
            vertices,
            indices: None,
            edges,
        }
    }

    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    pub fn triangle_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.vertices.len() / 3,
        }
    }

    pub fn triangles(&self) -> impl Iterator<Item = [&Vertex; 3]> + '_ {
        match &self.indices {
            Some(indices) => Either::Left(indices.chunks_exact(3).map(|tri| {
                [
                    &self.vertices[tri[0] as usize],
                    &self.vertices[tri[1] as usize],
                    &self.vertices[tri[2] as usize],
                ]
            })),
            None => Either::Right(
                self.vertices
                    .chunks_exact(3)
                    .map(|tri| [&tri[0], &tri[1], &tri[2]]),
            ),
        }
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.vertices.iter().map(|vertex| vertex.position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(x: f32, y: f32) -> Vertex {
        Vertex::new(Vec3::new(x, y, 0.0), Vec3::Z, Vec2::ZERO)
    }

    #[test]
    fn indexed_quad_has_five_unique_edges() {
        let vertices = vec![
            vertex(0.0, 0.0),
            vertex(1.0, 0.0),
            vertex(1.0, 1.0),
            vertex(0.0, 1.0),
        ];
        let mesh = Mesh::indexed("quad", vertices, vec![0, 1, 2, 0, 2, 3]).unwrap();

        assert_eq!(mesh.triangle_count(), 2);
        // Four sides plus the shared diagonal
        assert_eq!(mesh.edges.len(), 5);
        assert_eq!(mesh.triangles().count(), 2);
    }

    #[test]
    fn indexed_rejects_bad_indices() {
        let vertices = vec![vertex(0.0, 0.0), vertex(1.0, 0.0), vertex(1.0, 1.0)];

        assert!(matches!(
            Mesh::indexed("short", vertices.clone(), vec![0, 1, 3]),
            Err(SceneError::InvalidMesh(message)) if message.contains("vertex 3")
        ));
        assert!(matches!(
            Mesh::indexed("partial", vertices, vec![0, 1]),
            Err(SceneError::InvalidMesh(_))
        ));
    }

    #[test]
    fn triangle_list_iterates_vertices_in_threes() {
        let vertices = vec![
            vertex(0.0, 0.0),
            vertex(1.0, 0.0),
            vertex(1.0, 1.0),
            vertex(0.0, 0.0),
            vertex(1.0, 1.0),
            vertex(0.0, 1.0),
        ];
        let mesh = Mesh::triangle_list("quad", vertices, Vec::new());

        assert!(!mesh.is_indexed());
        assert_eq!(mesh.triangle_count(), 2);

        let second = mesh.triangles().nth(1).unwrap();
        assert_eq!(second[2].position, Vec3::new(0.0, 1.0, 0.0));

        let bounds = mesh.bounds().unwrap();
        assert_eq!(bounds.max, Vec3::new(1.0, 1.0, 0.0));
    }
}
