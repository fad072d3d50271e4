//! In-memory triangle mesh with validated indices

use crate::error::{IndexKind, LoadError};
use crate::rasterizer::{Vec2, Vec3};

/// One face corner: indices into the vertex, UV and normal arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corner {
    pub vertex: usize,
    pub uv: Option<usize>,
    pub normal: Option<usize>,
}

impl Corner {
    pub const fn new(vertex: usize, uv: Option<usize>, normal: Option<usize>) -> Self {
        Self { vertex, uv, normal }
    }

    pub const fn full(vertex: usize, uv: usize, normal: usize) -> Self {
        Self { vertex, uv: Some(uv), normal: Some(normal) }
    }
}

/// A triangle face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub corners: [Corner; 3],
    /// Index into `Mesh::materials`
    pub material: usize,
}

impl Face {
    pub fn new(corners: [Corner; 3]) -> Self {
        Self { corners, material: 0 }
    }

    pub fn with_material(corners: [Corner; 3], material: usize) -> Self {
        Self { corners, material }
    }
}

/// Parallel arrays of mesh data. Every face index is in range by construction.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    vertices: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: Vec<Vec2>,
    faces: Vec<Face>,
    materials: Vec<String>,
}

impl Mesh {
    /// Build a mesh, rejecting it whole if any face index is out of range.
    /// An empty material list is allowed; faces then all use material 0.
    pub fn new(
        vertices: Vec<Vec3>,
        normals: Vec<Vec3>,
        uvs: Vec<Vec2>,
        faces: Vec<Face>,
        materials: Vec<String>,
    ) -> Result<Self, LoadError> {
        let material_count = materials.len().max(1);

        for (face_idx, face) in faces.iter().enumerate() {
            let check = |kind: IndexKind, index: usize, len: usize| {
                if index < len {
                    Ok(())
                } else {
                    Err(LoadError::IndexOutOfRange { face: face_idx, kind, index, len })
                }
            };

            for corner in &face.corners {
                check(IndexKind::Vertex, corner.vertex, vertices.len())?;
                if let Some(uv) = corner.uv {
                    check(IndexKind::Uv, uv, uvs.len())?;
                }
                if let Some(n) = corner.normal {
                    check(IndexKind::Normal, n, normals.len())?;
                }
            }
            check(IndexKind::Material, face.material, material_count)?;
        }

        Ok(Self { vertices, normals, uvs, faces, materials })
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn materials(&self) -> &[String] {
        &self.materials
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Axis-aligned bounds of the vertices, `None` for an empty mesh
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.vertices.first()?;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
        )
    }

    /// Unit cube centered on the origin: 8 vertices, 12 triangles
    pub fn cube() -> Self {
        let vertices = vec![
            Vec3::new(-0.5, -0.5, 0.5),
            Vec3::new(0.5, -0.5, 0.5),
            Vec3::new(0.5, 0.5, 0.5),
            Vec3::new(-0.5, 0.5, 0.5),
            Vec3::new(-0.5, -0.5, -0.5),
            Vec3::new(0.5, -0.5, -0.5),
            Vec3::new(0.5, 0.5, -0.5),
            Vec3::new(-0.5, 0.5, -0.5),
        ];

        let normals = vec![
            Vec3::new(0.0, 0.0, 1.0),  // Front
            Vec3::new(0.0, 0.0, -1.0), // Back
            Vec3::new(0.0, 1.0, 0.0),  // Top
            Vec3::new(0.0, -1.0, 0.0), // Bottom
            Vec3::new(1.0, 0.0, 0.0),  // Right
            Vec3::new(-1.0, 0.0, 0.0), // Left
        ];

        let uvs = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];

        // Counter-clockwise seen from outside
        let quads: [[usize; 4]; 6] = [
            [0, 1, 2, 3],
            [5, 4, 7, 6],
            [3, 2, 6, 7],
            [4, 5, 1, 0],
            [1, 5, 6, 2],
            [4, 0, 3, 7],
        ];

        let mut faces = Vec::with_capacity(12);
        for (normal, quad) in quads.iter().enumerate() {
            let corner = |i: usize| Corner::full(quad[i], i, normal);
            faces.push(Face::new([corner(0), corner(1), corner(2)]));
            faces.push(Face::new([corner(0), corner(2), corner(3)]));
        }

        Self { vertices, normals, uvs, faces, materials: Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_shape() {
        let cube = Mesh::cube();
        assert_eq!(cube.vertices().len(), 8);
        assert_eq!(cube.faces().len(), 12);
        let (lo, hi) = cube.bounds().unwrap();
        assert_eq!(lo, Vec3::new(-0.5, -0.5, -0.5));
        assert_eq!(hi, Vec3::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn test_cube_winding_matches_normals() {
        let cube = Mesh::cube();
        for face in cube.faces() {
            let [a, b, c] = face.corners.map(|k| cube.vertices()[k.vertex]);
            let geometric = (b - a).cross(c - a).normalize();
            let stored = cube.normals()[face.corners[0].normal.unwrap()];
            assert!(geometric.dot(stored) > 0.99);
        }
    }

    #[test]
    fn test_rejects_out_of_range_vertex() {
        let corners = [Corner::new(0, None, None), Corner::new(1, None, None), Corner::new(3, None, None)];
        let err = Mesh::new(
            vec![Vec3::ZERO; 3],
            Vec::new(),
            Vec::new(),
            vec![Face::new(corners)],
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            LoadError::IndexOutOfRange { face: 0, kind: IndexKind::Vertex, index: 3, len: 3 }
        ));
    }

    #[test]
    fn test_rejects_out_of_range_uv_and_material() {
        let corners = [Corner::new(0, Some(1), None), Corner::new(1, None, None), Corner::new(2, None, None)];
        let err = Mesh::new(vec![Vec3::ZERO; 3], Vec::new(), vec![Vec2::ZERO], vec![Face::new(corners)], Vec::new())
            .unwrap_err();
        assert!(matches!(err, LoadError::IndexOutOfRange { kind: IndexKind::Uv, .. }));

        let corners = [Corner::new(0, None, None), Corner::new(1, None, None), Corner::new(2, None, None)];
        let err = Mesh::new(
            vec![Vec3::ZERO; 3],
            Vec::new(),
            Vec::new(),
            vec![Face::with_material(corners, 2)],
            vec!["a".into(), "b".into()],
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::IndexOutOfRange { kind: IndexKind::Material, index: 2, .. }));
    }

    #[test]
    fn test_empty_mesh_is_valid() {
        let mesh = Mesh::new(Vec::new(), Vec::new(), Vec::new(), Vec::new(), Vec::new()).unwrap();
        assert!(mesh.is_empty());
        assert!(mesh.bounds().is_none());
    }
}
