//! Indexed triangle collections with a sub-element map.

use nalgebra::Point3;

use crate::aabb::Aabb;
use crate::bounding_hierarchy::{BvhValue, PrimitiveSet};
use crate::error::ProximityError;

/// An indexed triangle soup, the concrete 3D [`PrimitiveSet`].
///
/// Holds a shared vertex array, one `[u32; 3]` index triple per triangle and
/// the sub-element index list: a parallel array mapping every triangle to the
/// face it tessellates. The set is immutable once constructed; trees and
/// queries reference it without copying.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TriangleSet<T: BvhValue> {
    vertices: Vec<Point3<T>>,
    triangles: Vec<[u32; 3]>,
    faces: Vec<u32>,
}

impl<T: BvhValue> TriangleSet<T> {
    /// Creates a set from a vertex array, triangle index triples and the
    /// per-triangle owning face indices.
    ///
    /// Fails with [`ProximityError::MalformedSet`] when the face list length
    /// does not match the triangle count or an index is out of range.
    pub fn new(
        vertices: Vec<Point3<T>>,
        triangles: Vec<[u32; 3]>,
        faces: Vec<u32>,
    ) -> Result<Self, ProximityError> {
        if faces.len() != triangles.len() {
            return Err(ProximityError::MalformedSet(format!(
                "{} face entries for {} triangles",
                faces.len(),
                triangles.len()
            )));
        }
        for (i, triple) in triangles.iter().enumerate() {
            for &v in triple {
                if v as usize >= vertices.len() {
                    return Err(ProximityError::MalformedSet(format!(
                        "triangle {i} references vertex {v} of {}",
                        vertices.len()
                    )));
                }
            }
        }
        Ok(Self {
            vertices,
            triangles,
            faces,
        })
    }

    /// Creates a set where every triangle belongs to the same face.
    pub fn with_single_face(
        vertices: Vec<Point3<T>>,
        triangles: Vec<[u32; 3]>,
        face: u32,
    ) -> Result<Self, ProximityError> {
        let faces = vec![face; triangles.len()];
        Self::new(vertices, triangles, faces)
    }

    /// The ordered corner points of triangle `index`.
    pub fn triangle_vertices(&self, index: usize) -> [Point3<T>; 3] {
        let [a, b, c] = self.triangles[index];
        [
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ]
    }

    /// The sub-element (face) owning triangle `index`.
    pub fn face_of(&self, index: usize) -> u32 {
        self.faces[index]
    }

    /// Number of vertices in the shared vertex array.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// The vertex at `index`.
    pub fn vertex(&self, index: usize) -> Point3<T> {
        self.vertices[index]
    }

    /// Tessellation vertices used as query samples.
    ///
    /// `limit == 0` returns every vertex; otherwise an evenly strided subset
    /// of at most `limit` vertices.
    pub fn sample_vertices(&self, limit: usize) -> Vec<Point3<T>> {
        let n = self.vertices.len();
        if limit == 0 || limit >= n {
            return self.vertices.clone();
        }
        let step = (n + limit - 1) / limit;
        self.vertices.iter().step_by(step).copied().collect()
    }
}

impl<T: BvhValue> PrimitiveSet<T, 3> for TriangleSet<T> {
    fn len(&self) -> usize {
        self.triangles.len()
    }

    fn aabb(&self, index: usize) -> Aabb<T, 3> {
        let [a, b, c] = self.triangle_vertices(index);
        Aabb::empty().grow(&a).grow(&b).grow(&c)
    }
}
