//! Common types and fixtures used by the tests.

use std::f64::consts::{PI, TAU};

use nalgebra::Point3;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::aabb::Aabb;
use crate::bvh::BvhTree;
use crate::triangle_set::TriangleSet;

pub type TAabb3 = Aabb<f64, 3>;
pub type TBvh3 = BvhTree<f64, 3>;

/// A point vector that proptest can generate.
pub type TupleVec = (f64, f64, f64);

pub fn tuple_to_point(tpl: &TupleVec) -> Point3<f64> {
    Point3::new(tpl.0, tpl.1, tpl.2)
}

/// Generates coordinates in a small range so arithmetic stays well away
/// from overflow and catastrophic cancellation.
pub fn tuplevec_small_strategy() -> impl Strategy<Value = TupleVec> {
    (-10.0f64..10.0, -10.0f64..10.0, -10.0f64..10.0)
}

/// The triangle (0,0,0) (1,0,0) (0,1,0) as a one-face shape.
pub fn unit_triangle() -> TriangleSet<f64> {
    TriangleSet::with_single_face(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ],
        vec![[0, 1, 2]],
        0,
    )
    .unwrap()
}

/// A large horizontal triangle at height `z`, covering the unit triangle's
/// footprint by a wide margin.
pub fn big_triangle_at(z: f64) -> TriangleSet<f64> {
    TriangleSet::with_single_face(
        vec![
            Point3::new(-10.0, -10.0, z),
            Point3::new(20.0, -10.0, z),
            Point3::new(-10.0, 20.0, z),
        ],
        vec![[0, 1, 2]],
        0,
    )
    .unwrap()
}

/// A unit tetrahedron whose four triangles each form their own face.
pub fn tetrahedron_set() -> TriangleSet<f64> {
    TriangleSet::new(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ],
        vec![[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]],
        vec![0, 1, 2, 3],
    )
    .unwrap()
}

/// A UV-tessellated sphere centered on the origin, all triangles on one
/// face. Pole caps are fans, the bands quads split in two.
pub fn uv_sphere(radius: f64, rings: usize, segments: usize, face: u32) -> TriangleSet<f64> {
    assert!(rings >= 2 && segments >= 3);
    let mut vertices = vec![Point3::new(0.0, 0.0, radius)];
    for r in 1..rings {
        let phi = PI * r as f64 / rings as f64;
        for s in 0..segments {
            let theta = TAU * s as f64 / segments as f64;
            vertices.push(Point3::new(
                radius * phi.sin() * theta.cos(),
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
            ));
        }
    }
    vertices.push(Point3::new(0.0, 0.0, -radius));
    let bottom = (vertices.len() - 1) as u32;

    let ring_start = |r: usize| (1 + (r - 1) * segments) as u32;
    let mut triangles = Vec::new();
    for s in 0..segments as u32 {
        let next = (s + 1) % segments as u32;
        triangles.push([0, ring_start(1) + s, ring_start(1) + next]);
        triangles.push([
            ring_start(rings - 1) + s,
            bottom,
            ring_start(rings - 1) + next,
        ]);
    }
    for r in 1..rings - 1 {
        for s in 0..segments as u32 {
            let next = (s + 1) % segments as u32;
            let a = ring_start(r) + s;
            let b = ring_start(r) + next;
            let c = ring_start(r + 1) + s;
            let d = ring_start(r + 1) + next;
            triangles.push([a, c, d]);
            triangles.push([a, d, b]);
        }
    }
    TriangleSet::with_single_face(vertices, triangles, face).unwrap()
}

/// `n` small triangles scattered in a 20-unit cube, each its own face.
pub fn random_triangle_cloud(n: usize, seed: u64) -> TriangleSet<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut vertices = Vec::with_capacity(3 * n);
    let mut triangles = Vec::with_capacity(n);
    let mut faces = Vec::with_capacity(n);
    for i in 0..n {
        let center = Point3::new(
            rng.random_range(-10.0..10.0),
            rng.random_range(-10.0..10.0),
            rng.random_range(-10.0..10.0),
        );
        let base = vertices.len() as u32;
        for _ in 0..3 {
            vertices.push(Point3::new(
                center.x + rng.random_range(-0.5..0.5),
                center.y + rng.random_range(-0.5..0.5),
                center.z + rng.random_range(-0.5..0.5),
            ));
        }
        triangles.push([base, base + 1, base + 2]);
        faces.push(i as u32);
    }
    TriangleSet::new(vertices, triangles, faces).unwrap()
}
