//! A crate which exports axis-aligned bounding boxes, binary bounding volume
//! hierarchies and proximity queries between tessellated shapes.
//!
//! ## About
//!
//! This crate answers two questions about a pair of triangulated shapes:
//! which of their sub-shapes (faces) come within a given tolerance of each
//! other, and how far apart the shapes stand overall. Both queries run over a
//! binary tree BVH (Bounding Volume Hierarchy) per shape, which reduces the
//! test complexity from O(n) to O(log2(n)) per query at the cost of building
//! the BVH once in advance. The overall measure, the proximity value, is the
//! thickness of the tightest shell around one shape that still touches the
//! other, swept over the tessellation vertices of both shapes.
//!
//! ## Example
//!
//! ```
//! use mesh_proximity::proximity::ShapeProximity;
//! use mesh_proximity::triangle_set::TriangleSet;
//! use nalgebra::Point3;
//!
//! let plate_at = |z: f64| {
//!     TriangleSet::with_single_face(
//!         vec![
//!             Point3::new(0.0, 0.0, z),
//!             Point3::new(1.0, 0.0, z),
//!             Point3::new(0.0, 1.0, z),
//!         ],
//!         vec![[0, 1, 2]],
//!         0,
//!     )
//!     .unwrap()
//! };
//!
//! let mut query = ShapeProximity::new(0.5);
//! query.load_shape1(plate_at(0.0)).unwrap();
//! query.load_shape2(plate_at(0.25)).unwrap();
//! query.perform().unwrap();
//!
//! // The plates sit 0.25 apart, within the 0.5 tolerance.
//! assert!(query.overlap_sub_shapes1().contains_key(&0));
//! ```
//!
//! ## Features
//!
//! - `serde` (default **disabled**) - adds `Serialize` and `Deserialize`
//!   implementations for the plain data types

pub mod aabb;
pub mod bounding_hierarchy;
pub mod bvh;
pub mod distance;
pub mod error;
pub mod proximity;
pub mod triangle_set;

#[cfg(test)]
mod testbase;

pub use crate::bounding_hierarchy::{BvhValue, PrimitiveSet};
pub use crate::error::{ProximityError, ProximityResult};
