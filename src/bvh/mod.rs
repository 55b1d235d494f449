//! The flattened bounding volume hierarchy and its traversal engine.

mod best_first;
mod build;
mod tree;

pub use best_first::{traverse_best_first, TraverseMetric};
pub use tree::{BvhNode, BvhTree};
