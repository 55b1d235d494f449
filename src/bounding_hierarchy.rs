//! Scalar and primitive-set abstractions shared by trees and queries.

use std::fmt::Display;

use nalgebra::{
    ClosedAddAssign, ClosedDivAssign, ClosedMulAssign, ClosedSubAssign, Scalar, SimdPartialOrd,
};
use num_traits::{Float, FromPrimitive, ToPrimitive};

use crate::aabb::Aabb;

/// Allowed scalar types for boxes, trees and queries.
///
/// Satisfied by `f32` and `f64`. The closed-arithmetic bounds let
/// [`nalgebra::Point`] and vector operators work in generic code; `Float`
/// supplies the IEEE min/max/sqrt semantics the distance kernels rely on.
pub trait BvhValue:
    Scalar
    + Copy
    + Float
    + FromPrimitive
    + ToPrimitive
    + ClosedAddAssign
    + ClosedSubAssign
    + ClosedMulAssign
    + ClosedDivAssign
    + SimdPartialOrd
    + Display
    + Send
    + Sync
{
}

impl<T> BvhValue for T where
    T: Scalar
        + Copy
        + Float
        + FromPrimitive
        + ToPrimitive
        + ClosedAddAssign
        + ClosedSubAssign
        + ClosedMulAssign
        + ClosedDivAssign
        + SimdPartialOrd
        + Display
        + Send
        + Sync
{
}

/// A shape-independent view over an indexed collection of primitives.
///
/// Trees and queries hold references to a set and address primitives purely
/// by index; the set must outlive every structure built over it. A set is
/// never copied into the tree.
pub trait PrimitiveSet<T: BvhValue, const D: usize> {
    /// Number of primitives in the set.
    fn len(&self) -> usize;

    /// Returns `true` if the set holds no primitives.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The bounding box of the primitive at `index`.
    fn aabb(&self, index: usize) -> Aabb<T, D>;
}
