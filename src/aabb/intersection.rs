use nalgebra::Point;

use crate::aabb::Aabb;
use crate::bounding_hierarchy::BvhValue;

impl<T: BvhValue, const D: usize> Aabb<T, D> {
    /// Returns `true` if the two boxes share at least one point.
    ///
    /// The negation proves definite separation, which is what subtree
    /// rejection needs; touching borders count as intersecting.
    pub fn intersects_aabb(&self, other: &Self) -> bool {
        (0..D).all(|i| self.max[i] >= other.min[i] && other.max[i] >= self.min[i])
    }

    /// Squared distance from `p` to the closest point of this box.
    ///
    /// Zero if `p` is inside. This is a valid lower bound on the distance
    /// from `p` to anything contained in the box, which makes it the
    /// rejection bound for nearest-feature searches. An empty box is
    /// infinitely far from everything.
    pub fn distance_squared_to_point(&self, p: &Point<T, D>) -> T {
        let mut d2 = T::zero();
        for i in 0..D {
            let closest = self.min[i].max(self.max[i].min(p[i]));
            let d = p[i] - closest;
            d2 = d2 + d * d;
        }
        d2
    }

    /// Squared distance between the closest points of two boxes.
    ///
    /// Zero if they intersect; a lower bound on the distance between any
    /// two points contained one in each box.
    pub fn distance_squared_to_aabb(&self, other: &Self) -> T {
        let mut d2 = T::zero();
        for i in 0..D {
            let gap = (other.min[i] - self.max[i])
                .max(self.min[i] - other.max[i])
                .max(T::zero());
            d2 = d2 + gap * gap;
        }
        d2
    }
}
