//! Nearest-point query from one sample point to a whole triangle set.

use nalgebra::Point3;

use crate::aabb::Aabb;
use crate::bounding_hierarchy::BvhValue;
use crate::bvh::TraverseMetric;
use crate::distance::{closest_point_on_triangle, TriangleRegion};
use crate::triangle_set::TriangleSet;

/// Squared cosine of the angular tolerance under which a border projection
/// still counts as perpendicular (about 8 degrees).
const PERP_COS2: f64 = 0.9801;

/// One closest-point solution against a triangle set.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<T: BvhValue> {
    pub distance_squared: T,
    pub point: Point3<T>,
    pub primitive: usize,
    pub region: TriangleRegion,
}

impl<T: BvhValue> Candidate<T> {
    /// Whether this candidate beats `current`, with equal distances resolved
    /// towards the lower primitive index so results do not depend on
    /// traversal order. A NaN distance never wins and never survives, so a
    /// primitive with NaN coordinates cannot poison the result.
    fn beats(&self, current: &Option<Self>) -> bool {
        if self.distance_squared.is_nan() {
            return false;
        }
        match current {
            None => true,
            Some(cur) => {
                cur.distance_squared.is_nan()
                    || self.distance_squared < cur.distance_squared
                    || (self.distance_squared == cur.distance_squared
                        && self.primitive < cur.primitive)
            }
        }
    }
}

/// The two answers a sample query produces: the plain nearest point, and the
/// nearest point whose connecting direction is perpendicular to the surface,
/// when one exists.
#[derive(Debug, Clone, Copy)]
pub struct SampleDistance<T: BvhValue> {
    pub nearest: Candidate<T>,
    pub perpendicular: Option<Candidate<T>>,
}

/// Traversal metric computing [`SampleDistance`] for one query point.
///
/// The branch-and-bound incumbent is the perpendicular best. Each triangle's
/// perpendicular candidate is the same closest point as its plain candidate,
/// so the perpendicular best never undercuts the plain best and subtrees
/// holding the plain winner are always visited.
pub struct NearestPointMetric<'a, T: BvhValue> {
    set: &'a TriangleSet<T>,
    query: Point3<T>,
    nearest: Option<Candidate<T>>,
    perpendicular: Option<Candidate<T>>,
}

impl<'a, T: BvhValue> NearestPointMetric<'a, T> {
    pub fn new(set: &'a TriangleSet<T>, query: Point3<T>) -> Self {
        Self {
            set,
            query,
            nearest: None,
            perpendicular: None,
        }
    }

    /// Finishes the query, returning `None` only for an empty set.
    pub fn finish(self) -> Option<SampleDistance<T>> {
        self.nearest.map(|nearest| SampleDistance {
            nearest,
            perpendicular: self.perpendicular,
        })
    }

    /// Whether the direction from the closest point back to the query runs
    /// along the triangle normal, within the angular tolerance.
    fn is_perpendicular(&self, candidate: &Candidate<T>) -> bool {
        if candidate.distance_squared == T::zero() {
            return true;
        }
        match candidate.region {
            TriangleRegion::Interior => true,
            TriangleRegion::Degenerate => false,
            TriangleRegion::Vertex(_) | TriangleRegion::Edge(_) => {
                let [a, b, c] = self.set.triangle_vertices(candidate.primitive);
                let n = (b - a).cross(&(c - a));
                let n2 = n.dot(&n);
                if !(n2 > T::zero()) {
                    return false;
                }
                let dir = self.query - candidate.point;
                let dot = dir.dot(&n);
                dot * dot >= T::from_f64(PERP_COS2).unwrap() * candidate.distance_squared * n2
            }
        }
    }
}

impl<T: BvhValue> TraverseMetric<T, 3> for NearestPointMetric<'_, T> {
    type Bound = T;
    type Best = T;

    fn reject(&self, aabb: &Aabb<T, 3>, best: &T) -> Option<T> {
        let d2 = aabb.distance_squared_to_point(&self.query);
        (d2 <= *best).then_some(d2)
    }

    fn accept(&mut self, index: usize, best: &T) -> Option<T> {
        let [a, b, c] = self.set.triangle_vertices(index);
        let (point, region) = closest_point_on_triangle(&self.query, &a, &b, &c);
        let diff = self.query - point;
        let candidate = Candidate {
            distance_squared: diff.dot(&diff),
            point,
            primitive: index,
            region,
        };

        if candidate.beats(&self.nearest) {
            self.nearest = Some(candidate);
        }
        if self.is_perpendicular(&candidate) && candidate.beats(&self.perpendicular) {
            self.perpendicular = Some(candidate);
            if candidate.distance_squared < *best {
                return Some(candidate.distance_squared);
            }
        }
        None
    }
}
