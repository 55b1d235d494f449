//! Closest-point and overlap primitives over triangles.
//!
//! Everything here works in squared distances; callers take the root once,
//! at the end, if they need the metric value.

use nalgebra::{Point3, Vector3};

use crate::bounding_hierarchy::BvhValue;

/// Classification of a point projected onto a shape boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProjectionStatus {
    /// The projection landed on a triangle edge or corner.
    Border,
    /// The projection landed strictly inside a triangle.
    Middle,
    /// No classification is available.
    Unknown,
}

/// Where on a triangle the closest point to a query lies.
///
/// Vertices are numbered `0..3` in corner order; edge `i` connects corners
/// `i` and `(i + 1) % 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriangleRegion {
    Vertex(u8),
    Edge(u8),
    Interior,
    /// The triangle has no well-defined plane; the result came from an edge
    /// fallback.
    Degenerate,
}

impl TriangleRegion {
    pub fn status(self) -> ProjectionStatus {
        match self {
            TriangleRegion::Interior => ProjectionStatus::Middle,
            TriangleRegion::Vertex(_) | TriangleRegion::Edge(_) => ProjectionStatus::Border,
            TriangleRegion::Degenerate => ProjectionStatus::Unknown,
        }
    }
}

/// Closest point to `p` on the segment `ab`, with the clamped parameter.
pub fn closest_point_on_segment<T: BvhValue>(
    p: &Point3<T>,
    a: &Point3<T>,
    b: &Point3<T>,
) -> (Point3<T>, T) {
    let ab = b - a;
    let denom = ab.dot(&ab);
    if !(denom > T::zero()) {
        return (*a, T::zero());
    }
    let t = ((p - a).dot(&ab) / denom).max(T::zero()).min(T::one());
    (a + ab * t, t)
}

/// Closest point to `p` on triangle `abc`, classified by the Voronoi region
/// it fell into.
///
/// A degenerate triangle (collinear or repeated corners) is handled by
/// scanning its edges, and reports [`TriangleRegion::Degenerate`].
pub fn closest_point_on_triangle<T: BvhValue>(
    p: &Point3<T>,
    a: &Point3<T>,
    b: &Point3<T>,
    c: &Point3<T>,
) -> (Point3<T>, TriangleRegion) {
    let ab = b - a;
    let ac = c - a;
    let n = ab.cross(&ac);
    if !(n.dot(&n) > T::zero()) {
        // No plane to project onto.
        let mut best = closest_point_on_segment(p, a, b).0;
        let mut best_d2 = (p - best).dot(&(p - best));
        for (s, e) in [(b, c), (c, a)] {
            let q = closest_point_on_segment(p, s, e).0;
            let d2 = (p - q).dot(&(p - q));
            if d2 < best_d2 {
                best = q;
                best_d2 = d2;
            }
        }
        return (best, TriangleRegion::Degenerate);
    }

    // Voronoi region walk after Ericson, "Real-Time Collision Detection",
    // section 5.1.5.
    let ap = p - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= T::zero() && d2 <= T::zero() {
        return (*a, TriangleRegion::Vertex(0));
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= T::zero() && d4 <= d3 {
        return (*b, TriangleRegion::Vertex(1));
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= T::zero() && d1 >= T::zero() && d3 <= T::zero() {
        let v = d1 / (d1 - d3);
        return (a + ab * v, TriangleRegion::Edge(0));
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= T::zero() && d5 <= d6 {
        return (*c, TriangleRegion::Vertex(2));
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= T::zero() && d2 >= T::zero() && d6 <= T::zero() {
        let w = d2 / (d2 - d6);
        return (a + ac * w, TriangleRegion::Edge(2));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= T::zero() && (d4 - d3) >= T::zero() && (d5 - d6) >= T::zero() {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return (b + (c - b) * w, TriangleRegion::Edge(1));
    }

    let denom = T::one() / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    (a + ab * v + ac * w, TriangleRegion::Interior)
}

/// Closest points between segments `p1q1` and `p2q2` (Ericson 5.1.9).
pub fn closest_points_on_segments<T: BvhValue>(
    p1: &Point3<T>,
    q1: &Point3<T>,
    p2: &Point3<T>,
    q2: &Point3<T>,
) -> (Point3<T>, Point3<T>) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.dot(&d1);
    let e = d2.dot(&d2);
    let f = d2.dot(&r);

    let zero = T::zero();
    let one = T::one();

    if !(a > zero) && !(e > zero) {
        return (*p1, *p2);
    }
    let (s, t) = if !(a > zero) {
        (zero, (f / e).max(zero).min(one))
    } else {
        let c = d1.dot(&r);
        if !(e > zero) {
            ((-c / a).max(zero).min(one), zero)
        } else {
            let b = d1.dot(&d2);
            let denom = a * e - b * b;
            let mut s = if denom > zero {
                ((b * f - c * e) / denom).max(zero).min(one)
            } else {
                zero
            };
            let t_nom = b * s + f;
            let t = if t_nom < zero {
                s = (-c / a).max(zero).min(one);
                zero
            } else if t_nom > e {
                s = ((b - c) / a).max(zero).min(one);
                one
            } else {
                t_nom / e
            };
            (s, t)
        }
    };
    (p1 + d1 * s, p2 + d2 * t)
}

/// Whether triangles `t1` and `t2` share at least one point, by separating
/// axis tests.
///
/// A triangle with no well-defined plane never claims an intersection here;
/// degenerate input falls through to the distance path.
pub fn triangles_intersect<T: BvhValue>(t1: &[Point3<T>; 3], t2: &[Point3<T>; 3]) -> bool {
    let e1 = [t1[1] - t1[0], t1[2] - t1[1], t1[0] - t1[2]];
    let e2 = [t2[1] - t2[0], t2[2] - t2[1], t2[0] - t2[2]];
    let n1 = e1[0].cross(&e1[1]);
    let n2 = e2[0].cross(&e2[1]);
    if !(n1.dot(&n1) > T::zero()) || !(n2.dot(&n2) > T::zero()) {
        return false;
    }

    if separated_on_axis(&n1, t1, t2) || separated_on_axis(&n2, t1, t2) {
        return false;
    }
    for a in &e1 {
        for b in &e2 {
            let axis = a.cross(b);
            if axis.dot(&axis) > T::zero() && separated_on_axis(&axis, t1, t2) {
                return false;
            }
        }
    }
    // Coplanar pairs defeat every cross axis; test the in-plane edge normals.
    for e in e1.iter().chain(e2.iter()) {
        let axis = n1.cross(e);
        if axis.dot(&axis) > T::zero() && separated_on_axis(&axis, t1, t2) {
            return false;
        }
    }
    true
}

fn separated_on_axis<T: BvhValue>(
    axis: &Vector3<T>,
    t1: &[Point3<T>; 3],
    t2: &[Point3<T>; 3],
) -> bool {
    let project = |t: &[Point3<T>; 3]| {
        let mut min = T::infinity();
        let mut max = T::neg_infinity();
        for p in t {
            let d = axis.dot(&p.coords);
            min = min.min(d);
            max = max.max(d);
        }
        (min, max)
    };
    let (min1, max1) = project(t1);
    let (min2, max2) = project(t2);
    max1 < min2 || max2 < min1
}

/// Squared distance between two triangles; zero when they intersect.
pub fn triangle_triangle_distance_squared<T: BvhValue>(
    t1: &[Point3<T>; 3],
    t2: &[Point3<T>; 3],
) -> T {
    if triangles_intersect(t1, t2) {
        return T::zero();
    }

    let mut best = T::infinity();
    for p in t1 {
        let (q, _) = closest_point_on_triangle(p, &t2[0], &t2[1], &t2[2]);
        best = best.min((p - q).dot(&(p - q)));
    }
    for p in t2 {
        let (q, _) = closest_point_on_triangle(p, &t1[0], &t1[1], &t1[2]);
        best = best.min((p - q).dot(&(p - q)));
    }
    for i in 0..3 {
        for j in 0..3 {
            let (p, q) = closest_points_on_segments(
                &t1[i],
                &t1[(i + 1) % 3],
                &t2[j],
                &t2[(j + 1) % 3],
            );
            best = best.min((p - q).dot(&(p - q)));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;
    use nalgebra::Point3;
    use proptest::prelude::*;

    use super::*;
    use crate::testbase::{tuple_to_point, tuplevec_small_strategy};

    fn tri() -> [Point3<f64>; 3] {
        [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ]
    }

    #[test]
    fn triangle_regions_classify() {
        let [a, b, c] = tri();
        let cases = [
            (Point3::new(-1.0, -1.0, 0.0), TriangleRegion::Vertex(0)),
            (Point3::new(3.0, -1.0, 0.0), TriangleRegion::Vertex(1)),
            (Point3::new(-1.0, 3.0, 0.0), TriangleRegion::Vertex(2)),
            (Point3::new(1.0, -1.0, 0.0), TriangleRegion::Edge(0)),
            (Point3::new(2.0, 2.0, 0.0), TriangleRegion::Edge(1)),
            (Point3::new(-1.0, 1.0, 0.0), TriangleRegion::Edge(2)),
            (Point3::new(0.5, 0.5, 5.0), TriangleRegion::Interior),
        ];
        for (p, region) in cases {
            let (_, got) = closest_point_on_triangle(&p, &a, &b, &c);
            assert_eq!(got, region, "query {p}");
        }
    }

    #[test]
    fn interior_projection_distance_is_height() {
        let [a, b, c] = tri();
        let p = Point3::new(0.5, 0.5, 3.0);
        let (q, region) = closest_point_on_triangle(&p, &a, &b, &c);
        assert_eq!(region, TriangleRegion::Interior);
        assert_float_eq!((p - q).norm(), 3.0, ulps <= 4);
    }

    #[test]
    fn degenerate_triangle_falls_back_to_edges() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(2.0, 0.0, 0.0);
        let p = Point3::new(1.0, 2.0, 0.0);
        let (q, region) = closest_point_on_triangle(&p, &a, &b, &c);
        assert_eq!(region, TriangleRegion::Degenerate);
        assert_float_eq!((p - q).norm(), 2.0, ulps <= 4u64);
    }

    #[test]
    fn segment_pair_parallel_and_crossing() {
        let (p, q) = closest_points_on_segments(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
            &Point3::new(1.0, 1.0, 0.0),
        );
        assert_float_eq!((p - q).norm(), 1.0, ulps <= 4u64);

        let (p, q) = closest_points_on_segments(
            &Point3::new(-1.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, -1.0, 1.0),
            &Point3::new(0.0, 1.0, 1.0),
        );
        assert_float_eq!((p - q).norm(), 1.0, ulps <= 4u64);
    }

    #[test]
    fn piercing_triangles_intersect() {
        let t1 = tri();
        let t2 = [
            Point3::new(0.5, 0.5, -1.0),
            Point3::new(0.5, 0.5, 1.0),
            Point3::new(1.5, 0.5, 0.0),
        ];
        assert!(triangles_intersect(&t1, &t2));
        assert_eq!(triangle_triangle_distance_squared(&t1, &t2), 0.0);
    }

    #[test]
    fn coplanar_triangles() {
        let t1 = tri();
        // Overlapping in the same plane.
        let t2 = [
            Point3::new(0.5, 0.5, 0.0),
            Point3::new(2.5, 0.5, 0.0),
            Point3::new(0.5, 2.5, 0.0),
        ];
        assert!(triangles_intersect(&t1, &t2));
        // Disjoint in the same plane.
        let t3 = [
            Point3::new(5.0, 0.0, 0.0),
            Point3::new(7.0, 0.0, 0.0),
            Point3::new(5.0, 2.0, 0.0),
        ];
        assert!(!triangles_intersect(&t1, &t3));
        assert_float_eq!(triangle_triangle_distance_squared(&t1, &t3), 9.0, ulps <= 4);
    }

    #[test]
    fn parallel_plates_distance() {
        let t1 = tri();
        let t2 = [
            Point3::new(0.0, 0.0, 2.0),
            Point3::new(2.0, 0.0, 2.0),
            Point3::new(0.0, 2.0, 2.0),
        ];
        assert!(!triangles_intersect(&t1, &t2));
        assert_float_eq!(triangle_triangle_distance_squared(&t1, &t2), 4.0, ulps <= 4);
    }

    #[test]
    fn degenerate_triangle_never_claims_intersection() {
        let t1 = tri();
        let needle = [
            Point3::new(3.0, 0.0, -1.0),
            Point3::new(3.0, 0.0, 1.0),
            Point3::new(3.0, 0.0, 1.0),
        ];
        assert!(!triangles_intersect(&t1, &needle));
        // The distance path still resolves it through edge pairs.
        assert_float_eq!(triangle_triangle_distance_squared(&t1, &needle), 1.0, ulps <= 4);
    }

    proptest! {
        // The closest point returned never loses to any corner of the
        // triangle.
        #[test]
        fn closest_point_beats_corners(
            p in tuplevec_small_strategy(),
            a in tuplevec_small_strategy(),
            b in tuplevec_small_strategy(),
            c in tuplevec_small_strategy(),
        ) {
            let p = tuple_to_point(&p);
            let a = tuple_to_point(&a);
            let b = tuple_to_point(&b);
            let c = tuple_to_point(&c);
            let (q, _) = closest_point_on_triangle(&p, &a, &b, &c);
            let d2 = (p - q).norm_squared();
            for corner in [a, b, c] {
                prop_assert!(d2 <= (p - corner).norm_squared() + 1e-9);
            }
        }

        // Symmetry of the pairwise triangle distance.
        #[test]
        fn triangle_distance_is_symmetric(
            a in tuplevec_small_strategy(),
            b in tuplevec_small_strategy(),
            c in tuplevec_small_strategy(),
            d in tuplevec_small_strategy(),
            e in tuplevec_small_strategy(),
            f in tuplevec_small_strategy(),
        ) {
            let t1 = [tuple_to_point(&a), tuple_to_point(&b), tuple_to_point(&c)];
            let t2 = [tuple_to_point(&d), tuple_to_point(&e), tuple_to_point(&f)];
            let d12 = triangle_triangle_distance_squared(&t1, &t2);
            let d21 = triangle_triangle_distance_squared(&t2, &t1);
            prop_assert!((d12 - d21).abs() <= 1e-9 * (1.0 + d12.abs()));
        }
    }
}
