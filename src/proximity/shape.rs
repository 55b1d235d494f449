//! Tolerance screening and proximity measurement between two shapes.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nalgebra::Point3;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::aabb::Aabb;
use crate::bounding_hierarchy::{BvhValue, PrimitiveSet};
use crate::bvh::{traverse_best_first, BvhTree, TraverseMetric};
use crate::distance::{triangle_triangle_distance_squared, ProjectionStatus};
use crate::error::{ProximityError, ProximityResult};
use crate::proximity::value::ProximityValue;
use crate::triangle_set::TriangleSet;

const DEFAULT_MAX_LEAF: usize = 4;

struct LoadedShape<T: BvhValue> {
    set: TriangleSet<T>,
    tree: BvhTree<T, 3>,
}

/// Collects every primitive of the opposite shape within tolerance of one
/// fixed triangle. The incumbent never tightens, so the whole slab within
/// the tolerance is visited.
struct OverlapMetric<'a, T: BvhValue> {
    set: &'a TriangleSet<T>,
    triangle: [Point3<T>; 3],
    aabb: Aabb<T, 3>,
    tolerance_squared: T,
    hits: Vec<usize>,
}

impl<T: BvhValue> TraverseMetric<T, 3> for OverlapMetric<'_, T> {
    type Bound = T;
    type Best = T;

    fn reject(&self, aabb: &Aabb<T, 3>, best: &T) -> Option<T> {
        let d2 = aabb.distance_squared_to_aabb(&self.aabb);
        (d2 <= *best).then_some(d2)
    }

    fn accept(&mut self, index: usize, _best: &T) -> Option<T> {
        let other = self.set.triangle_vertices(index);
        if triangle_triangle_distance_squared(&self.triangle, &other) <= self.tolerance_squared {
            self.hits.push(index);
        }
        None
    }
}

/// Proximity queries between two tessellated shapes.
///
/// With a finite tolerance, [`perform`](Self::perform) reports every pair of
/// sub-shapes (faces) whose triangles come within the tolerance of each
/// other; an intersection counts at any tolerance, including zero. With the
/// tolerance left infinite, it computes the proximity value and a
/// representative point with a projection status on each shape.
///
/// Results are valid only while [`is_done`](Self::is_done) returns `true`;
/// reloading a shape or changing the tolerance resets it.
pub struct ShapeProximity<T: BvhValue> {
    tolerance: T,
    sample_limit1: usize,
    sample_limit2: usize,
    shape1: Option<LoadedShape<T>>,
    shape2: Option<LoadedShape<T>>,
    cancel: Option<Arc<AtomicBool>>,
    done: bool,
    distance: T,
    point1: Point3<T>,
    point2: Point3<T>,
    status1: ProjectionStatus,
    status2: ProjectionStatus,
    overlap1: BTreeMap<u32, BTreeSet<u32>>,
    overlap2: BTreeMap<u32, BTreeSet<u32>>,
}

impl<T: BvhValue> ShapeProximity<T> {
    /// A query in overlap mode with the given tolerance, or in
    /// proximity-value mode when `tolerance` is infinite.
    pub fn new(tolerance: T) -> Self {
        Self {
            tolerance,
            sample_limit1: 0,
            sample_limit2: 0,
            shape1: None,
            shape2: None,
            cancel: None,
            done: false,
            distance: T::infinity(),
            point1: Point3::origin(),
            point2: Point3::origin(),
            status1: ProjectionStatus::Unknown,
            status2: ProjectionStatus::Unknown,
            overlap1: BTreeMap::new(),
            overlap2: BTreeMap::new(),
        }
    }

    /// A query in proximity-value mode.
    pub fn new_infinite() -> Self {
        Self::new(T::infinity())
    }

    pub fn tolerance(&self) -> T {
        self.tolerance
    }

    pub fn set_tolerance(&mut self, tolerance: T) {
        self.tolerance = tolerance;
        self.done = false;
    }

    /// Caps the tessellation vertices swept per side in proximity-value
    /// mode; zero sweeps them all.
    pub fn set_sample_limits(&mut self, limit1: usize, limit2: usize) {
        self.sample_limit1 = limit1;
        self.sample_limit2 = limit2;
        self.done = false;
    }

    /// Installs a flag that cancels a running [`perform`](Self::perform)
    /// when raised from another thread.
    pub fn set_cancel_flag(&mut self, flag: Arc<AtomicBool>) {
        self.cancel = Some(flag);
    }

    pub fn load_shape1(&mut self, set: TriangleSet<T>) -> ProximityResult<()> {
        self.shape1 = Some(Self::load(set)?);
        self.done = false;
        Ok(())
    }

    pub fn load_shape2(&mut self, set: TriangleSet<T>) -> ProximityResult<()> {
        self.shape2 = Some(Self::load(set)?);
        self.done = false;
        Ok(())
    }

    fn load(set: TriangleSet<T>) -> ProximityResult<LoadedShape<T>> {
        if set.is_empty() {
            return Err(ProximityError::EmptySet);
        }
        let tree = BvhTree::build(&set, DEFAULT_MAX_LEAF);
        Ok(LoadedShape { set, tree })
    }

    /// Runs the query over the loaded shapes.
    ///
    /// Repeatable: each call recomputes from the current shapes, tolerance
    /// and sample limits.
    pub fn perform(&mut self) -> ProximityResult<()> {
        let (Some(shape1), Some(shape2)) = (&self.shape1, &self.shape2) else {
            return Err(ProximityError::NotLoaded);
        };
        self.done = false;
        self.overlap1.clear();
        self.overlap2.clear();
        let cancel = self.cancel.as_deref();

        if self.tolerance.is_finite() {
            let pairs = overlap_pairs(shape1, shape2, self.tolerance, cancel)?;
            info!(
                tolerance = %self.tolerance,
                pairs = pairs.len(),
                "overlap query finished"
            );
            for (i, j) in pairs {
                let face1 = shape1.set.face_of(i);
                let face2 = shape2.set.face_of(j);
                self.overlap1.entry(face1).or_default().insert(face2);
                self.overlap2.entry(face2).or_default().insert(face1);
            }
        } else {
            let mut value = ProximityValue::new(
                &shape1.set,
                &shape1.tree,
                &shape2.set,
                &shape2.tree,
                self.sample_limit1,
                self.sample_limit2,
            );
            value.perform(cancel)?;
            self.distance = value.distance();
            self.point1 = value.point1();
            self.point2 = value.point2();
            self.status1 = value.status1();
            self.status2 = value.status2();
        }
        self.done = true;
        Ok(())
    }

    /// Whether the last [`perform`](Self::perform) ran to completion with
    /// the current inputs.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// The proximity value of the last proximity-mode run.
    pub fn proximity(&self) -> T {
        self.distance
    }

    pub fn proximity_point1(&self) -> Point3<T> {
        self.point1
    }

    pub fn proximity_point2(&self) -> Point3<T> {
        self.point2
    }

    pub fn prox_pnt_status1(&self) -> ProjectionStatus {
        self.status1
    }

    pub fn prox_pnt_status2(&self) -> ProjectionStatus {
        self.status2
    }

    /// Faces of shape 1 mapped to the shape 2 faces they come within
    /// tolerance of.
    pub fn overlap_sub_shapes1(&self) -> &BTreeMap<u32, BTreeSet<u32>> {
        &self.overlap1
    }

    /// The same pairs keyed from the shape 2 side.
    pub fn overlap_sub_shapes2(&self) -> &BTreeMap<u32, BTreeSet<u32>> {
        &self.overlap2
    }
}

/// All `(primitive1, primitive2)` pairs within `tolerance`, one
/// branch-and-bound pass per shape 1 primitive, in parallel.
fn overlap_pairs<T: BvhValue>(
    shape1: &LoadedShape<T>,
    shape2: &LoadedShape<T>,
    tolerance: T,
    cancel: Option<&AtomicBool>,
) -> ProximityResult<Vec<(usize, usize)>> {
    let tolerance_squared = tolerance * tolerance;
    debug!(primitives = shape1.set.len(), "starting overlap screening");
    (0..shape1.set.len())
        .into_par_iter()
        .try_fold(Vec::new, |mut acc: Vec<(usize, usize)>, i| {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                return Err(ProximityError::Cancelled);
            }
            let mut metric = OverlapMetric {
                set: &shape2.set,
                triangle: shape1.set.triangle_vertices(i),
                aabb: shape1.set.aabb(i),
                tolerance_squared,
                hits: Vec::new(),
            };
            traverse_best_first(&shape2.tree, &mut metric, tolerance_squared);
            acc.extend(metric.hits.into_iter().map(|j| (i, j)));
            Ok(acc)
        })
        .try_reduce(Vec::new, |mut a, mut b| {
            a.append(&mut b);
            Ok(a)
        })
}
