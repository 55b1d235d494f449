//! The proximity value: a tolerance-free measure of how far two tessellated
//! shapes stand apart.
//!
//! Every tessellation vertex of one shape is projected onto the other shape;
//! projections whose direction runs along the surface normal measure local
//! shell thickness. The proximity value is the largest such thickness over
//! both sweep directions. When no projection is perpendicular anywhere, the
//! plain closest pair is reported instead.

use std::sync::atomic::{AtomicBool, Ordering};

use nalgebra::Point3;
use rayon::prelude::*;
use tracing::debug;

use crate::bounding_hierarchy::BvhValue;
use crate::bvh::{traverse_best_first, BvhTree};
use crate::distance::{ProjectionStatus, TriangleRegion};
use crate::error::{ProximityError, ProximityResult};
use crate::proximity::point_query::NearestPointMetric;
use crate::triangle_set::TriangleSet;

/// One sample-to-shape solution inside a sweep direction.
#[derive(Debug, Clone, Copy)]
pub struct PairCandidate<T: BvhValue> {
    pub distance_squared: T,
    /// The swept tessellation vertex.
    pub src: Point3<T>,
    /// Its projection on the other shape.
    pub dst: Point3<T>,
    pub region: TriangleRegion,
    /// Index of the sample within the sweep, for order-free tie-breaks.
    pub sample: usize,
    pub primitive: usize,
}

impl<T: BvhValue> PairCandidate<T> {
    fn ranks_before(&self, other: &Self) -> bool {
        self.sample < other.sample
            || (self.sample == other.sample && self.primitive < other.primitive)
    }
}

/// Running extrema of one sweep direction.
#[derive(Debug, Clone, Copy)]
struct DirectionalBest<T: BvhValue> {
    /// Largest perpendicular projection, the thickness candidate.
    perp: Option<PairCandidate<T>>,
    /// Smallest projection of any kind, the fallback.
    plain: Option<PairCandidate<T>>,
}

impl<T: BvhValue> DirectionalBest<T> {
    fn empty() -> Self {
        Self {
            perp: None,
            plain: None,
        }
    }

    fn add_perp(&mut self, cand: PairCandidate<T>) {
        let wins = match &self.perp {
            None => true,
            Some(cur) => {
                cand.distance_squared > cur.distance_squared
                    || (cand.distance_squared == cur.distance_squared && cand.ranks_before(cur))
            }
        };
        if wins {
            self.perp = Some(cand);
        }
    }

    fn add_plain(&mut self, cand: PairCandidate<T>) {
        let wins = match &self.plain {
            None => true,
            Some(cur) => {
                cand.distance_squared < cur.distance_squared
                    || (cand.distance_squared == cur.distance_squared && cand.ranks_before(cur))
            }
        };
        if wins {
            self.plain = Some(cand);
        }
    }

    fn merge(mut self, other: Self) -> Self {
        if let Some(cand) = other.perp {
            self.add_perp(cand);
        }
        if let Some(cand) = other.plain {
            self.add_plain(cand);
        }
        self
    }
}

/// Projects the sample points of one shape onto the other, in parallel.
fn directional_sweep<T: BvhValue>(
    samples: &[Point3<T>],
    other_set: &TriangleSet<T>,
    other_tree: &BvhTree<T, 3>,
    cancel: Option<&AtomicBool>,
) -> ProximityResult<DirectionalBest<T>> {
    samples
        .par_iter()
        .enumerate()
        .try_fold(DirectionalBest::empty, |mut acc, (i, p)| {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                return Err(ProximityError::Cancelled);
            }
            let mut metric = NearestPointMetric::new(other_set, *p);
            traverse_best_first(other_tree, &mut metric, T::infinity());
            if let Some(sample) = metric.finish() {
                acc.add_plain(PairCandidate {
                    distance_squared: sample.nearest.distance_squared,
                    src: *p,
                    dst: sample.nearest.point,
                    region: sample.nearest.region,
                    sample: i,
                    primitive: sample.nearest.primitive,
                });
                if let Some(perp) = sample.perpendicular {
                    acc.add_perp(PairCandidate {
                        distance_squared: perp.distance_squared,
                        src: *p,
                        dst: perp.point,
                        region: perp.region,
                        sample: i,
                        primitive: perp.primitive,
                    });
                }
            }
            Ok(acc)
        })
        .try_reduce(DirectionalBest::empty, |a, b| Ok(a.merge(b)))
}

/// Computes the proximity value between two loaded shapes.
///
/// Construct it, call [`perform`](Self::perform) once, then read the result
/// through the accessors.
pub struct ProximityValue<'a, T: BvhValue> {
    set1: &'a TriangleSet<T>,
    tree1: &'a BvhTree<T, 3>,
    set2: &'a TriangleSet<T>,
    tree2: &'a BvhTree<T, 3>,
    sample_limit1: usize,
    sample_limit2: usize,
    distance: T,
    point1: Point3<T>,
    point2: Point3<T>,
    status1: ProjectionStatus,
    status2: ProjectionStatus,
    done: bool,
}

impl<'a, T: BvhValue> ProximityValue<'a, T> {
    /// The sample limits cap the tessellation vertices swept per side;
    /// zero sweeps them all.
    pub fn new(
        set1: &'a TriangleSet<T>,
        tree1: &'a BvhTree<T, 3>,
        set2: &'a TriangleSet<T>,
        tree2: &'a BvhTree<T, 3>,
        sample_limit1: usize,
        sample_limit2: usize,
    ) -> Self {
        Self {
            set1,
            tree1,
            set2,
            tree2,
            sample_limit1,
            sample_limit2,
            distance: T::infinity(),
            point1: Point3::origin(),
            point2: Point3::origin(),
            status1: ProjectionStatus::Unknown,
            status2: ProjectionStatus::Unknown,
            done: false,
        }
    }

    /// Runs both sweep directions and settles the value.
    pub fn perform(&mut self, cancel: Option<&AtomicBool>) -> ProximityResult<()> {
        let samples1 = self.set1.sample_vertices(self.sample_limit1);
        let samples2 = self.set2.sample_vertices(self.sample_limit2);
        debug!(
            samples1 = samples1.len(),
            samples2 = samples2.len(),
            "starting proximity value sweeps"
        );

        let forward = directional_sweep(&samples1, self.set2, self.tree2, cancel)?;
        let backward = directional_sweep(&samples2, self.set1, self.tree1, cancel)?;

        // The thickness is the larger perpendicular extremum of the two
        // directions; the forward direction wins ties.
        let perp = match (forward.perp, backward.perp) {
            (Some(f), Some(b)) => {
                if b.distance_squared > f.distance_squared {
                    Some((b, false))
                } else {
                    Some((f, true))
                }
            }
            (Some(f), None) => Some((f, true)),
            (None, Some(b)) => Some((b, false)),
            (None, None) => None,
        };

        let winner = match perp {
            Some(w) => Some(w),
            // No perpendicular projection exists anywhere; fall back to the
            // plain closest pair over both directions.
            None => match (forward.plain, backward.plain) {
                (Some(f), Some(b)) => {
                    if b.distance_squared < f.distance_squared {
                        Some((b, false))
                    } else {
                        Some((f, true))
                    }
                }
                (Some(f), None) => Some((f, true)),
                (None, Some(b)) => Some((b, false)),
                (None, None) => None,
            },
        };

        let (cand, is_forward) = winner.ok_or(ProximityError::EmptySet)?;
        self.distance = cand.distance_squared.sqrt();

        // Each side reports the projection the opposite sweep produced on
        // it, classified from that projection's own region. A side nothing
        // projected onto perpendicularly falls back to the winning pair's
        // sample vertex on that side, carrying the winning region.
        let status = cand.region.status();
        if is_forward {
            self.point1 = cand.src;
            self.point2 = cand.dst;
        } else {
            self.point1 = cand.dst;
            self.point2 = cand.src;
        }
        self.status1 = status;
        self.status2 = status;
        if perp.is_some() {
            if let Some(b) = backward.perp {
                self.point1 = b.dst;
                self.status1 = b.region.status();
            }
            if let Some(f) = forward.perp {
                self.point2 = f.dst;
                self.status2 = f.region.status();
            }
        }
        self.done = true;
        debug!(distance = %self.distance, "proximity value settled");
        Ok(())
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn distance(&self) -> T {
        self.distance
    }

    pub fn point1(&self) -> Point3<T> {
        self.point1
    }

    pub fn point2(&self) -> Point3<T> {
        self.point2
    }

    pub fn status1(&self) -> ProjectionStatus {
        self.status1
    }

    pub fn status2(&self) -> ProjectionStatus {
        self.status2
    }
}
