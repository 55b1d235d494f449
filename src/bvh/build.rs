//! SAH bucket construction of a [`BvhTree`].

use nalgebra::Point;
use tracing::debug;

use crate::aabb::Aabb;
use crate::bounding_hierarchy::{BvhValue, PrimitiveSet};
use crate::bvh::{BvhNode, BvhTree};

const NUM_BUCKETS: usize = 6;

/// Accumulates the properties of one partition candidate during SAH
/// bucketing.
#[derive(Clone, Copy)]
struct Bucket<T: BvhValue, const D: usize> {
    size: usize,
    aabb: Aabb<T, D>,
}

impl<T: BvhValue, const D: usize> Bucket<T, D> {
    fn empty() -> Self {
        Self {
            size: 0,
            aabb: Aabb::empty(),
        }
    }

    fn add_aabb(&mut self, aabb: &Aabb<T, D>) {
        self.size += 1;
        self.aabb.join_mut(aabb);
    }

    fn join_bucket(a: Self, b: &Self) -> Self {
        Self {
            size: a.size + b.size,
            aabb: a.aabb.join(&b.aabb),
        }
    }
}

impl<T: BvhValue, const D: usize> BvhTree<T, D> {
    /// Builds a tree over `set` with at most `max_leaf_size` primitives per
    /// leaf, partitioning by the surface area heuristic.
    ///
    /// A set of zero primitives yields an empty arena.
    pub fn build<S: PrimitiveSet<T, D>>(set: &S, max_leaf_size: usize) -> Self {
        let n = set.len();
        let max_leaf = max_leaf_size.max(1);
        if n == 0 {
            return Self {
                nodes: Vec::new(),
                indices: Vec::new(),
                depth: 0,
            };
        }

        let aabbs: Vec<Aabb<T, D>> = (0..n).map(|i| set.aabb(i)).collect();
        let centers: Vec<Point<T, D>> = aabbs.iter().map(Aabb::center).collect();
        let mut indices: Vec<usize> = (0..n).collect();
        let mut nodes = Vec::with_capacity(2 * n);
        let mut max_depth = 0;

        build_range(
            &aabbs,
            &centers,
            &mut indices,
            0,
            &mut nodes,
            0,
            max_leaf,
            &mut max_depth,
        );

        debug!(
            primitives = n,
            nodes = nodes.len(),
            depth = max_depth,
            "built bvh tree"
        );

        Self {
            nodes,
            indices,
            depth: max_depth,
        }
    }
}

/// Builds the subtree over `indices` (slots `offset..offset + indices.len()`
/// of the permutation) and returns its arena index.
#[allow(clippy::too_many_arguments)]
fn build_range<T: BvhValue, const D: usize>(
    aabbs: &[Aabb<T, D>],
    centers: &[Point<T, D>],
    indices: &mut [usize],
    offset: usize,
    nodes: &mut Vec<BvhNode<T, D>>,
    depth: u32,
    max_leaf: usize,
    max_depth: &mut u32,
) -> usize {
    *max_depth = (*max_depth).max(depth);

    let mut aabb_bounds = Aabb::empty();
    let mut centroid_bounds = Aabb::empty();
    for &i in indices.iter() {
        aabb_bounds.join_mut(&aabbs[i]);
        centroid_bounds.grow_mut(&centers[i]);
    }

    if indices.len() <= max_leaf {
        nodes.push(BvhNode::Leaf {
            aabb: aabb_bounds,
            depth,
            first: offset,
            last: offset + indices.len() - 1,
        });
        return nodes.len() - 1;
    }

    // Split along the axis over which the centroids are spread the most.
    let split_axis = centroid_bounds.largest_axis();
    let split_axis_size = centroid_bounds.max[split_axis] - centroid_bounds.min[split_axis];

    let mid = if split_axis_size < T::epsilon() {
        // The centroids lie too close together for a meaningful SAH split;
        // cut the slot range in half instead.
        indices.len() / 2
    } else {
        bucket_split(aabbs, centers, indices, split_axis, split_axis_size, &aabb_bounds, &centroid_bounds)
    };

    let node_index = nodes.len();
    // Placeholder replaced once both children exist, preserving preorder.
    nodes.push(BvhNode::Leaf {
        aabb: aabb_bounds,
        depth,
        first: offset,
        last: offset,
    });

    let (l_indices, r_indices) = indices.split_at_mut(mid);
    let child_l_index = build_range(
        aabbs, centers, l_indices, offset, nodes, depth + 1, max_leaf, max_depth,
    );
    let child_r_index = build_range(
        aabbs,
        centers,
        r_indices,
        offset + mid,
        nodes,
        depth + 1,
        max_leaf,
        max_depth,
    );

    nodes[node_index] = BvhNode::Node {
        aabb: aabb_bounds,
        depth,
        child_l_index,
        child_r_index,
    };
    node_index
}

/// Partitions `indices` in place by the cheapest SAH bucket cut and returns
/// the left partition size.
fn bucket_split<T: BvhValue, const D: usize>(
    aabbs: &[Aabb<T, D>],
    centers: &[Point<T, D>],
    indices: &mut [usize],
    split_axis: usize,
    split_axis_size: T,
    aabb_bounds: &Aabb<T, D>,
    centroid_bounds: &Aabb<T, D>,
) -> usize {
    let mut buckets = [Bucket::<T, D>::empty(); NUM_BUCKETS];
    let mut bucket_assignments: [Vec<usize>; NUM_BUCKETS] = Default::default();

    for &idx in indices.iter() {
        // Relative position of the centroid in `[0.0..1.0]`, then the bucket.
        let relative =
            (centers[idx][split_axis] - centroid_bounds.min[split_axis]) / split_axis_size;
        let bucket_num = (relative
            * (T::from_usize(NUM_BUCKETS).unwrap() - T::from_f32(0.01).unwrap()))
        .to_usize()
        .unwrap_or(0)
        .min(NUM_BUCKETS - 1);

        buckets[bucket_num].add_aabb(&aabbs[idx]);
        bucket_assignments[bucket_num].push(idx);
    }

    // Select the cut with the minimal cost.
    let mut min_bucket = 0;
    let mut min_cost = T::infinity();
    for i in 0..(NUM_BUCKETS - 1) {
        let (l_buckets, r_buckets) = buckets.split_at(i + 1);
        let child_l = l_buckets.iter().fold(Bucket::empty(), Bucket::join_bucket);
        let child_r = r_buckets.iter().fold(Bucket::empty(), Bucket::join_bucket);

        let cost = (T::from_usize(child_l.size).unwrap() * child_l.aabb.surface_area()
            + T::from_usize(child_r.size).unwrap() * child_r.aabb.surface_area())
            / aabb_bounds.surface_area();
        if cost < min_cost {
            min_bucket = i;
            min_cost = cost;
        }
    }

    let l_count: usize = bucket_assignments[..=min_bucket].iter().map(Vec::len).sum();
    if l_count == 0 || l_count == indices.len() {
        // Degenerate cut (non-finite coordinates); fall back to halves.
        return indices.len() / 2;
    }

    let mut i = 0;
    for group in &bucket_assignments[..=min_bucket] {
        for &idx in group {
            indices[i] = idx;
            i += 1;
        }
    }
    for group in &bucket_assignments[min_bucket + 1..] {
        for &idx in group {
            indices[i] = idx;
            i += 1;
        }
    }
    l_count
}
