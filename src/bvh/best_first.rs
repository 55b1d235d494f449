//! Best-first branch-and-bound traversal of a [`BvhTree`].

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::aabb::Aabb;
use crate::bounding_hierarchy::BvhValue;
use crate::bvh::{BvhNode, BvhTree};

/// A scoring policy driving [`traverse_best_first`].
///
/// `Bound` orders subtrees on the frontier; nodes whose bound shows the
/// subtree can no longer improve the incumbent are pruned without being
/// descended into.
pub trait TraverseMetric<T: BvhValue, const D: usize> {
    /// The monotone lower bound assigned to subtree volumes.
    type Bound: PartialOrd + Copy;
    /// The incumbent state refined at every accepted primitive.
    type Best: Copy;

    /// Returns a lower bound for everything inside `aabb`, or `None` if the
    /// subtree can never improve on `best` and may be dropped outright.
    ///
    /// A subtree merely tied with `best` must still return `Some` so the
    /// metric sees every primitive attaining the optimum and can break ties
    /// itself.
    fn reject(&self, aabb: &Aabb<T, D>, best: &Self::Best) -> Option<Self::Bound>;

    /// Scores the primitive at `index` against `best`, returning the improved
    /// incumbent if this primitive beats it.
    fn accept(&mut self, index: usize, best: &Self::Best) -> Option<Self::Best>;
}

/// Heap entry pairing a node with the lower bound of its subtree.
struct NodeBound<B: PartialOrd + Copy> {
    bound: B,
    node: usize,
}

impl<B: PartialOrd + Copy> PartialEq for NodeBound<B> {
    fn eq(&self, other: &Self) -> bool {
        self.bound == other.bound
    }
}

impl<B: PartialOrd + Copy> Eq for NodeBound<B> {}

impl<B: PartialOrd + Copy> PartialOrd for NodeBound<B> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<B: PartialOrd + Copy> Ord for NodeBound<B> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the std max-heap pops the smallest bound first.
        self.bound
            .partial_cmp(&other.bound)
            .unwrap_or(Ordering::Equal)
            .reverse()
    }
}

/// Walks `tree` in order of ascending subtree bound, refining `best` through
/// `metric` until no pending subtree can still beat the incumbent.
pub fn traverse_best_first<T, const D: usize, M>(
    tree: &BvhTree<T, D>,
    metric: &mut M,
    initial_best: M::Best,
) -> M::Best
where
    T: BvhValue,
    M: TraverseMetric<T, D>,
{
    let mut best = initial_best;
    if tree.is_empty() {
        return best;
    }

    let mut heap = BinaryHeap::new();
    if let Some(bound) = metric.reject(tree.node(0).aabb(), &best) {
        heap.push(NodeBound { bound, node: 0 });
    }

    while let Some(NodeBound { node, .. }) = heap.pop() {
        // The frontier is sorted by bound; once the cheapest pending subtree
        // cannot improve the incumbent any more, nothing remaining can.
        if metric.reject(tree.node(node).aabb(), &best).is_none() {
            break;
        }
        match *tree.node(node) {
            BvhNode::Leaf { first, last, .. } => {
                for slot in first..=last {
                    if let Some(better) = metric.accept(tree.primitive(slot), &best) {
                        best = better;
                    }
                }
            }
            BvhNode::Node {
                child_l_index,
                child_r_index,
                ..
            } => {
                for child in [child_l_index, child_r_index] {
                    if let Some(bound) = metric.reject(tree.node(child).aabb(), &best) {
                        heap.push(NodeBound { bound, node: child });
                    }
                }
            }
        }
    }
    best
}
