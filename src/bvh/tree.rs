use crate::aabb::Aabb;
use crate::bounding_hierarchy::BvhValue;

/// One node of a [`BvhTree`]: either a leaf owning a slot range, or an inner
/// node referencing two children by arena index. Every node stores its own
/// box and its depth below the root.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BvhNode<T: BvhValue, const D: usize> {
    /// Leaf node: owns the primitive slots `first..=last`.
    Leaf {
        /// The box bounding every owned primitive.
        aabb: Aabb<T, D>,
        /// Levels below the root.
        depth: u32,
        /// First owned slot in the tree's permutation.
        first: usize,
        /// Last owned slot, inclusive.
        last: usize,
    },
    /// Inner node: bounds both children.
    Node {
        /// The box bounding every descendant primitive.
        aabb: Aabb<T, D>,
        /// Levels below the root.
        depth: u32,
        /// Arena index of the left subtree's root.
        child_l_index: usize,
        /// Arena index of the right subtree's root.
        child_r_index: usize,
    },
}

impl<T: BvhValue, const D: usize> BvhNode<T, D> {
    /// The box of this node.
    pub fn aabb(&self) -> &Aabb<T, D> {
        match self {
            BvhNode::Leaf { aabb, .. } | BvhNode::Node { aabb, .. } => aabb,
        }
    }

    /// Levels below the root.
    pub fn depth(&self) -> u32 {
        match *self {
            BvhNode::Leaf { depth, .. } | BvhNode::Node { depth, .. } => depth,
        }
    }

    /// Whether this node is a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self, BvhNode::Leaf { .. })
    }
}

/// A flattened bounding volume hierarchy over a primitive set.
///
/// Pure storage: nodes live in one contiguous arena and address their
/// children by index, never by pointer; searching lives in
/// [`traverse_best_first`](crate::bvh::traverse_best_first). The tree keeps
/// a permutation of primitive indices so that each leaf owns a contiguous
/// slot range; together the leaf ranges partition the whole slot space.
///
/// A tree is immutable after construction. Geometry changes require a
/// rebuild which replaces the whole arena.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BvhTree<T: BvhValue, const D: usize> {
    pub(crate) nodes: Vec<BvhNode<T, D>>,
    pub(crate) indices: Vec<usize>,
    pub(crate) depth: u32,
}

impl<T: BvhValue, const D: usize> BvhTree<T, D> {
    /// Number of nodes in the arena. Zero for a tree over zero primitives,
    /// in which case every query vacuously fails.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the arena holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The maximum node depth; the root is at depth 0.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// The node at arena index `index`. The root is node 0.
    pub fn node(&self, index: usize) -> &BvhNode<T, D> {
        &self.nodes[index]
    }

    /// Number of primitives the tree was built over.
    pub fn primitive_count(&self) -> usize {
        self.indices.len()
    }

    /// Maps a leaf slot back to the index of the primitive stored there.
    pub fn primitive(&self, slot: usize) -> usize {
        self.indices[slot]
    }
}

#[cfg(test)]
mod tests {
    use crate::bounding_hierarchy::PrimitiveSet;
    use crate::bvh::{BvhNode, BvhTree};
    use crate::testbase::{random_triangle_cloud, TBvh3};

    /// Checks the structural invariants of a tree: every node's box contains
    /// its children's boxes, leaf ranges exactly partition the slot space,
    /// and depth increases from root to leaf.
    pub fn assert_tree_invariants(tree: &TBvh3, primitive_count: usize) {
        assert_eq!(tree.primitive_count(), primitive_count);

        let mut covered = vec![false; primitive_count];
        for node in &tree.nodes {
            match *node {
                BvhNode::Leaf {
                    ref aabb,
                    first,
                    last,
                    ..
                } => {
                    assert!(first <= last);
                    for slot in first..=last {
                        assert!(!covered[slot], "slot {slot} owned by two leaves");
                        covered[slot] = true;
                    }
                    assert!(!aabb.is_empty());
                }
                BvhNode::Node {
                    ref aabb,
                    depth,
                    child_l_index,
                    child_r_index,
                } => {
                    for child in [child_l_index, child_r_index] {
                        let child = tree.node(child);
                        assert_eq!(child.depth(), depth + 1);
                        assert!(aabb.contains_aabb(child.aabb()));
                    }
                }
            }
        }
        assert!(covered.iter().all(|&c| c), "leaf ranges leave gaps");

        // The permutation must be a bijection on primitive indices.
        let mut seen = vec![false; primitive_count];
        for slot in 0..primitive_count {
            let prim = tree.primitive(slot);
            assert!(!seen[prim]);
            seen[prim] = true;
        }
    }

    #[test]
    fn test_tree_invariants_random_cloud() {
        for seed in 0..4u64 {
            let set = random_triangle_cloud(257, seed);
            for max_leaf in [1, 4, 16] {
                let tree = BvhTree::build(&set, max_leaf);
                assert_tree_invariants(&tree, set.len());
            }
        }
    }

    #[test]
    fn test_empty_tree_is_degenerate() {
        let set = random_triangle_cloud(0, 0);
        let tree = BvhTree::build(&set, 4);
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn test_single_primitive_tree() {
        let set = random_triangle_cloud(1, 3);
        let tree = BvhTree::build(&set, 4);
        assert_eq!(tree.len(), 1);
        assert!(tree.node(0).is_leaf());
        assert_eq!(tree.depth(), 0);
    }
}
