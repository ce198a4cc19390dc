//! The [`NodeRange`]: a consecutive span of one lineage.

use bramble_core::{NodeId, TreeError};

use crate::chunk::Chunk;
use crate::path::{BlockwiseWalk, Path};
use crate::tree::Tree;

/// A consecutive range of nodes, bounded by two chunks.
///
/// `start` and `end` are both inclusive, and `start` must lie on the
/// path to `end` at or before it (checked by [`sanity_check`], not on
/// construction). Because the endpoints may name blocks, a range keeps
/// meaning cheap: it never copies node ids, only the two bounds.
///
/// Traversal builds a fresh [`Path`] through `end`, so a range is
/// never stale at the moment it is walked. Equal endpoints denote a
/// range of one chunk. A start strictly after the end is malformed:
/// the start does not lie on the path to the end, so traversal
/// operations report [`TreeError::BoundOffPath`] rather than guessing.
///
/// [`sanity_check`]: NodeRange::sanity_check
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeRange {
    start: Chunk,
    end: Chunk,
}

impl NodeRange {
    /// A range from `start` to `end`, both inclusive.
    pub fn new(start: impl Into<Chunk>, end: impl Into<Chunk>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// The chunk the range starts in.
    pub fn start(&self) -> Chunk {
        self.start
    }

    /// The chunk the range ends in.
    pub fn end(&self) -> Chunk {
        self.end
    }

    /// The unique path through this range, built from `end`.
    pub fn make_path(&self, tree: &Tree) -> Result<Path, TreeError> {
        Path::to_chunk(tree, self.end)
    }

    /// Iterate the member nodes oldest-first.
    ///
    /// The iterator owns its path snapshot, so it stays cheap to drive
    /// and needs no further tree access.
    pub fn iter(&self, tree: &Tree) -> Result<RangeNodes, TreeError> {
        let path = self.make_path(tree)?;
        let bounds = path.resolve_bounds(tree, Some(&self.start), Some(&self.end))?;
        let (next, end_excl) = match bounds {
            Some((lo, hi)) => (lo, hi + 1),
            None => (0, 0),
        };
        Ok(RangeNodes {
            path,
            next,
            end_excl,
        })
    }

    /// Iterate the members blockwise: whole blocks where the run lies
    /// entirely inside the range, single nodes at the clipped fringes.
    pub fn iter_blockwise<'t>(&self, tree: &'t Tree) -> Result<RangeChunks<'t>, TreeError> {
        let path = self.make_path(tree)?;
        let bounds = path.resolve_bounds(tree, Some(&self.start), Some(&self.end))?;
        Ok(RangeChunks {
            path,
            tree,
            walk: BlockwiseWalk::new(bounds),
        })
    }

    /// Whether `node` is a member of this range.
    ///
    /// Off-lineage nodes and lineage nodes outside the bounds both
    /// answer `false`; callers needing the distinction can ask the
    /// range's path for [`position_of`](Path::position_of).
    pub fn contains(&self, tree: &Tree, node: NodeId) -> Result<bool, TreeError> {
        let path = self.make_path(tree)?;
        path.contains(tree, node, Some(self.start), Some(self.end))
    }

    /// This range with both endpoints normalized to nodes: the first
    /// node of a block start, the last node of a block end.
    ///
    /// Loss-free at the moment it is taken, and idempotent.
    pub fn dissolved(&self, tree: &Tree) -> Result<NodeRange, TreeError> {
        Ok(NodeRange {
            start: Chunk::Node(self.start.first_node(tree)?),
            end: Chunk::Node(self.end.last_node(tree)?),
        })
    }

    /// Every child of a member that is not itself a member, in
    /// blockwise order.
    ///
    /// These are the alternate futures branching off the range. Only
    /// the last node of each blockwise chunk can contribute: interior
    /// run nodes have exactly one child, the next run node.
    pub fn outside_children(&self, tree: &Tree) -> Result<Vec<NodeId>, TreeError> {
        let path = self.make_path(tree)?;
        let bounds = path.resolve_bounds(tree, Some(&self.start), Some(&self.end))?;
        let Some((lo, hi)) = bounds else {
            return Ok(Vec::new());
        };

        let member = |id: NodeId| {
            path.position_of(id)
                .is_some_and(|pos| lo <= pos && pos <= hi)
        };

        let mut outside = Vec::new();
        let mut walk = BlockwiseWalk::new(bounds);
        while let Some(chunk) = walk.next_chunk(path.nodes(), tree) {
            let candidate = chunk.last_node(tree)?;
            for &child in tree.node(candidate)?.children() {
                if !member(child) {
                    outside.push(child);
                }
            }
        }
        Ok(outside)
    }

    /// Assert this range is well formed.
    ///
    /// # Panics
    ///
    /// Panics if the endpoints do not resolve in `tree`, or if any
    /// node of `start` does not lie on the path to `end` at or before
    /// it. A range violating this is a programming error in the
    /// caller, not a recoverable condition.
    pub fn sanity_check(&self, tree: &Tree) {
        let path = match self.make_path(tree) {
            Ok(path) => path,
            Err(err) => panic!("node range endpoints do not resolve: {err}"),
        };
        let (first, last) = match (self.start.first_node(tree), self.start.last_node(tree)) {
            (Ok(first), Ok(last)) => (first, last),
            (Err(err), _) | (_, Err(err)) => {
                panic!("node range start does not resolve: {err}")
            }
        };
        assert!(
            path.position_of(first).is_some(),
            "range start {first} is not an ancestor-or-self of the range end",
        );
        assert!(
            path.position_of(last).is_some(),
            "range start runs past the range end (node {last} is beyond it)",
        );
    }
}

/// Node-wise range iterator. Yielded by [`NodeRange::iter`].
pub struct RangeNodes {
    path: Path,
    next: usize,
    end_excl: usize,
}

impl RangeNodes {
    /// The path snapshot this iterator walks.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for RangeNodes {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.next >= self.end_excl {
            return None;
        }
        let id = self.path.node_at(self.next);
        self.next += 1;
        id
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end_excl - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RangeNodes {}

/// Blockwise range iterator. Yielded by [`NodeRange::iter_blockwise`].
pub struct RangeChunks<'t> {
    path: Path,
    tree: &'t Tree,
    walk: BlockwiseWalk,
}

impl Iterator for RangeChunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        self.walk.next_chunk(self.path.nodes(), self.tree)
    }
}
