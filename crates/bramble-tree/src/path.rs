//! The [`Path`]: one resolved root-to-endpoint lineage.
//!
//! A path is a snapshot of ids, not a live view. Building one walks
//! parent links upward from the endpoint, which is unambiguous (every
//! node has exactly one parent), then reverses. The path records the
//! tree generation it was built at; after the tree grows, positions
//! may no longer describe the freshest topology and callers who care
//! rebuild. Ids themselves never go stale while the tree lives.

use bramble_core::{NodeId, TreeError, TreeGenerationId};

use crate::chunk::Chunk;
use crate::tree::Tree;

/// An ordered, gapless run of node ids from a root to an endpoint.
///
/// Construction is deterministic and total: for a given endpoint there
/// is exactly one path. Paths are cheap, derived, disposable values;
/// the tree does not own or track them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    nodes: Vec<NodeId>,
    generation: TreeGenerationId,
}

impl Path {
    /// The unique path from a root to `end`.
    pub fn to_node(tree: &Tree, end: NodeId) -> Result<Self, TreeError> {
        let mut nodes = Vec::new();
        let mut cursor = Some(end);
        while let Some(id) = cursor {
            nodes.push(id);
            cursor = tree.node(id)?.parent();
        }
        nodes.reverse();
        Ok(Self {
            nodes,
            generation: tree.generation(),
        })
    }

    /// The unique path from a root through every node `end` stands for.
    ///
    /// For a block endpoint this is the path to the block's last node.
    pub fn to_chunk(tree: &Tree, end: impl Into<Chunk>) -> Result<Self, TreeError> {
        let end = end.into();
        Self::to_node(tree, end.last_node(tree)?)
    }

    /// Number of nodes on the path. Never zero.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Paths always hold at least the endpoint; this exists for API
    /// completeness.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The ids in root-to-endpoint order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// The root end of the path.
    pub fn root(&self) -> NodeId {
        self.nodes[0]
    }

    /// The designated endpoint.
    pub fn endpoint(&self) -> NodeId {
        self.nodes[self.nodes.len() - 1]
    }

    /// The node at `position` (0 = root), if in range.
    pub fn node_at(&self, position: usize) -> Option<NodeId> {
        self.nodes.get(position).copied()
    }

    /// Position of `node` on this path, if it lies on it.
    ///
    /// This is the escape hatch for callers who need to distinguish
    /// "off this lineage" from "on it but outside some bound";
    /// [`Path::contains`] deliberately conflates the two.
    pub fn position_of(&self, node: NodeId) -> Option<usize> {
        self.nodes.iter().position(|&n| n == node)
    }

    /// The generation the snapshot was taken at.
    pub fn generation(&self) -> TreeGenerationId {
        self.generation
    }

    /// Whether the tree has grown since this path was built.
    pub fn is_current(&self, tree: &Tree) -> bool {
        self.generation == tree.generation()
    }

    /// Iterate every id root-to-endpoint.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    /// Iterate ids between `start` and `end`, both inclusive.
    ///
    /// `None` bounds default to the path's own ends. A bound whose
    /// nodes do not lie on this path is reported as
    /// [`TreeError::BoundOffPath`], never silently clamped. A start
    /// strictly after the end yields an empty iteration.
    pub fn iter_bounded(
        &self,
        tree: &Tree,
        start: Option<Chunk>,
        end: Option<Chunk>,
    ) -> Result<impl Iterator<Item = NodeId> + '_, TreeError> {
        let slice = match self.resolve_bounds(tree, start.as_ref(), end.as_ref())? {
            Some((lo, hi)) => &self.nodes[lo..=hi],
            None => &[],
        };
        Ok(slice.iter().copied())
    }

    /// Iterate the same span as [`Path::iter_bounded`], but yield a
    /// whole [`Chunk::Block`] wherever a full block lies inside the
    /// bounds, and single [`Chunk::Node`]s at the clipped fringes.
    ///
    /// Flattening the chunks reproduces the node-wise iteration
    /// exactly.
    pub fn iter_blockwise<'p, 't>(
        &'p self,
        tree: &'t Tree,
        start: Option<Chunk>,
        end: Option<Chunk>,
    ) -> Result<PathChunks<'p, 't>, TreeError> {
        let bounds = self.resolve_bounds(tree, start.as_ref(), end.as_ref())?;
        Ok(PathChunks {
            path: self,
            tree,
            walk: BlockwiseWalk::new(bounds),
        })
    }

    /// Whether `node` lies on this path between `start` and `end`.
    ///
    /// Answers `false` both for nodes off this lineage entirely and
    /// for lineage members outside the bounds; use
    /// [`Path::position_of`] to tell the cases apart.
    pub fn contains(
        &self,
        tree: &Tree,
        node: NodeId,
        start: Option<Chunk>,
        end: Option<Chunk>,
    ) -> Result<bool, TreeError> {
        let Some((lo, hi)) = self.resolve_bounds(tree, start.as_ref(), end.as_ref())? else {
            return Ok(false);
        };
        Ok(self
            .position_of(node)
            .is_some_and(|pos| lo <= pos && pos <= hi))
    }

    /// Position of the newest node whose clock reads at or before
    /// `clock`, if any qualifies.
    ///
    /// Clocks are non-decreasing along any path, so this is a binary
    /// search.
    pub fn position_at_or_before(&self, tree: &Tree, clock: f64) -> Option<usize> {
        self.nodes
            .partition_point(|&id| tree.get(id).is_some_and(|n| n.clock() <= clock))
            .checked_sub(1)
    }

    /// Resolve optional chunk bounds to inclusive positions.
    ///
    /// `Ok(None)` means the span is empty (start strictly after end).
    pub(crate) fn resolve_bounds(
        &self,
        tree: &Tree,
        start: Option<&Chunk>,
        end: Option<&Chunk>,
    ) -> Result<Option<(usize, usize)>, TreeError> {
        let lo = match start {
            None => 0,
            Some(chunk) => {
                let first = chunk.first_node(tree)?;
                self.position_of(first)
                    .ok_or(TreeError::BoundOffPath { node: first })?
            }
        };
        let hi = match end {
            None => self.nodes.len() - 1,
            Some(chunk) => {
                let last = chunk.last_node(tree)?;
                self.position_of(last)
                    .ok_or(TreeError::BoundOffPath { node: last })?
            }
        };
        Ok((lo <= hi).then_some((lo, hi)))
    }
}

/// Blockwise iterator over a bounded span of a path.
///
/// Yielded by [`Path::iter_blockwise`].
pub struct PathChunks<'p, 't> {
    path: &'p Path,
    tree: &'t Tree,
    walk: BlockwiseWalk,
}

impl Iterator for PathChunks<'_, '_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        self.walk.next_chunk(self.path.nodes(), self.tree)
    }
}

/// Cursor for the blockwise grouping rule, shared by path- and
/// range-level iterators.
///
/// A whole block is emitted when the cursor sits on the block's first
/// node and the run fits entirely under the upper bound; otherwise the
/// cursor advances node by node. Singleton blocks count as whole
/// blocks.
#[derive(Clone, Debug)]
pub(crate) struct BlockwiseWalk {
    pos: usize,
    end_excl: usize,
}

impl BlockwiseWalk {
    pub(crate) fn new(bounds: Option<(usize, usize)>) -> Self {
        match bounds {
            Some((lo, hi)) => Self {
                pos: lo,
                end_excl: hi + 1,
            },
            None => Self {
                pos: 0,
                end_excl: 0,
            },
        }
    }

    pub(crate) fn next_chunk(&mut self, nodes: &[NodeId], tree: &Tree) -> Option<Chunk> {
        if self.pos >= self.end_excl {
            return None;
        }
        let id = nodes[self.pos];
        // Path ids were resolved at construction and the tree never
        // removes nodes, so these lookups cannot miss.
        let block_id = tree.get(id)?.block();
        let block = tree.get_block(block_id)?;
        if block.first() == id && self.pos + block.len() <= self.end_excl {
            self.pos += block.len();
            Some(Chunk::Block(block_id))
        } else {
            self.pos += 1;
            Some(Chunk::Node(id))
        }
    }
}
