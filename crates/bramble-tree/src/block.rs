//! The [`Block`]: a compressed linear run of nodes.

use std::ops::Index;

use bramble_core::{BlockId, NodeId};

/// A maximal unforked run of nodes, indexable by position.
///
/// Inside a block every node except the last has exactly one child
/// (the next node), and every node except the first has exactly one
/// parent (the previous node). Roots, fork points, and merge points
/// bound blocks; a root always sits alone in its own block. Blocks
/// partition the whole tree, so an isolated node lives in a singleton
/// block.
///
/// Blocks are a derived view maintained incrementally by
/// [`Tree::append`]: they are never created or reshaped directly.
///
/// [`Tree::append`]: crate::Tree::append
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub(crate) id: BlockId,
    pub(crate) nodes: Vec<NodeId>,
}

impl Block {
    /// This block's ID.
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Number of nodes in the run. Always at least one.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Blocks are never empty; this exists for API completeness.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The run's oldest node.
    pub fn first(&self) -> NodeId {
        self.nodes[0]
    }

    /// The run's newest node.
    pub fn last(&self) -> NodeId {
        self.nodes[self.nodes.len() - 1]
    }

    /// The node at `position` within the run, if in range.
    pub fn get(&self, position: usize) -> Option<NodeId> {
        self.nodes.get(position).copied()
    }

    /// The run in parent-to-child order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Position of `node` within the run, if it is a member.
    pub fn position_of(&self, node: NodeId) -> Option<usize> {
        self.nodes.iter().position(|&n| n == node)
    }

    /// Whether `node` is a member of this run.
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }
}

impl Index<usize> for Block {
    type Output = NodeId;

    fn index(&self, position: usize) -> &NodeId {
        &self.nodes[position]
    }
}
