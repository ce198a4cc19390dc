//! The [`Chunk`]: the node-or-block unit of blockwise traversal.

use bramble_core::{BlockId, NodeId, TreeError};

use crate::tree::Tree;

/// Either a single node or a whole block.
///
/// Blockwise traversal yields chunks; [`NodeRange`] endpoints are
/// chunks. A `Chunk::Block` stands for every node in the block, in
/// run order.
///
/// [`NodeRange`]: crate::NodeRange
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Chunk {
    /// A single node.
    Node(NodeId),
    /// A whole block.
    Block(BlockId),
}

impl Chunk {
    /// The oldest node this chunk stands for.
    pub fn first_node(&self, tree: &Tree) -> Result<NodeId, TreeError> {
        match *self {
            Self::Node(id) => {
                tree.node(id)?;
                Ok(id)
            }
            Self::Block(id) => Ok(tree.block(id)?.first()),
        }
    }

    /// The newest node this chunk stands for.
    pub fn last_node(&self, tree: &Tree) -> Result<NodeId, TreeError> {
        match *self {
            Self::Node(id) => {
                tree.node(id)?;
                Ok(id)
            }
            Self::Block(id) => Ok(tree.block(id)?.last()),
        }
    }

    /// Number of nodes this chunk stands for.
    pub fn len(&self, tree: &Tree) -> Result<usize, TreeError> {
        match *self {
            Self::Node(id) => {
                tree.node(id)?;
                Ok(1)
            }
            Self::Block(id) => Ok(tree.block(id)?.len()),
        }
    }
}

impl From<NodeId> for Chunk {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<BlockId> for Chunk {
    fn from(id: BlockId) -> Self {
        Self::Block(id)
    }
}
