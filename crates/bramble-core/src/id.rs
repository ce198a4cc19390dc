//! Strongly-typed identifiers for tree storage.

use std::fmt;

/// Identifies a node within a simulation tree.
///
/// Nodes are allocated sequentially by the tree arena; `NodeId(n)`
/// corresponds to the n-th node ever appended. IDs are never reused
/// while the tree is alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a block (a compressed linear run of nodes) within a tree.
///
/// Block IDs are allocated from a per-tree counter. A block keeps its ID
/// when it is extended or truncated in place; splitting a block at a new
/// fork point allocates a fresh ID for the detached tail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for BlockId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Tracks tree topology generation for snapshot staleness advice.
///
/// Incremented each time a node is appended to the tree. A [`Path`]
/// snapshot records the generation it was built at so callers can tell
/// whether the tree has grown since.
///
/// [`Path`]: https://docs.rs/bramble-tree
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeGenerationId(pub u64);

impl fmt::Display for TreeGenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TreeGenerationId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
