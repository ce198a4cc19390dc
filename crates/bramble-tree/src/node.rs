//! The [`Node`]: one world-state frozen into the history.

use std::sync::Arc;

use bramble_core::{BlockId, NodeId, StepProfile, WorldState};
use smallvec::SmallVec;

/// One state payload and its place in the tree.
///
/// Nodes are created exclusively by [`Tree::seed_root`] and
/// [`Tree::append`]; after creation the only mutation is gaining new
/// children. The state itself is frozen behind an `Arc` and shared
/// with paths, browsers, and worker threads.
///
/// `SmallVec<[NodeId; 2]>` keeps the common cases (zero or one child,
/// plus the occasional two-way fork) off the heap.
///
/// [`Tree::seed_root`]: crate::Tree::seed_root
/// [`Tree::append`]: crate::Tree::append
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) state: Arc<dyn WorldState>,
    pub(crate) clock: f64,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: SmallVec<[NodeId; 2]>,
    pub(crate) profile: Option<Arc<StepProfile>>,
    pub(crate) block: BlockId,
}

impl Node {
    /// The frozen state payload.
    pub fn state(&self) -> &Arc<dyn WorldState> {
        &self.state
    }

    /// The resolved clock reading.
    ///
    /// Always finite, and never earlier than the parent's reading.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// The parent node, or `None` for a root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The children in creation order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The profile that produced this state, or `None` for a seeded root.
    pub fn profile(&self) -> Option<&Arc<StepProfile>> {
        self.profile.as_ref()
    }

    /// The block this node belongs to. Every node belongs to exactly one.
    pub fn block(&self) -> BlockId {
        self.block
    }

    /// Whether this node is a tree root.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Whether this node forks into more than one future.
    pub fn is_fork(&self) -> bool {
        self.children.len() > 1
    }

    /// Whether this node has no children yet.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
