//! The [`Tree`]: the arena that owns every node of a branching history.
//!
//! # Architecture
//!
//! ```text
//! Tree (arena, single writer)
//! ├── Vec<Node>                          payloads; NodeId = index
//! ├── roots: Vec<NodeId>                 usually one, more if re-seeded
//! ├── IndexMap<BlockId, Block>           derived run partition
//! └── IndexMap<Arc<StepProfile>, usize>  deduplicated profile uses
//! ```
//!
//! # Ownership model
//!
//! Appends take `&mut self`, so a block split at a new fork point is
//! atomic with respect to readers. A node is fully formed (state,
//! clock, parent, profile, block) before its parent's child list is
//! touched, so no reader can observe a torn node. Paths, browsers,
//! and ranges hold plain ids or `Arc`'d states, never references into
//! the arena, which keeps them alive and `Send` across later growth.
//!
//! # Block maintenance
//!
//! The block partition is a cached projection of the topology, patched
//! on every append rather than recomputed:
//!
//! - parent is childless and not a root: the new node extends the
//!   parent's run;
//! - parent gains a second child: the parent's run is split right
//!   after the parent (the tail keeps its order under a fresh id) and
//!   the new node starts its own singleton;
//! - otherwise: the new node starts its own singleton.
//!
//! Roots always sit in singleton blocks; a root is a run boundary by
//! definition, so a seeded state never merges into its descendants'
//! run.

use std::sync::Arc;

use bramble_core::browser::HistoryEntry;
use bramble_core::{
    BlockId, HistoryBrowser, NodeId, StepProfile, TreeError, TreeGenerationId, WorldState,
};
use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::block::Block;
use crate::node::Node;
use crate::path::Path;

/// Arena for one branching simulation history.
///
/// Nodes are created through [`Tree::seed_root`] and [`Tree::append`]
/// only, and never move or disappear; ids are stable for the life of
/// the tree. Everything else (blocks, the profile registry, the
/// generation counter) is derived bookkeeping the appends keep in
/// step.
#[derive(Debug, Default)]
pub struct Tree {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    blocks: IndexMap<BlockId, Block>,
    profiles: IndexMap<Arc<StepProfile>, usize>,
    next_block: u32,
    generation: TreeGenerationId,
}

impl Tree {
    /// An empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a new root from a starting state.
    ///
    /// A clockless state is stamped with reading `0.0`; an explicit
    /// reading must be finite. The root starts in its own singleton
    /// block and carries no profile.
    pub fn seed_root(&mut self, mut state: Box<dyn WorldState>) -> Result<NodeId, TreeError> {
        let clock = match state.clock() {
            Some(c) if !c.is_finite() => return Err(TreeError::InvalidClock { clock: c }),
            Some(c) => c,
            None => {
                state.set_clock(0.0);
                0.0
            }
        };

        let id = NodeId(self.nodes.len() as u32);
        let block = self.fresh_block(id);
        self.nodes.push(Node {
            state: Arc::from(state),
            clock,
            parent: None,
            children: SmallVec::new(),
            profile: None,
            block,
        });
        self.roots.push(id);
        self.generation.0 += 1;
        Ok(id)
    }

    /// Append a produced state under `parent`.
    ///
    /// The state must already carry a clock reading (the crunching
    /// engine stamps before flushing); the reading must be finite and
    /// at or after the parent's. `profile` is the recipe that produced
    /// the state; equal profiles are deduplicated through the tree's
    /// registry, so the stored `Arc` may differ from the one passed
    /// in.
    ///
    /// Validation happens before any mutation: a failed append leaves
    /// the tree exactly as it was.
    pub fn append(
        &mut self,
        parent: NodeId,
        state: Box<dyn WorldState>,
        profile: Arc<StepProfile>,
    ) -> Result<NodeId, TreeError> {
        self.append_shared(parent, Arc::from(state), profile)
    }

    /// Append a state that is already shared.
    ///
    /// Same contract as [`Tree::append`]; the crunching engine uses
    /// this form because produced states live behind `Arc`s in its
    /// browser before they reach the tree.
    pub fn append_shared(
        &mut self,
        parent: NodeId,
        state: Arc<dyn WorldState>,
        profile: Arc<StepProfile>,
    ) -> Result<NodeId, TreeError> {
        let parent_node = self.node(parent)?;
        let parent_clock = parent_node.clock;
        let parent_is_root = parent_node.parent.is_none();
        let parent_children = parent_node.children.len();
        let parent_block = parent_node.block;

        let clock = match state.clock() {
            None => return Err(TreeError::UnclockedState),
            Some(c) if !c.is_finite() => return Err(TreeError::InvalidClock { clock: c }),
            Some(c) if c < parent_clock => {
                return Err(TreeError::ClockRegression {
                    clock: c,
                    parent_clock,
                })
            }
            Some(c) => c,
        };

        let profile = self.register_profile(profile);
        let id = NodeId(self.nodes.len() as u32);

        let block = if parent_children == 0 && !parent_is_root {
            // A childless non-root parent is always the last node of
            // its run; the new node extends it.
            if let Some(run) = self.blocks.get_mut(&parent_block) {
                run.nodes.push(id);
            }
            parent_block
        } else {
            if parent_children == 1 && !parent_is_root {
                // The parent becomes a fork point; detach its run's
                // tail so the parent ends its block.
                self.split_after(parent_block, parent);
            }
            self.fresh_block(id)
        };

        self.nodes.push(Node {
            state,
            clock,
            parent: Some(parent),
            children: SmallVec::new(),
            profile: Some(profile),
            block,
        });
        self.nodes[parent.0 as usize].children.push(id);
        self.generation.0 += 1;
        Ok(id)
    }

    /// The node with `id`.
    pub fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.nodes
            .get(id.0 as usize)
            .ok_or(TreeError::NodeNotFound { id })
    }

    /// The node with `id`, if it resolves.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    /// The block with `id`.
    pub fn block(&self, id: BlockId) -> Result<&Block, TreeError> {
        self.blocks
            .get(&id)
            .ok_or(TreeError::BlockNotFound { id })
    }

    /// The block with `id`, if it resolves.
    pub fn get_block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    /// Total number of nodes ever appended.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The roots in seeding order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// The current topology generation. Bumped on every append.
    pub fn generation(&self) -> TreeGenerationId {
        self.generation
    }

    /// Iterate every block in the partition, in creation order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    /// Number of blocks in the partition.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Iterate the childless nodes: the tips of every timeline.
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(index, _)| NodeId(index as u32))
    }

    /// Iterate the registered profiles with their use counts.
    pub fn profiles(&self) -> impl Iterator<Item = (&Arc<StepProfile>, usize)> {
        self.profiles.iter().map(|(profile, uses)| (profile, *uses))
    }

    /// How many nodes were produced under a profile equal to `profile`.
    pub fn profile_uses(&self, profile: &StepProfile) -> usize {
        self.profiles.get(profile).copied().unwrap_or(0)
    }

    /// Snapshot a path into a browsable lineage.
    ///
    /// The browser shares the states behind `Arc`s and owns nothing
    /// else, so it stays valid across later tree growth. The path's
    /// endpoint is the browser's cutoff: nothing past it is visible.
    pub fn browse(&self, path: &Path) -> Result<HistoryBrowser, TreeError> {
        let mut entries = Vec::with_capacity(path.len());
        for id in path.iter() {
            let node = self.node(id)?;
            entries.push(HistoryEntry::new(node.clock, Arc::clone(&node.state)));
        }
        Ok(HistoryBrowser::from_entries(entries))
    }

    /// Deduplicate `profile` through the registry and count the use.
    ///
    /// The first appearance of a profile makes its `Arc` canonical;
    /// equal profiles passed later resolve to that same allocation.
    fn register_profile(&mut self, profile: Arc<StepProfile>) -> Arc<StepProfile> {
        match self.profiles.get_full_mut(profile.as_ref()) {
            Some((_, canonical, uses)) => {
                *uses += 1;
                Arc::clone(canonical)
            }
            None => {
                self.profiles.insert(Arc::clone(&profile), 1);
                profile
            }
        }
    }

    fn fresh_block(&mut self, seed: NodeId) -> BlockId {
        let id = BlockId(self.next_block);
        self.next_block += 1;
        self.blocks.insert(
            id,
            Block {
                id,
                nodes: vec![seed],
            },
        );
        id
    }

    /// Split `block` immediately after `node`. The head keeps the id,
    /// the tail keeps its order under a fresh id.
    fn split_after(&mut self, block: BlockId, node: NodeId) {
        let Some(run) = self.blocks.get_mut(&block) else {
            return;
        };
        let Some(pos) = run.position_of(node) else {
            return;
        };
        if pos + 1 == run.len() {
            return;
        }
        let tail = run.nodes.split_off(pos + 1);

        let tail_id = BlockId(self.next_block);
        self.next_block += 1;
        for &member in &tail {
            self.nodes[member.0 as usize].block = tail_id;
        }
        self.blocks.insert(
            tail_id,
            Block {
                id: tail_id,
                nodes: tail,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bramble_test_utils::{counter_profile, CounterState};

    fn clocked(value: u64, clock: f64) -> Box<dyn WorldState> {
        Box::new(CounterState::with_clock(value, clock))
    }

    fn block_nodes(tree: &Tree, id: NodeId) -> Vec<NodeId> {
        let block = tree.node(id).unwrap().block();
        tree.block(block).unwrap().nodes().to_vec()
    }

    #[test]
    fn seeding_stamps_clockless_roots() {
        let mut tree = Tree::new();
        let root = tree.seed_root(Box::new(CounterState::new(7))).unwrap();

        let node = tree.node(root).unwrap();
        assert_eq!(node.clock(), 0.0);
        assert_eq!(node.state().clock(), Some(0.0));
        assert!(node.is_root());
        assert!(node.profile().is_none());
        assert_eq!(tree.roots(), &[root]);
        assert_eq!(block_nodes(&tree, root), vec![root]);
    }

    #[test]
    fn appends_extend_an_unforked_run() {
        let mut tree = Tree::new();
        let profile = Arc::new(counter_profile());
        let r = tree.seed_root(Box::new(CounterState::new(0))).unwrap();
        let a = tree.append(r, clocked(1, 1.0), Arc::clone(&profile)).unwrap();
        let b = tree.append(a, clocked(2, 2.0), Arc::clone(&profile)).unwrap();
        let c = tree.append(b, clocked(3, 3.0), Arc::clone(&profile)).unwrap();

        // The root stays a singleton; the chain shares one run.
        assert_eq!(block_nodes(&tree, r), vec![r]);
        assert_eq!(block_nodes(&tree, a), vec![a, b, c]);
        assert_eq!(tree.block_count(), 2);
        assert_eq!(tree.node(b).unwrap().parent(), Some(a));
        assert_eq!(tree.node(a).unwrap().children(), &[b]);
    }

    #[test]
    fn fork_splits_the_run_after_the_fork_point() {
        let mut tree = Tree::new();
        let profile = Arc::new(counter_profile());
        let r = tree.seed_root(Box::new(CounterState::new(0))).unwrap();
        let a = tree.append(r, clocked(1, 1.0), Arc::clone(&profile)).unwrap();
        let b = tree.append(a, clocked(2, 2.0), Arc::clone(&profile)).unwrap();
        let c = tree.append(b, clocked(3, 3.0), Arc::clone(&profile)).unwrap();
        assert_eq!(block_nodes(&tree, a), vec![a, b, c]);

        // Second child of b: the run [a, b, c] becomes [a, b] + [c],
        // and the newcomer starts its own singleton.
        let d = tree.append(b, clocked(9, 3.0), Arc::clone(&profile)).unwrap();

        assert_eq!(block_nodes(&tree, r), vec![r]);
        assert_eq!(block_nodes(&tree, a), vec![a, b]);
        assert_eq!(block_nodes(&tree, c), vec![c]);
        assert_eq!(block_nodes(&tree, d), vec![d]);
        assert_eq!(tree.block_count(), 4);

        // The head keeps its id; the tail got a fresh one.
        assert_eq!(tree.node(a).unwrap().block(), tree.node(b).unwrap().block());
        assert_ne!(tree.node(b).unwrap().block(), tree.node(c).unwrap().block());
        assert!(tree.node(b).unwrap().is_fork());
    }

    #[test]
    fn third_child_does_not_resplit() {
        let mut tree = Tree::new();
        let profile = Arc::new(counter_profile());
        let r = tree.seed_root(Box::new(CounterState::new(0))).unwrap();
        let a = tree.append(r, clocked(1, 1.0), Arc::clone(&profile)).unwrap();
        let b = tree.append(a, clocked(2, 2.0), Arc::clone(&profile)).unwrap();
        tree.append(a, clocked(3, 2.0), Arc::clone(&profile)).unwrap();
        let blocks_after_fork = tree.block_count();

        let e = tree.append(a, clocked(4, 2.0), Arc::clone(&profile)).unwrap();
        assert_eq!(tree.block_count(), blocks_after_fork + 1);
        assert_eq!(block_nodes(&tree, e), vec![e]);
        assert_eq!(block_nodes(&tree, b), vec![b]);
        assert_eq!(tree.node(a).unwrap().children().len(), 3);
    }

    #[test]
    fn roots_never_merge_into_their_descendants_run() {
        let mut tree = Tree::new();
        let profile = Arc::new(counter_profile());
        let r = tree.seed_root(Box::new(CounterState::new(0))).unwrap();
        let a = tree.append(r, clocked(1, 1.0), Arc::clone(&profile)).unwrap();
        // A second child under the root must not split anything.
        let blocks_before = tree.block_count();
        let s = tree.append(r, clocked(2, 1.0), Arc::clone(&profile)).unwrap();

        assert_eq!(block_nodes(&tree, r), vec![r]);
        assert_eq!(block_nodes(&tree, a), vec![a]);
        assert_eq!(block_nodes(&tree, s), vec![s]);
        assert_eq!(tree.block_count(), blocks_before + 1);
    }

    #[test]
    fn append_validates_before_mutating() {
        let mut tree = Tree::new();
        let profile = Arc::new(counter_profile());
        let r = tree.seed_root(Box::new(CounterState::new(0))).unwrap();
        let a = tree.append(r, clocked(1, 5.0), Arc::clone(&profile)).unwrap();
        let generation = tree.generation();

        // Clockless.
        let err = tree
            .append(a, Box::new(CounterState::new(2)), Arc::clone(&profile))
            .err()
            .unwrap();
        assert_eq!(err, TreeError::UnclockedState);

        // Non-finite.
        let err = tree
            .append(a, clocked(2, f64::NAN), Arc::clone(&profile))
            .err()
            .unwrap();
        assert!(matches!(err, TreeError::InvalidClock { .. }));

        // Regressing.
        let err = tree
            .append(a, clocked(2, 4.5), Arc::clone(&profile))
            .err()
            .unwrap();
        assert_eq!(
            err,
            TreeError::ClockRegression {
                clock: 4.5,
                parent_clock: 5.0
            }
        );

        // Unknown parent.
        let missing = NodeId(999);
        let err = tree
            .append(missing, clocked(2, 6.0), Arc::clone(&profile))
            .err()
            .unwrap();
        assert_eq!(err, TreeError::NodeNotFound { id: missing });

        // Nothing changed.
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.generation(), generation);
        assert_eq!(tree.profile_uses(&profile), 1);
        assert!(tree.node(a).unwrap().is_leaf());
    }

    #[test]
    fn equal_clocks_are_allowed() {
        let mut tree = Tree::new();
        let profile = Arc::new(counter_profile());
        let r = tree.seed_root(Box::new(CounterState::new(0))).unwrap();
        let a = tree.append(r, clocked(1, 0.0), profile).unwrap();
        assert_eq!(tree.node(a).unwrap().clock(), 0.0);
    }

    #[test]
    fn profile_registry_dedupes_equal_profiles() {
        let mut tree = Tree::new();
        // Two Arcs around the same computation with equal args.
        let first = Arc::new(counter_profile());
        let r = tree.seed_root(Box::new(CounterState::new(0))).unwrap();
        let a = tree.append(r, clocked(1, 1.0), Arc::clone(&first)).unwrap();
        let b = tree.append(a, clocked(2, 2.0), Arc::clone(&first)).unwrap();

        assert_eq!(tree.profiles().count(), 1);
        assert_eq!(tree.profile_uses(&first), 2);

        // Both nodes share the canonical Arc.
        let pa = Arc::clone(tree.node(a).unwrap().profile().unwrap());
        let pb = Arc::clone(tree.node(b).unwrap().profile().unwrap());
        assert!(Arc::ptr_eq(&pa, &pb));
    }

    #[test]
    fn browse_snapshots_a_lineage() {
        let mut tree = Tree::new();
        let profile = Arc::new(counter_profile());
        let r = tree.seed_root(Box::new(CounterState::new(0))).unwrap();
        let a = tree.append(r, clocked(1, 1.0), Arc::clone(&profile)).unwrap();
        let b = tree.append(a, clocked(2, 2.0), Arc::clone(&profile)).unwrap();

        let path = Path::to_node(&tree, b).unwrap();
        let browser = tree.browse(&path).unwrap();
        assert_eq!(browser.len(), 3);
        assert_eq!(browser.tip_clock(), Some(2.0));

        // The snapshot survives further growth untouched.
        tree.append(b, clocked(3, 3.0), profile).unwrap();
        assert_eq!(browser.len(), 3);
    }

    #[test]
    fn generation_bumps_on_every_append() {
        let mut tree = Tree::new();
        let profile = Arc::new(counter_profile());
        let g0 = tree.generation();
        let r = tree.seed_root(Box::new(CounterState::new(0))).unwrap();
        let g1 = tree.generation();
        tree.append(r, clocked(1, 1.0), profile).unwrap();
        let g2 = tree.generation();
        assert!(g0 < g1 && g1 < g2);
    }
}
