//! Property tests for the block partition.
//!
//! Grows trees from random scripts (each script entry picks the parent
//! of the next node) and checks that the incrementally-patched block
//! partition always matches its definition: blocks tile the tree, each
//! block is a parent-child run with no interior forks, and no block
//! could be extended in either direction.

use std::collections::BTreeSet;
use std::sync::Arc;

use bramble_core::NodeId;
use bramble_test_utils::{counter_profile, CounterState};
use bramble_tree::Tree;
use proptest::prelude::*;

// ── Helpers ──────────────────────────────────────────────────────

/// Grow a tree from a script: entry `i` picks the parent of node `i+1`
/// among the nodes that already exist. Clocks advance by one per step.
fn grow(script: &[u8]) -> (Tree, Vec<NodeId>) {
    let profile = Arc::new(counter_profile());
    let mut tree = Tree::new();
    let mut ids = vec![tree.seed_root(Box::new(CounterState::new(0))).unwrap()];
    for (i, pick) in script.iter().enumerate() {
        let parent = ids[*pick as usize % ids.len()];
        let clock = tree.node(parent).unwrap().clock() + 1.0;
        let state = CounterState::with_clock(i as u64 + 1, clock);
        let id = tree
            .append(parent, Box::new(state), Arc::clone(&profile))
            .unwrap();
        ids.push(id);
    }
    (tree, ids)
}

fn arb_script() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..64)
}

// ── Properties ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn blocks_tile_the_tree(script in arb_script()) {
        let (tree, ids) = grow(&script);

        let mut seen = BTreeSet::new();
        for block in tree.blocks() {
            prop_assert!(!block.is_empty(), "block {} is empty", block.id());
            for &member in block.nodes() {
                prop_assert!(
                    seen.insert(member),
                    "node {member} appears in more than one block"
                );
                prop_assert_eq!(
                    tree.node(member).unwrap().block(),
                    block.id(),
                    "node {} disagrees with the partition about its block",
                    member
                );
            }
        }
        let all: BTreeSet<_> = ids.iter().copied().collect();
        prop_assert_eq!(seen, all, "partition does not cover every node");
    }

    #[test]
    fn blocks_are_parent_child_runs(script in arb_script()) {
        let (tree, _) = grow(&script);

        for block in tree.blocks() {
            for pair in block.nodes().windows(2) {
                prop_assert_eq!(
                    tree.node(pair[1]).unwrap().parent(),
                    Some(pair[0]),
                    "block {} is not a consecutive lineage",
                    block.id()
                );
            }
            // No interior forks: everybody but the last has one child.
            for &member in &block.nodes()[..block.len() - 1] {
                prop_assert_eq!(
                    tree.node(member).unwrap().children().len(),
                    1,
                    "interior node {} of block {} is a fork",
                    member,
                    block.id()
                );
            }
        }
    }

    #[test]
    fn blocks_are_maximal(script in arb_script()) {
        let (tree, _) = grow(&script);

        for block in tree.blocks() {
            // Cannot extend upward: the first member starts a run
            // boundary.
            let first = tree.node(block.first()).unwrap();
            let upward_blocked = match first.parent() {
                None => true,
                Some(parent) => {
                    let parent = tree.node(parent).unwrap();
                    parent.is_root() || parent.children().len() >= 2
                }
            };
            prop_assert!(
                upward_blocked,
                "block {} could merge into its parent's run",
                block.id()
            );

            // Cannot extend downward: the last member ends one.
            let last = tree.node(block.last()).unwrap();
            let downward_blocked =
                last.is_leaf() || last.children().len() >= 2 || last.is_root();
            prop_assert!(
                downward_blocked,
                "block {} ends at a node with exactly one child",
                block.id()
            );
        }
    }

    #[test]
    fn roots_stay_singletons(script in arb_script()) {
        let (tree, _) = grow(&script);

        for &root in tree.roots() {
            let block = tree.node(root).unwrap().block();
            prop_assert_eq!(tree.block(block).unwrap().nodes(), &[root]);
        }
    }
}
