//! Benchmark profiles and tree builders for the Bramble framework.
//!
//! Provides pre-built trees and profiles for benchmarking and examples:
//!
//! - [`counter_profile`]: the reference one-shot step computation
//! - [`linear_tree`]: a single unbranched lineage of a given length
//! - [`forked_tree`]: a trunk with a fan of branches at its tip

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use bramble_core::{NodeId, ProfileArgs, StepFunction, StepProfile};
use bramble_cruncher::Cruncher;
use bramble_test_utils::{CounterState, CounterStep};
use bramble_tree::Tree;

/// The reference benchmark profile: a counter stepping by one.
pub fn counter_profile() -> StepProfile {
    StepProfile::function(Arc::new(CounterStep), ProfileArgs::new())
}

/// Build a single unbranched lineage of `len` states after the root.
///
/// Returns the tree and its tip. All states are clockless counters, so
/// clock readings run `0.0..=len`.
pub fn linear_tree(len: usize) -> (Tree, NodeId) {
    let mut tree = Tree::new();
    let root = tree.seed_root(Box::new(CounterState::new(0))).unwrap();
    let mut cruncher = Cruncher::new(&tree, root, counter_profile()).unwrap();
    let report = cruncher.crunch(&mut tree, len).unwrap();
    (tree, report.new_tip)
}

/// Build a trunk of `trunk` states, then fan `branches` branches of
/// `branch_len` states each from the trunk's tip.
///
/// Each branch steps by a different amount, so branch profiles are
/// distinct and the trunk tip becomes a fork. Returns the tree and the
/// branch tips.
pub fn forked_tree(trunk: usize, branches: usize, branch_len: usize) -> (Tree, Vec<NodeId>) {
    let (mut tree, trunk_tip) = linear_tree(trunk);
    let step: Arc<dyn StepFunction> = Arc::new(CounterStep);

    let mut tips = Vec::with_capacity(branches);
    for branch in 0..branches {
        let amount = branch as i64 + 1;
        let profile = StepProfile::function(Arc::clone(&step), ProfileArgs::new().arg(amount));
        let mut cruncher = Cruncher::new(&tree, trunk_tip, profile).unwrap();
        let report = cruncher.crunch(&mut tree, branch_len).unwrap();
        tips.push(report.new_tip);
    }
    (tree, tips)
}
