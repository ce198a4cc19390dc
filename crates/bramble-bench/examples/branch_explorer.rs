//! End-to-end branching example.
//!
//! Demonstrates: seed a tree → crunch a shared trunk → fork two
//! strategies from the same moment → compare the timelines → inspect
//! how the tree stored them.

use std::sync::Arc;

use bramble_core::{ProfileArgs, StepProfile};
use bramble_cruncher::Cruncher;
use bramble_test_utils::{CounterState, CounterStep};
use bramble_tree::{Path, Tree};

fn main() {
    println!("=== Bramble Branch Explorer ===\n");

    // --- Shared trunk ---
    let mut tree = Tree::new();
    let root = tree.seed_root(Box::new(CounterState::new(0))).unwrap();
    let trunk = StepProfile::function(Arc::new(CounterStep), ProfileArgs::new());
    let mut cruncher = Cruncher::new(&tree, root, trunk).unwrap();
    let report = cruncher.crunch(&mut tree, 5).unwrap();
    let fork_point = report.new_tip;

    let fork_clock = tree.node(fork_point).unwrap().clock();
    println!("Trunk: {} states, fork point at clock {fork_clock}", report.produced);

    // --- Two strategies from the same moment ---
    let cautious = StepProfile::function(Arc::new(CounterStep), ProfileArgs::new().arg(1));
    let bold = StepProfile::function(Arc::new(CounterStep), ProfileArgs::new().arg(25));

    let mut low_road = Cruncher::new(&tree, fork_point, cautious).unwrap();
    let mut high_road = Cruncher::new(&tree, fork_point, bold).unwrap();
    for _ in 0..5 {
        low_road.crunch(&mut tree, 1).unwrap();
        high_road.crunch(&mut tree, 1).unwrap();
    }

    // --- Compare the timelines ---
    for (name, tip) in [("cautious", low_road.tip()), ("bold", high_road.tip())] {
        let path = Path::to_node(&tree, tip).unwrap();
        let browser = tree.browse(&path).unwrap();

        print!("{name:>9}: ");
        for entry in browser.entries() {
            let value = entry
                .state()
                .as_ref()
                .downcast_ref::<CounterState>()
                .unwrap()
                .value();
            print!("{value:>4}");
        }
        println!("   (tip clock {})", browser.tip_clock().unwrap());
    }

    // --- Storage shape ---
    println!(
        "\nTree: {} nodes in {} blocks, {} leaves, fork point forked: {}",
        tree.len(),
        tree.block_count(),
        tree.leaves().count(),
        tree.node(fork_point).unwrap().is_fork(),
    );
    println!("Done.");
}
