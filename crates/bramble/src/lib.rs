//! Bramble: a branching simulation-history framework.
//!
//! This is the top-level facade crate that re-exports the public API
//! from all Bramble sub-crates. For most users, adding `bramble` as a
//! single dependency is sufficient.
//!
//! A simulation in Bramble is a [`tree::Tree`] of world states. Linear
//! runs compress into blocks, forks record the moment two timelines
//! diverge, and a [`cruncher::Cruncher`] grows any chosen tip by
//! running a step computation described by a [`types::StepProfile`].
//!
//! # Quick start
//!
//! ```rust
//! use bramble::prelude::*;
//! use std::any::Any;
//! use std::sync::Arc;
//!
//! // A minimal world state: one number and an optional clock reading.
//! #[derive(Debug)]
//! struct Tally {
//!     value: u64,
//!     clock: Option<f64>,
//! }
//!
//! impl WorldState for Tally {
//!     fn clock(&self) -> Option<f64> { self.clock }
//!     fn set_clock(&mut self, clock: f64) { self.clock = Some(clock); }
//!     fn as_any(&self) -> &dyn Any { self }
//! }
//!
//! // A step computation that grows the tally by one.
//! struct Grow;
//!
//! impl StepFunction for Grow {
//!     fn name(&self) -> &str { "grow" }
//!
//!     fn step(
//!         &self,
//!         input: StepInput<'_>,
//!         _args: &ProfileArgs,
//!     ) -> Result<Box<dyn WorldState>, StepSignal> {
//!         let tip = input.tip().ok_or(StepSignal::Failed {
//!             reason: "empty history".into(),
//!         })?;
//!         let tally = tip.downcast_ref::<Tally>().ok_or(StepSignal::Failed {
//!             reason: "not a Tally state".into(),
//!         })?;
//!         Ok(Box::new(Tally { value: tally.value + 1, clock: None }))
//!     }
//! }
//!
//! // Seed a tree and crunch three steps under the root.
//! let mut tree = Tree::new();
//! let root = tree
//!     .seed_root(Box::new(Tally { value: 0, clock: None }))
//!     .unwrap();
//! let profile = StepProfile::function(Arc::new(Grow), ProfileArgs::new());
//! let mut cruncher = Cruncher::new(&tree, root, profile).unwrap();
//! let report = cruncher.crunch(&mut tree, 3).unwrap();
//! assert_eq!(report.produced, 3);
//!
//! // Read the lineage back through a history browser.
//! let path = Path::to_node(&tree, report.new_tip).unwrap();
//! let browser = tree.browse(&path).unwrap();
//! assert_eq!(browser.len(), 4);
//! assert_eq!(browser.tip_clock(), Some(3.0));
//! let tip = browser.tip_state().unwrap().downcast_ref::<Tally>().unwrap();
//! assert_eq!(tip.value, 3);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in
//! the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `bramble-core` | World states, history browsing, step profiles |
//! | [`tree`] | `bramble-tree` | The timeline tree, blocks, paths, node ranges |
//! | [`cruncher`] | `bramble-cruncher` | Synchronous and background crunching |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// World states, step computations, and history browsing (`bramble-core`).
///
/// Contains the [`types::WorldState`] trait, the [`types::StepFunction`]
/// and [`types::StepGenerator`] extension points, profiles, and the
/// [`types::HistoryBrowser`].
pub use bramble_core as types;

/// The timeline tree and its navigation types (`bramble-tree`).
///
/// [`tree::Tree`] stores states as nodes compressed into blocks;
/// [`tree::Path`] and [`tree::NodeRange`] walk lineages, and
/// [`tree::Tree::browse`] materializes them as history browsers.
pub use bramble_tree as tree;

/// Crunching engines that grow timelines (`bramble-cruncher`).
///
/// [`cruncher::Cruncher`] for synchronous budgeted crunching,
/// [`cruncher::CruncherThread`] for autonomous background crunching
/// over a bounded event channel.
pub use bramble_cruncher as cruncher;

/// Common imports for typical Bramble usage.
///
/// ```rust
/// use bramble::prelude::*;
/// ```
///
/// This imports the most frequently used types: the world-state and
/// step traits, profiles, the tree and its navigation types, and the
/// crunching drivers.
pub mod prelude {
    // World states and history
    pub use bramble_core::{HistoryBrowser, HistoryEntry, WorldState};

    // Step computations and profiles
    pub use bramble_core::{
        ArgValue, ProfileArgs, StateProducer, StepFunction, StepGenerator, StepInput, StepProfile,
    };

    // IDs and errors
    pub use bramble_core::{BlockId, NodeId, StepSignal, TreeError, TreeGenerationId};

    // Tree
    pub use bramble_tree::{Block, Chunk, Node, NodeRange, Path, Tree};

    // Crunching
    pub use bramble_cruncher::{
        CrunchError, CrunchReport, Cruncher, CruncherConfig, CruncherEvent, CruncherThread,
        ProducedState, StepIterator,
    };
}
