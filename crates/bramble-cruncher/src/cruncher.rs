//! The [`Cruncher`]: a synchronous driver that grows a tree lineage.
//!
//! A cruncher pairs a [`StepIterator`] with the tree node it extends.
//! Each [`crunch`](Cruncher::crunch) call advances the iterator up to
//! a step budget and commits every produced state back to the tree
//! under the tip, tagged with the profile that was active when the
//! state was produced. The tree itself is only borrowed for the
//! duration of a `crunch` call; between calls the cruncher holds
//! nothing but ids and `Arc`'d snapshots.

use std::sync::Arc;
use std::time::Instant;

use bramble_core::{NodeId, StepProfile};
use bramble_tree::{Path, Tree};

use crate::iterator::{CrunchError, StepIterator};
use crate::metrics::CrunchMetrics;

/// What one [`Cruncher::crunch`] call accomplished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CrunchReport {
    /// Number of states produced and committed by this call.
    pub produced: usize,
    /// The lineage tip after this call.
    pub new_tip: NodeId,
    /// Whether the timeline reached its natural end.
    pub world_ended: bool,
}

/// Synchronous crunching driver bound to one lineage tip.
///
/// Built over a tree node, the cruncher snapshots the lineage from
/// root to that node into a private browser and then extends it one
/// committed state at a time. Because the browser shares states with
/// the tree via `Arc`, driving a cruncher never blocks readers of the
/// tree, and several crunchers may grow different tips of the same
/// tree in turns.
#[derive(Debug)]
pub struct Cruncher {
    iterator: StepIterator,
    tip: NodeId,
    profile_tag: Arc<StepProfile>,
    metrics: CrunchMetrics,
}

impl Cruncher {
    /// Build a cruncher that extends `tip` under `profile`.
    ///
    /// The lineage from the root to `tip` is snapshotted so that
    /// history-dependent computations see the whole timeline.
    pub fn new(tree: &Tree, tip: NodeId, profile: StepProfile) -> Result<Self, CrunchError> {
        let path = Path::to_node(tree, tip)?;
        let browser = tree.browse(&path)?;
        let profile_tag = Arc::new(profile.clone());
        let iterator = StepIterator::new(browser, profile)?;
        Ok(Self {
            iterator,
            tip,
            profile_tag,
            metrics: CrunchMetrics::default(),
        })
    }

    /// Advance up to `steps` times, committing each produced state.
    ///
    /// Stops early when the world ends. On error, states committed by
    /// earlier iterations of this call remain in the tree; the failed
    /// step itself leaves no trace.
    pub fn crunch(&mut self, tree: &mut Tree, steps: usize) -> Result<CrunchReport, CrunchError> {
        let mut produced = 0;
        let mut world_ended = false;
        for _ in 0..steps {
            let started = Instant::now();
            let outcome = self.iterator.advance();
            self.metrics.last_step_us = started.elapsed().as_micros() as u64;
            self.metrics.producer_rebuilds = self.iterator.producer_rebuilds();
            match outcome {
                Ok(Some(state)) => {
                    self.tip = tree.append_shared(self.tip, state, Arc::clone(&self.profile_tag))?;
                    self.metrics.states_produced += 1;
                    produced += 1;
                }
                Ok(None) => {
                    world_ended = true;
                    break;
                }
                Err(e) => {
                    self.metrics.step_failures += 1;
                    return Err(e);
                }
            }
        }
        Ok(CrunchReport {
            produced,
            new_tip: self.tip,
            world_ended,
        })
    }

    /// Swap the active profile for subsequent steps.
    ///
    /// States already committed keep their original profile tag.
    pub fn set_profile(&mut self, profile: &StepProfile) {
        if self.iterator.profile() == profile {
            return;
        }
        self.iterator.set_profile(profile);
        self.profile_tag = Arc::new(profile.clone());
        self.metrics.profile_changes += 1;
    }

    /// The lineage tip this cruncher extends.
    pub fn tip(&self) -> NodeId {
        self.tip
    }

    /// The active profile.
    pub fn profile(&self) -> &StepProfile {
        self.iterator.profile()
    }

    /// Whether the timeline reached its natural end.
    pub fn has_ended(&self) -> bool {
        self.iterator.has_ended()
    }

    /// Telemetry counters for this driver.
    pub fn metrics(&self) -> &CrunchMetrics {
        &self.metrics
    }

    /// Take the underlying iterator, e.g. to move it onto a worker
    /// thread.
    pub fn into_iterator(self) -> StepIterator {
        self.iterator
    }
}
