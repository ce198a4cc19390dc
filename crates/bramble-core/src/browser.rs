//! The [`HistoryBrowser`]: a read-mostly view of one lineage.
//!
//! A browser is a cutoff-bounded sequence of `(clock, state)` entries
//! over a single root-to-tip lineage. It owns no tree storage: states
//! are shared behind `Arc`, so a browser stays valid and `Send` no
//! matter how the tree grows after it was built. The crunching engine
//! appends each state it produces, so history-dependent computations
//! see work that has not yet been flushed to the tree.

use std::sync::Arc;

use crate::state::WorldState;

/// One lineage entry: a state and its resolved clock reading.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    clock: f64,
    state: Arc<dyn WorldState>,
}

impl HistoryEntry {
    /// Build an entry from a resolved clock reading and a frozen state.
    pub fn new(clock: f64, state: Arc<dyn WorldState>) -> Self {
        Self { clock, state }
    }

    /// The entry's clock reading.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// The entry's state.
    pub fn state(&self) -> &Arc<dyn WorldState> {
        &self.state
    }
}

/// A browsable lineage: states ordered root-to-tip, queryable by
/// position or by clock reading.
///
/// Entries are kept in non-decreasing clock order; clock queries use
/// binary search. Entries past the browser's cutoff simply do not
/// exist here, so a simpack can never peek beyond what the engine
/// chose to expose.
#[derive(Clone, Debug, Default)]
pub struct HistoryBrowser {
    entries: Vec<HistoryEntry>,
}

impl HistoryBrowser {
    /// An empty browser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a browser from pre-resolved entries.
    ///
    /// Entries must already be in non-decreasing clock order.
    pub fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        debug_assert!(
            entries.windows(2).all(|w| w[0].clock <= w[1].clock),
            "history entries out of clock order"
        );
        Self { entries }
    }

    /// Append an entry at the tip.
    ///
    /// `clock` must not read earlier than the current tip's clock; the
    /// engine validates this before pushing.
    pub fn push(&mut self, clock: f64, state: Arc<dyn WorldState>) {
        debug_assert!(
            self.tip_clock().is_none_or(|tip| tip <= clock),
            "history push out of clock order"
        );
        self.entries.push(HistoryEntry { clock, state });
    }

    /// Number of visible entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the lineage is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entries in lineage order.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// The entry at `position` (0 = root end), if present.
    pub fn get(&self, position: usize) -> Option<&HistoryEntry> {
        self.entries.get(position)
    }

    /// The newest visible entry.
    pub fn tip(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// The newest visible state.
    pub fn tip_state(&self) -> Option<&dyn WorldState> {
        self.entries.last().map(|e| e.state.as_ref())
    }

    /// The newest visible clock reading.
    pub fn tip_clock(&self) -> Option<f64> {
        self.entries.last().map(|e| e.clock)
    }

    /// Position of the newest entry whose clock reads at or before
    /// `clock`, if any entry qualifies.
    pub fn at_or_before(&self, clock: f64) -> Option<usize> {
        let upto = self.entries.partition_point(|e| e.clock <= clock);
        upto.checked_sub(1)
    }

    /// The newest state whose clock reads at or before `clock`.
    pub fn state_at_or_before(&self, clock: f64) -> Option<&HistoryEntry> {
        self.at_or_before(clock).and_then(|pos| self.get(pos))
    }

    /// Iterate the visible entries root-to-tip.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }
}
