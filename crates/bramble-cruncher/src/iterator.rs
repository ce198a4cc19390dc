//! The [`StepIterator`]: the inner crunching loop.
//!
//! A step iterator drives one lineage forward state by state. It owns
//! a private [`HistoryBrowser`] seeded from the lineage it continues,
//! so it never touches the tree: produced states accumulate in the
//! browser and flow back to storage through whoever drives the
//! iterator (a [`Cruncher`] or a [`CruncherThread`]).
//!
//! # Crunching loop
//!
//! Each [`advance`](StepIterator::advance) resolves to exactly one of:
//!
//! - `Ok(Some(state))`: one new state, clock-resolved and recorded;
//! - `Ok(None)`: the world ended; every later advance repeats it;
//! - `Err(_)`: the step misbehaved; the lineage is left untouched.
//!
//! One-shot computations are invoked once per advance. Incremental
//! computations go through a producer that is pulled until it runs
//! dry, then transparently rebuilt from the newest tip; only a
//! producer that yields nothing from a fresh start is an error.
//!
//! [`Cruncher`]: crate::Cruncher
//! [`CruncherThread`]: crate::CruncherThread

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use bramble_core::{
    HistoryBrowser, StateProducer, StepFunction, StepGenerator, StepInput, StepKind, StepProfile,
    StepSignal, TreeError, WorldState,
};

use crate::clock::AutoClockGenerator;

// Compile-time assertion: StepIterator moves into worker threads.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<StepIterator>();
    }
};

// ── CrunchError ──────────────────────────────────────────────────

/// Errors raised while crunching a lineage.
///
/// Every variant names the simpack computation involved, because by
/// the time an error surfaces (possibly from a worker thread) the
/// profile that caused it may no longer be the active one.
#[derive(Clone, Debug, PartialEq)]
pub enum CrunchError {
    /// The iterator was built over an empty lineage; there is no tip
    /// state to continue from.
    EmptyLineage,
    /// The step computation reported a fatal failure.
    StepFailed {
        /// Name of the step computation.
        simpack: String,
        /// The computation's own description of the failure.
        reason: String,
    },
    /// A freshly started producer yielded no state at all, so the
    /// computation cannot make progress.
    EmptyProducer {
        /// Name of the step computation.
        simpack: String,
    },
    /// A produced state declared a clock reading that is non-finite or
    /// reads earlier than the lineage allows.
    ClockOutOfOrder {
        /// Name of the step computation.
        simpack: String,
        /// The declared reading.
        clock: f64,
        /// The minimum admissible reading.
        minimum: f64,
    },
    /// Tree storage rejected a produced state.
    Tree(TreeError),
}

impl fmt::Display for CrunchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyLineage => write!(f, "cannot crunch an empty lineage"),
            Self::StepFailed { simpack, reason } => {
                write!(f, "step computation '{simpack}' failed: {reason}")
            }
            Self::EmptyProducer { simpack } => {
                write!(f, "step computation '{simpack}' produced nothing from a fresh start")
            }
            Self::ClockOutOfOrder {
                simpack,
                clock,
                minimum,
            } => {
                write!(
                    f,
                    "step computation '{simpack}' declared clock {clock}, \
                     below the admissible minimum {minimum}"
                )
            }
            Self::Tree(e) => write!(f, "tree storage: {e}"),
        }
    }
}

impl Error for CrunchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Tree(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TreeError> for CrunchError {
    fn from(e: TreeError) -> Self {
        Self::Tree(e)
    }
}

// ── StepIterator ─────────────────────────────────────────────────

/// Drives one lineage forward under an active [`StepProfile`].
///
/// The iterator owns its browser, its clock state, and (for
/// incremental computations) the live producer, so it is `Send` and
/// moves freely into a worker thread. It holds no tree references:
/// exchanging produced states with storage is the driver's job.
///
/// The active profile can be swapped mid-stream with
/// [`set_profile`](StepIterator::set_profile); crunching continues
/// from the same tip under the new recipe.
pub struct StepIterator {
    browser: HistoryBrowser,
    profile: StepProfile,
    producer: Option<Box<dyn StateProducer>>,
    profile_stale: bool,
    clock: AutoClockGenerator,
    ended: bool,
    produced: u64,
    rebuilds: u64,
}

impl StepIterator {
    /// Build an iterator continuing `browser`'s lineage under
    /// `profile`.
    ///
    /// The browser must hold at least the starting tip; crunching
    /// needs a state to continue from.
    pub fn new(browser: HistoryBrowser, profile: StepProfile) -> Result<Self, CrunchError> {
        let Some(tip_clock) = browser.tip_clock() else {
            return Err(CrunchError::EmptyLineage);
        };
        Ok(Self {
            browser,
            profile,
            producer: None,
            profile_stale: false,
            clock: AutoClockGenerator::new(tip_clock),
            ended: false,
            produced: 0,
            rebuilds: 0,
        })
    }

    /// The lineage crunched so far, including every produced state.
    pub fn browser(&self) -> &HistoryBrowser {
        &self.browser
    }

    /// The active profile.
    pub fn profile(&self) -> &StepProfile {
        &self.profile
    }

    /// Whether the timeline reached its natural end.
    pub fn has_ended(&self) -> bool {
        self.ended
    }

    /// Number of states produced since construction.
    pub fn produced(&self) -> u64 {
        self.produced
    }

    /// The clock reading of the newest state on the lineage.
    pub fn tip_clock(&self) -> f64 {
        self.clock.floor()
    }

    /// Number of times an exhausted producer was rebuilt mid-stream.
    pub fn producer_rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Consume the iterator and keep its lineage.
    pub fn into_browser(self) -> HistoryBrowser {
        self.browser
    }

    /// Swap the active profile.
    ///
    /// This is a recipe change, not a cancellation: states already in
    /// the browser stay, and the next advance continues from the same
    /// tip under the new profile. A live producer built under the old
    /// profile is discarded. Setting a profile equal to the active one
    /// is a no-op, and an ended timeline stays ended.
    pub fn set_profile(&mut self, profile: &StepProfile) {
        if *profile == self.profile {
            return;
        }
        self.profile = profile.clone();
        self.profile_stale = true;
    }

    /// Produce the next state on the lineage.
    ///
    /// `Ok(None)` means the world ended; the iterator stays ended and
    /// every later advance answers the same. On `Err` the lineage is
    /// left untouched and any live producer is discarded, so a retry
    /// starts fresh from the tip.
    pub fn advance(&mut self) -> Result<Option<Arc<dyn WorldState>>, CrunchError> {
        if self.ended {
            return Ok(None);
        }
        let step = self.profile.step().clone();
        let produced = match &step {
            StepKind::Function(computation) => match self.invoke(computation.as_ref()) {
                Ok(state) => state,
                Err(StepSignal::WorldEnded) => return self.end(),
                Err(StepSignal::Failed { reason }) => return Err(self.step_failed(reason)),
            },
            StepKind::Generator(computation) => {
                if self.profile_stale {
                    self.producer = None;
                    self.profile_stale = false;
                }
                let (mut producer, mut fresh) = match self.producer.take() {
                    Some(producer) => (producer, false),
                    None => (self.start_producer(computation.as_ref()), true),
                };
                loop {
                    match producer.next_state() {
                        Ok(Some(state)) => {
                            self.producer = Some(producer);
                            break state;
                        }
                        Ok(None) if fresh => {
                            return Err(CrunchError::EmptyProducer {
                                simpack: self.profile.name().to_string(),
                            });
                        }
                        Ok(None) => {
                            // Ran dry mid-stream: rebuild from the
                            // newest tip and keep going.
                            producer = self.start_producer(computation.as_ref());
                            self.rebuilds += 1;
                            fresh = true;
                        }
                        Err(StepSignal::WorldEnded) => return self.end(),
                        Err(StepSignal::Failed { reason }) => {
                            return Err(self.step_failed(reason))
                        }
                    }
                }
            }
        };
        self.flush(produced)
    }

    fn invoke(&self, computation: &dyn StepFunction) -> Result<Box<dyn WorldState>, StepSignal> {
        if computation.history_dependent() {
            computation.step(StepInput::History(&self.browser), self.profile.args())
        } else {
            match self.browser.tip_state() {
                Some(tip) => computation.step(StepInput::Tip(tip), self.profile.args()),
                None => Err(StepSignal::Failed {
                    reason: "lineage has no tip state".into(),
                }),
            }
        }
    }

    fn start_producer(&self, computation: &dyn StepGenerator) -> Box<dyn StateProducer> {
        if computation.history_dependent() {
            computation.start(StepInput::History(&self.browser), self.profile.args())
        } else {
            match self.browser.tip_state() {
                Some(tip) => computation.start(StepInput::Tip(tip), self.profile.args()),
                // Unreachable after construction validates the browser;
                // the history input keeps this total.
                None => computation.start(StepInput::History(&self.browser), self.profile.args()),
            }
        }
    }

    /// Resolve the produced state's clock and record it on the lineage.
    fn flush(
        &mut self,
        mut state: Box<dyn WorldState>,
    ) -> Result<Option<Arc<dyn WorldState>>, CrunchError> {
        let declared = state.clock();
        if let Some(reading) = declared {
            let minimum = self.clock.floor();
            if !reading.is_finite() || reading < minimum {
                self.producer = None;
                return Err(CrunchError::ClockOutOfOrder {
                    simpack: self.profile.name().to_string(),
                    clock: reading,
                    minimum,
                });
            }
        }
        let clock = self.clock.resolve(declared);
        if declared.is_none() {
            state.set_clock(clock);
        }
        let state: Arc<dyn WorldState> = Arc::from(state);
        self.browser.push(clock, Arc::clone(&state));
        self.produced += 1;
        Ok(Some(state))
    }

    fn end(&mut self) -> Result<Option<Arc<dyn WorldState>>, CrunchError> {
        self.ended = true;
        self.producer = None;
        Ok(None)
    }

    fn step_failed(&self, reason: String) -> CrunchError {
        CrunchError::StepFailed {
            simpack: self.profile.name().to_string(),
            reason,
        }
    }
}

impl fmt::Debug for StepIterator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepIterator")
            .field("profile", &self.profile)
            .field("lineage_len", &self.browser.len())
            .field("live_producer", &self.producer.is_some())
            .field("ended", &self.ended)
            .finish()
    }
}

impl Iterator for StepIterator {
    type Item = Result<Arc<dyn WorldState>, CrunchError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bramble_core::ProfileArgs;
    use bramble_test_utils::{
        BarrenGenerator, ClockedStep, CounterState, CounterStep, CountingGenerator, EndingStep,
        FailingStep, TrendStep,
    };

    fn seeded(value: u64, clock: f64) -> HistoryBrowser {
        let mut browser = HistoryBrowser::new();
        browser.push(clock, Arc::new(CounterState::with_clock(value, clock)));
        browser
    }

    fn value_of(state: &Arc<dyn WorldState>) -> u64 {
        state
            .as_ref()
            .downcast_ref::<CounterState>()
            .expect("fixture state")
            .value()
    }

    #[test]
    fn counter_scenario_counts_up_with_stamped_clocks() {
        let profile = StepProfile::function(Arc::new(CounterStep), ProfileArgs::new());
        let mut iterator = StepIterator::new(seeded(0, 0.0), profile).unwrap();

        for expected in 1..=3u64 {
            let state = iterator.advance().unwrap().unwrap();
            assert_eq!(value_of(&state), expected);
            assert_eq!(state.clock(), Some(expected as f64));
        }
        assert_eq!(iterator.browser().len(), 4);
        assert_eq!(iterator.browser().tip_clock(), Some(3.0));
        assert_eq!(iterator.produced(), 3);
    }

    #[test]
    fn empty_lineage_is_rejected_at_construction() {
        let profile = StepProfile::function(Arc::new(CounterStep), ProfileArgs::new());
        let err = StepIterator::new(HistoryBrowser::new(), profile).err().unwrap();
        assert_eq!(err, CrunchError::EmptyLineage);
    }

    #[test]
    fn world_end_is_terminal_and_idempotent() {
        let profile = StepProfile::function(Arc::new(EndingStep::new(2)), ProfileArgs::new());
        let mut iterator = StepIterator::new(seeded(0, 0.0), profile).unwrap();

        assert_eq!(value_of(&iterator.advance().unwrap().unwrap()), 1);
        assert_eq!(value_of(&iterator.advance().unwrap().unwrap()), 2);
        assert!(iterator.advance().unwrap().is_none());
        assert!(iterator.has_ended());
        assert!(iterator.advance().unwrap().is_none());
        assert_eq!(iterator.browser().len(), 3);
    }

    #[test]
    fn failure_surfaces_and_leaves_the_lineage_untouched() {
        let profile = StepProfile::function(Arc::new(FailingStep::new(1)), ProfileArgs::new());
        let mut iterator = StepIterator::new(seeded(0, 0.0), profile).unwrap();

        assert_eq!(value_of(&iterator.advance().unwrap().unwrap()), 1);
        let before = iterator.browser().len();

        let err = iterator.advance().err().unwrap();
        assert!(matches!(err, CrunchError::StepFailed { .. }));
        assert!(err.to_string().contains("failing"));
        assert_eq!(iterator.browser().len(), before);
        assert!(!iterator.has_ended());

        // Deterministic failure keeps failing; the iterator does not
        // wedge into a bogus state.
        assert!(iterator.advance().is_err());
        assert_eq!(iterator.browser().len(), before);
    }

    #[test]
    fn exhausted_producers_are_rebuilt_transparently() {
        let profile =
            StepProfile::generator(Arc::new(CountingGenerator::new(2)), ProfileArgs::new());
        let mut iterator = StepIterator::new(seeded(0, 0.0), profile).unwrap();

        // Bursts of two, chained without a visible seam.
        let values: Vec<_> = (0..6)
            .map(|_| value_of(&iterator.advance().unwrap().unwrap()))
            .collect();
        assert_eq!(values, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(iterator.producer_rebuilds(), 2);
    }

    #[test]
    fn barren_producers_are_an_error() {
        let profile = StepProfile::generator(Arc::new(BarrenGenerator), ProfileArgs::new());
        let mut iterator = StepIterator::new(seeded(0, 0.0), profile).unwrap();

        let err = iterator.advance().err().unwrap();
        assert!(matches!(err, CrunchError::EmptyProducer { .. }));
        assert_eq!(iterator.browser().len(), 1);
    }

    #[test]
    fn profile_swap_continues_from_the_same_tip() {
        let by_one = StepProfile::function(Arc::new(CounterStep), ProfileArgs::new());
        let by_ten = StepProfile::function(Arc::new(CounterStep), ProfileArgs::new().arg(10));
        let mut iterator = StepIterator::new(seeded(0, 0.0), by_one).unwrap();

        assert_eq!(value_of(&iterator.advance().unwrap().unwrap()), 1);
        assert_eq!(value_of(&iterator.advance().unwrap().unwrap()), 2);

        iterator.set_profile(&by_ten);
        assert_eq!(iterator.profile(), &by_ten);
        let state = iterator.advance().unwrap().unwrap();
        assert_eq!(value_of(&state), 12);
        // The lineage is one unbroken history across the swap.
        assert_eq!(iterator.browser().len(), 4);
        assert_eq!(state.clock(), Some(3.0));
    }

    #[test]
    fn profile_swap_discards_the_live_producer() {
        let walking =
            StepProfile::generator(Arc::new(CountingGenerator::new(5)), ProfileArgs::new());
        let by_ten = StepProfile::function(Arc::new(CounterStep), ProfileArgs::new().arg(10));
        let mut iterator = StepIterator::new(seeded(0, 0.0), walking.clone()).unwrap();

        assert_eq!(value_of(&iterator.advance().unwrap().unwrap()), 1);
        assert_eq!(value_of(&iterator.advance().unwrap().unwrap()), 2);

        // Detour through a one-shot recipe, then back. If the old
        // producer survived the swaps it would resume its own burst
        // at 3; a rebuilt one continues from the real tip, 12.
        iterator.set_profile(&by_ten);
        assert_eq!(value_of(&iterator.advance().unwrap().unwrap()), 12);
        iterator.set_profile(&walking);
        assert_eq!(value_of(&iterator.advance().unwrap().unwrap()), 13);
    }

    #[test]
    fn equal_profile_swap_is_a_no_op() {
        let walking =
            StepProfile::generator(Arc::new(CountingGenerator::new(5)), ProfileArgs::new());
        let mut iterator = StepIterator::new(seeded(0, 0.0), walking.clone()).unwrap();

        assert_eq!(value_of(&iterator.advance().unwrap().unwrap()), 1);
        iterator.set_profile(&walking);
        // Same burst, same producer: no rebuild happened.
        assert_eq!(value_of(&iterator.advance().unwrap().unwrap()), 2);
        assert_eq!(value_of(&iterator.advance().unwrap().unwrap()), 3);
        assert_eq!(iterator.producer_rebuilds(), 0);
    }

    #[test]
    fn explicit_clock_readings_are_adopted() {
        let profile = StepProfile::function(Arc::new(ClockedStep::new(0.5)), ProfileArgs::new());
        let mut iterator = StepIterator::new(seeded(0, 0.0), profile).unwrap();

        let first = iterator.advance().unwrap().unwrap();
        let second = iterator.advance().unwrap().unwrap();
        assert_eq!(first.clock(), Some(0.5));
        assert_eq!(second.clock(), Some(1.0));
    }

    #[test]
    fn regressing_declared_clocks_are_rejected() {
        let profile = StepProfile::function(Arc::new(ClockedStep::new(-1.0)), ProfileArgs::new());
        let mut iterator = StepIterator::new(seeded(0, 5.0), profile).unwrap();

        let err = iterator.advance().err().unwrap();
        assert_eq!(
            err,
            CrunchError::ClockOutOfOrder {
                simpack: "clocked".to_string(),
                clock: 4.0,
                minimum: 5.0,
            }
        );
        assert_eq!(iterator.browser().len(), 1);
    }

    #[test]
    fn non_finite_declared_clocks_are_rejected() {
        let profile =
            StepProfile::function(Arc::new(ClockedStep::new(f64::NAN)), ProfileArgs::new());
        let mut iterator = StepIterator::new(seeded(0, 0.0), profile).unwrap();

        let err = iterator.advance().err().unwrap();
        assert!(matches!(err, CrunchError::ClockOutOfOrder { .. }));
    }

    #[test]
    fn history_dependent_steps_see_the_growing_lineage() {
        let profile = StepProfile::function(Arc::new(TrendStep), ProfileArgs::new());
        let mut iterator = StepIterator::new(seeded(1, 0.0), profile).unwrap();

        // 1 -> 1 (single entry), then Fibonacci-style sums over the
        // private browser, including states not yet in any tree.
        let values: Vec<_> = (0..5)
            .map(|_| value_of(&iterator.advance().unwrap().unwrap()))
            .collect();
        assert_eq!(values, vec![1, 2, 3, 5, 8]);
    }

    #[test]
    fn iterator_interface_streams_states() {
        let profile = StepProfile::function(Arc::new(EndingStep::new(3)), ProfileArgs::new());
        let iterator = StepIterator::new(seeded(0, 0.0), profile).unwrap();

        let values: Vec<u64> = iterator.map(|state| value_of(&state.unwrap())).collect();
        assert_eq!(values, vec![1, 2, 3]);
    }
}
