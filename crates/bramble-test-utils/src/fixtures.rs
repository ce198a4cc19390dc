//! Reusable step fixtures.
//!
//! Standard simpack pieces for iterator and cruncher testing:
//!
//! - [`CounterStep`]: one-shot, adds an amount to the counter, clockless.
//! - [`ClockedStep`]: one-shot, stamps explicit clocks with a fixed stride.
//! - [`EndingStep`]: one-shot, ends the world at a threshold value.
//! - [`FailingStep`]: one-shot, fails deterministically after N calls.
//! - [`TrendStep`]: history-dependent, sums the two newest values.
//! - [`CountingGenerator`]: incremental, yields a finite burst, then exhausts.
//! - [`BarrenGenerator`]: incremental, its producers never yield at all.
//! - [`JitterWalk`]: incremental, an endless seeded random-increment walk.

use std::sync::atomic::{AtomicUsize, Ordering};

use bramble_core::{
    ArgValue, ProfileArgs, StateProducer, StepFunction, StepGenerator, StepInput, StepSignal,
    WorldState,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::CounterState;

/// Extract the counter value from the input's tip state.
fn tip_value(input: &StepInput<'_>) -> Result<u64, StepSignal> {
    let tip = input.tip().ok_or_else(|| StepSignal::Failed {
        reason: "step input has no tip state".into(),
    })?;
    let counter = tip
        .downcast_ref::<CounterState>()
        .ok_or_else(|| StepSignal::Failed {
            reason: format!("expected CounterState, got {tip:?}"),
        })?;
    Ok(counter.value())
}

/// Adds an amount to the counter (positional arg 0, default 1).
///
/// Outputs are clockless, so this is the standard fixture for
/// exercising automatic clock stamping.
pub struct CounterStep;

impl StepFunction for CounterStep {
    fn name(&self) -> &str {
        "counter"
    }

    fn step(
        &self,
        input: StepInput<'_>,
        args: &ProfileArgs,
    ) -> Result<Box<dyn WorldState>, StepSignal> {
        let value = tip_value(&input)?;
        let amount = args.get(0).and_then(ArgValue::as_int).unwrap_or(1);
        Ok(Box::new(CounterState::new(
            value.saturating_add_signed(amount),
        )))
    }
}

/// Increments the counter and stamps an explicit clock reading,
/// `tip clock + stride`.
///
/// A negative stride produces regressing declared clocks, for testing
/// clock-order rejection.
pub struct ClockedStep {
    pub stride: f64,
}

impl ClockedStep {
    pub fn new(stride: f64) -> Self {
        Self { stride }
    }
}

impl StepFunction for ClockedStep {
    fn name(&self) -> &str {
        "clocked"
    }

    fn step(
        &self,
        input: StepInput<'_>,
        _args: &ProfileArgs,
    ) -> Result<Box<dyn WorldState>, StepSignal> {
        let tip = input.tip().ok_or_else(|| StepSignal::Failed {
            reason: "step input has no tip state".into(),
        })?;
        let value = tip_value(&input)?;
        let clock = tip.clock().unwrap_or(0.0) + self.stride;
        Ok(Box::new(CounterState::with_clock(value + 1, clock)))
    }
}

/// Increments the counter until it reaches a threshold, then reports
/// the natural end of the timeline.
pub struct EndingStep {
    pub end_at: u64,
}

impl EndingStep {
    pub fn new(end_at: u64) -> Self {
        Self { end_at }
    }
}

impl StepFunction for EndingStep {
    fn name(&self) -> &str {
        "ending"
    }

    fn step(
        &self,
        input: StepInput<'_>,
        _args: &ProfileArgs,
    ) -> Result<Box<dyn WorldState>, StepSignal> {
        let value = tip_value(&input)?;
        if value >= self.end_at {
            return Err(StepSignal::WorldEnded);
        }
        Ok(Box::new(CounterState::new(value + 1)))
    }
}

/// Fails deterministically after a configurable number of successful
/// calls.
///
/// Useful for testing error propagation through iterators and worker
/// threads. Uses `AtomicUsize` for the call counter so it satisfies
/// `Sync`.
pub struct FailingStep {
    pub succeed_count: usize,
    call_count: AtomicUsize,
}

impl FailingStep {
    /// A step that succeeds `succeed_count` times then fails.
    pub fn new(succeed_count: usize) -> Self {
        Self {
            succeed_count,
            call_count: AtomicUsize::new(0),
        }
    }

    /// How many times `step()` has been called.
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Reset the call counter.
    pub fn reset(&self) {
        self.call_count.store(0, Ordering::Relaxed);
    }
}

impl StepFunction for FailingStep {
    fn name(&self) -> &str {
        "failing"
    }

    fn step(
        &self,
        input: StepInput<'_>,
        _args: &ProfileArgs,
    ) -> Result<Box<dyn WorldState>, StepSignal> {
        let n = self.call_count.fetch_add(1, Ordering::Relaxed);
        if n >= self.succeed_count {
            return Err(StepSignal::Failed {
                reason: format!(
                    "deliberate failure after {} successful calls",
                    self.succeed_count
                ),
            });
        }
        let value = tip_value(&input)?;
        Ok(Box::new(CounterState::new(value + 1)))
    }
}

/// History-dependent step: the next value is the sum of the two newest
/// values on the lineage (or the tip alone for a one-entry history).
///
/// Declares [`history_dependent`](StepFunction::history_dependent), so
/// the engine hands it the whole browsable lineage.
pub struct TrendStep;

impl StepFunction for TrendStep {
    fn name(&self) -> &str {
        "trend"
    }

    fn history_dependent(&self) -> bool {
        true
    }

    fn step(
        &self,
        input: StepInput<'_>,
        _args: &ProfileArgs,
    ) -> Result<Box<dyn WorldState>, StepSignal> {
        let history = input.history().ok_or_else(|| StepSignal::Failed {
            reason: "trend step invoked without history".into(),
        })?;
        let newest = tip_value(&input)?;
        let older = history
            .len()
            .checked_sub(2)
            .and_then(|pos| history.get(pos))
            .and_then(|entry| entry.state().as_ref().downcast_ref::<CounterState>())
            .map_or(0, CounterState::value);
        Ok(Box::new(CounterState::new(newest + older)))
    }
}

/// Incremental computation whose producers yield a finite burst of
/// increments, then exhaust.
///
/// Useful for testing transparent producer rebuild: the engine should
/// chain bursts seamlessly rather than surface the exhaustion. A burst
/// of zero makes every producer barren.
pub struct CountingGenerator {
    pub burst: usize,
}

impl CountingGenerator {
    pub fn new(burst: usize) -> Self {
        Self { burst }
    }
}

impl StepGenerator for CountingGenerator {
    fn name(&self) -> &str {
        "counting"
    }

    fn start(&self, input: StepInput<'_>, _args: &ProfileArgs) -> Box<dyn StateProducer> {
        Box::new(CountingProducer {
            start: tip_value(&input),
            produced: 0,
            burst: self.burst,
        })
    }
}

struct CountingProducer {
    start: Result<u64, StepSignal>,
    produced: usize,
    burst: usize,
}

impl StateProducer for CountingProducer {
    fn next_state(&mut self) -> Result<Option<Box<dyn WorldState>>, StepSignal> {
        let base = self.start.clone()?;
        if self.produced == self.burst {
            return Ok(None);
        }
        self.produced += 1;
        Ok(Some(Box::new(CounterState::new(
            base + self.produced as u64,
        ))))
    }
}

/// Incremental computation whose producers never yield anything.
///
/// Useful for testing how the engine reports a computation that cannot
/// make progress.
pub struct BarrenGenerator;

impl StepGenerator for BarrenGenerator {
    fn name(&self) -> &str {
        "barren"
    }

    fn start(&self, _input: StepInput<'_>, _args: &ProfileArgs) -> Box<dyn StateProducer> {
        Box::new(BarrenProducer)
    }
}

struct BarrenProducer;

impl StateProducer for BarrenProducer {
    fn next_state(&mut self) -> Result<Option<Box<dyn WorldState>>, StepSignal> {
        Ok(None)
    }
}

/// Endless random walk with seeded, reproducible increments.
///
/// Each producer draws increments in `1..=max_step` from a ChaCha8 RNG
/// seeded with `seed`, so identical configurations produce identical
/// timelines.
pub struct JitterWalk {
    pub seed: u64,
    pub max_step: u64,
}

impl JitterWalk {
    pub fn new(seed: u64, max_step: u64) -> Self {
        Self { seed, max_step }
    }
}

impl StepGenerator for JitterWalk {
    fn name(&self) -> &str {
        "jitter-walk"
    }

    fn start(&self, input: StepInput<'_>, _args: &ProfileArgs) -> Box<dyn StateProducer> {
        Box::new(JitterProducer {
            current: tip_value(&input),
            rng: ChaCha8Rng::seed_from_u64(self.seed),
            max_step: self.max_step.max(1),
        })
    }
}

struct JitterProducer {
    current: Result<u64, StepSignal>,
    rng: ChaCha8Rng,
    max_step: u64,
}

impl StateProducer for JitterProducer {
    fn next_state(&mut self) -> Result<Option<Box<dyn WorldState>>, StepSignal> {
        let current = self.current.clone()?;
        let next = current + self.rng.random_range(1..=self.max_step);
        self.current = Ok(next);
        Ok(Some(Box::new(CounterState::new(next))))
    }
}
