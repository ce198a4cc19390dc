//! Test fixtures and mock simpacks for Bramble development.
//!
//! Provides [`CounterState`] (the canonical test world state), helpers
//! for building profiles around it, and the step fixtures in
//! [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{
    BarrenGenerator, ClockedStep, CounterStep, CountingGenerator, EndingStep, FailingStep,
    JitterWalk, TrendStep,
};

use std::any::Any;
use std::sync::Arc;

use bramble_core::{ProfileArgs, StepProfile, WorldState};

/// The canonical test world state: a counter and an optional clock.
///
/// Small enough that every scenario fits in a handful of asserts, rich
/// enough to exercise clock stamping, downcasting, and state cloning.
#[derive(Clone, Debug, PartialEq)]
pub struct CounterState {
    value: u64,
    clock: Option<f64>,
}

impl CounterState {
    /// A clockless counter state.
    pub fn new(value: u64) -> Self {
        Self { value, clock: None }
    }

    /// A counter state with an explicit clock reading.
    pub fn with_clock(value: u64, clock: f64) -> Self {
        Self {
            value,
            clock: Some(clock),
        }
    }

    pub fn value(&self) -> u64 {
        self.value
    }
}

impl WorldState for CounterState {
    fn clock(&self) -> Option<f64> {
        self.clock
    }

    fn set_clock(&mut self, clock: f64) {
        self.clock = Some(clock);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A profile around a fresh [`CounterStep`] with no arguments.
///
/// Each call allocates a fresh computation, so two calls yield
/// profiles that do not compare equal. Share the returned profile
/// (clone it, or wrap it in one `Arc`) when equality matters.
pub fn counter_profile() -> StepProfile {
    StepProfile::function(Arc::new(CounterStep), ProfileArgs::new())
}

/// A profile around a fresh [`CounterStep`] stepping by `amount`.
pub fn counter_profile_by(amount: i64) -> StepProfile {
    StepProfile::function(Arc::new(CounterStep), ProfileArgs::new().arg(amount))
}
