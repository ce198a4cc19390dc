//! The [`WorldState`] trait: the opaque simulation payload.
//!
//! Bramble never inspects the contents of a world-state beyond its
//! clock reading. Simpacks define concrete state types and downcast
//! through [`WorldState::as_any`] when they need their own fields back.

use std::any::Any;
use std::fmt;

/// One simulated world-state, opaque to the framework.
///
/// States are created by simpack step computations, stamped with a
/// clock reading by the crunching engine if they do not carry one,
/// and then frozen into the tree behind an `Arc`. After freezing the
/// framework never mutates a state; `set_clock` is only called while
/// the engine still holds the state exclusively.
pub trait WorldState: fmt::Debug + Send + Sync + 'static {
    /// The clock reading this state carries, if any.
    ///
    /// A simpack may declare an explicit reading; states without one
    /// are stamped by the engine's auto-clock.
    fn clock(&self) -> Option<f64>;

    /// Stamp this state with a clock reading.
    ///
    /// Called at most once, before the state becomes shared.
    fn set_clock(&mut self, clock: f64);

    /// Upcast for concrete-type recovery via [`dyn WorldState::downcast_ref`].
    fn as_any(&self) -> &dyn Any;
}

impl dyn WorldState {
    /// Downcast a borrowed state to its concrete type.
    ///
    /// Returns `None` if the state is not a `T`.
    ///
    /// # Example
    ///
    /// ```
    /// use bramble_core::WorldState;
    /// use std::any::Any;
    ///
    /// #[derive(Debug)]
    /// struct Counter {
    ///     value: u64,
    ///     clock: Option<f64>,
    /// }
    ///
    /// impl WorldState for Counter {
    ///     fn clock(&self) -> Option<f64> {
    ///         self.clock
    ///     }
    ///     fn set_clock(&mut self, clock: f64) {
    ///         self.clock = Some(clock);
    ///     }
    ///     fn as_any(&self) -> &dyn Any {
    ///         self
    ///     }
    /// }
    ///
    /// let state: Box<dyn WorldState> = Box::new(Counter { value: 7, clock: None });
    /// assert_eq!(state.downcast_ref::<Counter>().unwrap().value, 7);
    /// ```
    pub fn downcast_ref<T: WorldState>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}
