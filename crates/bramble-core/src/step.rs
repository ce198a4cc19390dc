//! The simpack traits: [`StepFunction`], [`StepGenerator`], and the
//! [`StateProducer`] objects generators hand back.
//!
//! A simpack supplies the domain-specific step computation in exactly
//! one of two shapes, fixed at profile construction by [`StepKind`]:
//! a one-shot function invoked once per produced state, or a generator
//! whose producer is pulled repeatedly and rebuilt by the engine when
//! it runs dry or the active profile changes.

use std::fmt;
use std::sync::Arc;

use crate::browser::HistoryBrowser;
use crate::error::StepSignal;
use crate::profile::ProfileArgs;
use crate::state::WorldState;

/// Input handed to a step computation when it is invoked or started.
///
/// The engine chooses the variant from the computation's declared
/// [`history_dependent`](StepFunction::history_dependent) flag: plain
/// computations see only the lineage tip, history-dependent ones see
/// the whole browsable lineage.
#[derive(Clone, Copy)]
pub enum StepInput<'a> {
    /// The newest state on the lineage being crunched.
    Tip(&'a dyn WorldState),
    /// The browsable lineage up to and including the newest state.
    History(&'a HistoryBrowser),
}

impl<'a> StepInput<'a> {
    /// The newest state visible through this input, if any.
    ///
    /// For [`StepInput::Tip`] this is the state itself; for
    /// [`StepInput::History`] it is the browser's tip entry. `None`
    /// only for an empty history, which the engine never produces.
    pub fn tip(&self) -> Option<&'a dyn WorldState> {
        match self {
            Self::Tip(state) => Some(*state),
            Self::History(browser) => browser.tip_state(),
        }
    }

    /// The browsable history, for computations that declared the need.
    pub fn history(&self) -> Option<&'a HistoryBrowser> {
        match self {
            Self::Tip(_) => None,
            Self::History(browser) => Some(browser),
        }
    }
}

impl fmt::Debug for StepInput<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tip(state) => f.debug_tuple("Tip").field(state).finish(),
            Self::History(browser) => f
                .debug_struct("History")
                .field("len", &browser.len())
                .finish(),
        }
    }
}

/// A one-shot step computation: one invocation, one new state.
///
/// # Contract
///
/// - `step()` MUST be deterministic: the same input state and arguments
///   produce an identical successor.
/// - Computations are stateless (`&self`); per-run state belongs in the
///   world-states themselves.
/// - A returned state may carry an explicit clock reading; clockless
///   states are stamped by the engine.
///
/// # Object safety
///
/// This trait is object-safe; profiles store computations as
/// `Arc<dyn StepFunction>`.
///
/// # Examples
///
/// A minimal computation that increments a counter state:
///
/// ```
/// use bramble_core::{ProfileArgs, StepFunction, StepInput, StepSignal, WorldState};
/// use std::any::Any;
///
/// #[derive(Debug)]
/// struct Counter {
///     value: u64,
///     clock: Option<f64>,
/// }
///
/// impl WorldState for Counter {
///     fn clock(&self) -> Option<f64> { self.clock }
///     fn set_clock(&mut self, clock: f64) { self.clock = Some(clock); }
///     fn as_any(&self) -> &dyn Any { self }
/// }
///
/// struct Increment;
///
/// impl StepFunction for Increment {
///     fn name(&self) -> &str { "increment" }
///
///     fn step(
///         &self,
///         input: StepInput<'_>,
///         _args: &ProfileArgs,
///     ) -> Result<Box<dyn WorldState>, StepSignal> {
///         let tip = input.tip().ok_or(StepSignal::Failed {
///             reason: "empty history".into(),
///         })?;
///         let counter = tip.downcast_ref::<Counter>().ok_or(StepSignal::Failed {
///             reason: "not a Counter state".into(),
///         })?;
///         Ok(Box::new(Counter { value: counter.value + 1, clock: None }))
///     }
/// }
///
/// let f = Increment;
/// assert_eq!(f.name(), "increment");
/// ```
pub trait StepFunction: Send + Sync + 'static {
    /// Human-readable name for error reporting and telemetry.
    fn name(&self) -> &str;

    /// Whether this computation needs the whole lineage rather than
    /// just the tip state.
    ///
    /// Default: `false` (tip only).
    fn history_dependent(&self) -> bool {
        false
    }

    /// Produce the successor of the input's tip state.
    ///
    /// Returns the new state, or a [`StepSignal`]: `WorldEnded` for a
    /// natural end of the timeline, `Failed` for a fatal error.
    fn step(
        &self,
        input: StepInput<'_>,
        args: &ProfileArgs,
    ) -> Result<Box<dyn WorldState>, StepSignal>;
}

/// An incremental step computation: started once, pulled many times.
///
/// The engine calls [`start`](StepGenerator::start) with the current
/// lineage tip and pulls states from the returned producer. When the
/// producer reports exhaustion the engine transparently starts a fresh
/// one from the newest tip, so a finite producer still presents an
/// endless timeline to the caller.
///
/// # Object safety
///
/// This trait is object-safe; profiles store computations as
/// `Arc<dyn StepGenerator>`.
pub trait StepGenerator: Send + Sync + 'static {
    /// Human-readable name for error reporting and telemetry.
    fn name(&self) -> &str;

    /// Whether this computation needs the whole lineage rather than
    /// just the tip state.
    ///
    /// Default: `false` (tip only).
    fn history_dependent(&self) -> bool {
        false
    }

    /// Begin producing successors of the input's tip state.
    ///
    /// The producer owns everything it needs; it must not borrow from
    /// the input. Producers must yield at least one state before
    /// exhausting, or the engine reports them as barren.
    fn start(&self, input: StepInput<'_>, args: &ProfileArgs) -> Box<dyn StateProducer>;
}

/// The pull side of an incremental step computation.
///
/// Implementations are plain state machines: each call either yields
/// the next state (`Ok(Some)`), reports exhaustion (`Ok(None)`, after
/// which the engine rebuilds), or raises a [`StepSignal`].
pub trait StateProducer: Send {
    /// Produce the next state, if any.
    fn next_state(&mut self) -> Result<Option<Box<dyn WorldState>>, StepSignal>;
}

/// A step computation in one of its two admissible shapes.
///
/// The shape is fixed when the profile is built and never re-inspected
/// per call; misusing a function as a generator (or vice versa) is
/// unrepresentable.
#[derive(Clone)]
pub enum StepKind {
    /// A one-shot computation.
    Function(Arc<dyn StepFunction>),
    /// An incremental computation.
    Generator(Arc<dyn StepGenerator>),
}

impl StepKind {
    /// The computation's human-readable name.
    pub fn name(&self) -> &str {
        match self {
            Self::Function(f) => f.name(),
            Self::Generator(g) => g.name(),
        }
    }

    /// Whether the computation declared history dependence.
    pub fn history_dependent(&self) -> bool {
        match self {
            Self::Function(f) => f.history_dependent(),
            Self::Generator(g) => g.history_dependent(),
        }
    }

    /// Pointer identity of the underlying computation.
    ///
    /// Two `StepKind`s compare equal exactly when they are clones of
    /// the same `Arc`'d computation. Profile equality and hashing are
    /// built on this.
    pub fn identity(&self) -> usize {
        match self {
            Self::Function(f) => Arc::as_ptr(f) as *const () as usize,
            Self::Generator(g) => Arc::as_ptr(g) as *const () as usize,
        }
    }
}

impl PartialEq for StepKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Function(_), Self::Function(_)) | (Self::Generator(_), Self::Generator(_)) => {
                self.identity() == other.identity()
            }
            _ => false,
        }
    }
}

impl Eq for StepKind {}

impl std::hash::Hash for StepKind {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        self.identity().hash(state);
    }
}

impl fmt::Debug for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(inner) => write!(f, "Function({})", inner.name()),
            Self::Generator(inner) => write!(f, "Generator({})", inner.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;

    #[derive(Debug)]
    struct Blank {
        clock: Option<f64>,
    }

    impl WorldState for Blank {
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

    struct Noop;

    impl StepFunction for Noop {
        fn name(&self) -> &str {
            "noop"
        }
        fn step(
            &self,
            _input: StepInput<'_>,
            _args: &ProfileArgs,
        ) -> Result<Box<dyn WorldState>, StepSignal> {
            Ok(Box::new(Blank { clock: None }))
        }
    }

    #[test]
    fn identity_tracks_the_allocation() {
        let a: Arc<dyn StepFunction> = Arc::new(Noop);
        let b = Arc::clone(&a);
        let c: Arc<dyn StepFunction> = Arc::new(Noop);

        let ka = StepKind::Function(a);
        let kb = StepKind::Function(b);
        let kc = StepKind::Function(c);

        assert_eq!(ka, kb);
        assert_ne!(ka, kc);
    }

    #[test]
    fn input_tip_reaches_through_history() {
        let mut browser = HistoryBrowser::new();
        browser.push(1.0, Arc::new(Blank { clock: Some(1.0) }));

        let input = StepInput::History(&browser);
        assert_eq!(input.tip().and_then(|s| s.clock()), Some(1.0));
        assert!(input.history().is_some());

        let state = Blank { clock: Some(2.0) };
        let input = StepInput::Tip(&state);
        assert_eq!(input.tip().and_then(|s| s.clock()), Some(2.0));
        assert!(input.history().is_none());
    }
}
