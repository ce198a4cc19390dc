//! Step profiles: a computation plus the arguments it was bound with.
//!
//! A [`StepProfile`] is the unit of "how states get made". Profiles are
//! immutable values; changing arguments means building a new profile.
//! Equality and hashing combine computation identity with structural
//! argument equality, so two independently built profiles over the same
//! computation and arguments collide in keyed lookups. The tree's
//! profile registry depends on this.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::step::{StepFunction, StepGenerator, StepKind};

/// One argument value in a step profile.
///
/// Values are comparable and hashable so profiles can key maps.
/// Floats compare and hash by bit pattern: `NaN == NaN` holds, and
/// `0.0` and `-0.0` are distinct.
#[derive(Clone, Debug)]
pub enum ArgValue {
    /// A boolean flag.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating-point number, compared by bit pattern.
    Float(f64),
    /// A text value.
    Text(String),
}

impl ArgValue {
    /// The boolean payload, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The integer payload, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The float payload, if this is a `Float`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// The text payload, if this is a `Text`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl PartialEq for ArgValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ArgValue {}

impl Hash for ArgValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Bool(v) => v.hash(state),
            Self::Int(v) => v.hash(state),
            Self::Float(v) => v.to_bits().hash(state),
            Self::Text(v) => v.hash(state),
        }
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ArgValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Positional and keyword arguments bound into a step profile.
///
/// Keyword arguments live in a `BTreeMap` so iteration order, equality,
/// and hashing are canonical regardless of insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ProfileArgs {
    positional: Vec<ArgValue>,
    keyword: BTreeMap<String, ArgValue>,
}

impl ProfileArgs {
    /// No arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument (builder style).
    #[must_use]
    pub fn arg(mut self, value: impl Into<ArgValue>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Insert a keyword argument (builder style).
    ///
    /// Re-inserting a key replaces the previous value.
    #[must_use]
    pub fn named(mut self, key: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.keyword.insert(key.into(), value.into());
        self
    }

    /// The positional arguments in order.
    pub fn positional(&self) -> &[ArgValue] {
        &self.positional
    }

    /// The positional argument at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&ArgValue> {
        self.positional.get(index)
    }

    /// The keyword argument named `key`, if present.
    pub fn get_named(&self, key: &str) -> Option<&ArgValue> {
        self.keyword.get(key)
    }

    /// Total number of arguments, positional and keyword.
    pub fn len(&self) -> usize {
        self.positional.len() + self.keyword.len()
    }

    /// Whether no arguments were bound.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }
}

/// A step computation bound to the arguments it will be invoked with.
///
/// The profile every node records is the exact recipe that produced its
/// state. Profiles are cheap to clone (the computation is shared behind
/// an `Arc`) and immutable once built.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StepProfile {
    step: StepKind,
    args: ProfileArgs,
}

impl StepProfile {
    /// Bind a computation to its arguments.
    pub fn new(step: StepKind, args: ProfileArgs) -> Self {
        Self { step, args }
    }

    /// Bind a one-shot computation.
    pub fn function(step: Arc<dyn StepFunction>, args: ProfileArgs) -> Self {
        Self::new(StepKind::Function(step), args)
    }

    /// Bind an incremental computation.
    pub fn generator(step: Arc<dyn StepGenerator>, args: ProfileArgs) -> Self {
        Self::new(StepKind::Generator(step), args)
    }

    /// The computation this profile invokes.
    pub fn step(&self) -> &StepKind {
        &self.step
    }

    /// The bound arguments.
    pub fn args(&self) -> &ProfileArgs {
        &self.args
    }

    /// The computation's human-readable name.
    pub fn name(&self) -> &str {
        self.step.name()
    }

    /// Whether the computation declared history dependence.
    pub fn history_dependent(&self) -> bool {
        self.step.history_dependent()
    }
}

impl fmt::Debug for StepProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepProfile")
            .field("step", &self.step)
            .field("args", &self.args)
            .finish()
    }
}
