//! Clock resolution for produced states.
//!
//! A step computation may stamp its output with an explicit clock
//! reading or leave it clockless. [`AutoClockGenerator`] turns that
//! choice into one resolved, monotone sequence: explicit readings are
//! adopted as-is, clockless states get the previous reading plus one.

/// Resolves the clock reading of each produced state.
///
/// Seeded with the clock of the lineage tip the crunching started
/// from, so the very first produced state already continues the
/// lineage's timeline. Validation of explicit readings (finite, not
/// regressing) is the iterator's job; the generator only resolves.
#[derive(Clone, Copy, Debug)]
pub struct AutoClockGenerator {
    last: f64,
}

impl AutoClockGenerator {
    /// A generator continuing from `last`, the tip's clock reading.
    pub fn new(last: f64) -> Self {
        Self { last }
    }

    /// The minimum admissible reading for the next state.
    ///
    /// Equal readings are allowed; simultaneous states are legal on a
    /// timeline.
    pub fn floor(&self) -> f64 {
        self.last
    }

    /// Resolve the next state's reading and advance the sequence.
    ///
    /// `Some(reading)` is adopted verbatim; `None` yields the previous
    /// reading plus one.
    pub fn resolve(&mut self, declared: Option<f64>) -> f64 {
        let clock = match declared {
            Some(reading) => reading,
            None => self.last + 1.0,
        };
        self.last = clock;
        clock
    }
}
