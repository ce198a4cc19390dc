//! Crunching telemetry counters.
//!
//! [`CrunchMetrics`] captures what a [`Cruncher`](crate::Cruncher) has
//! done so far, for progress displays and profiling. Counters are
//! cumulative over the driver's lifetime; the duration field covers
//! only the most recent step.

/// Counters collected while driving a lineage forward.
///
/// Durations are in microseconds.
#[derive(Clone, Debug, Default)]
pub struct CrunchMetrics {
    /// Cumulative number of states produced and committed.
    pub states_produced: u64,
    /// Cumulative number of mid-stream producer rebuilds.
    pub producer_rebuilds: u64,
    /// Cumulative number of profile swaps applied.
    pub profile_changes: u64,
    /// Cumulative number of step failures surfaced to the caller.
    pub step_failures: u64,
    /// Wall-clock time of the most recent advance, in microseconds.
    pub last_step_us: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = CrunchMetrics::default();
        assert_eq!(m.states_produced, 0);
        assert_eq!(m.producer_rebuilds, 0);
        assert_eq!(m.profile_changes, 0);
        assert_eq!(m.step_failures, 0);
        assert_eq!(m.last_step_us, 0);
    }
}
