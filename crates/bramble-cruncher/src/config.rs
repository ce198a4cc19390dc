//! Cruncher configuration, validation, and the spawn error type.
//!
//! [`CruncherConfig`] shapes the background worker spawned by
//! [`CruncherThread`](crate::CruncherThread): how far it may crunch
//! ahead of the consumer and how often it polls when it has nothing
//! to do. [`validate()`](CruncherConfig::validate) checks structural
//! invariants before a worker is spawned.

use std::error::Error;
use std::fmt;
use std::time::Duration;

// ── CruncherConfig ─────────────────────────────────────────────────

/// Configuration for a background cruncher worker.
#[derive(Clone, Debug)]
pub struct CruncherConfig {
    /// How many produced states the worker may buffer ahead of the
    /// consumer before it pauses. Default: 32.
    pub lookahead: usize,
    /// Milliseconds the worker sleeps between polls while it has
    /// nothing to do (buffer full, or parked after a terminal event).
    /// Zero busy-spins. Default: 1.
    pub poll_interval_ms: u64,
}

impl Default for CruncherConfig {
    fn default() -> Self {
        Self {
            lookahead: 32,
            poll_interval_ms: 1,
        }
    }
}

impl CruncherConfig {
    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Lookahead >= 1. The hand-over buffer is sized by it, and a
        //    zero-capacity buffer can never accept a state from a
        //    polling worker.
        if self.lookahead == 0 {
            return Err(ConfigError::ZeroLookahead);
        }
        Ok(())
    }

    /// The poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while validating or applying a [`CruncherConfig`].
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// Lookahead is zero.
    ZeroLookahead,
    /// The background thread could not be spawned.
    ThreadSpawnFailed {
        /// The spawn failure as reported by the OS.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroLookahead => write!(f, "lookahead must be at least 1"),
            Self::ThreadSpawnFailed { reason } => {
                write!(f, "thread spawn failed: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(CruncherConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_lookahead_fails() {
        let cfg = CruncherConfig {
            lookahead: 0,
            ..CruncherConfig::default()
        };
        match cfg.validate() {
            Err(ConfigError::ZeroLookahead) => {}
            other => panic!("expected ZeroLookahead, got {other:?}"),
        }
    }

    #[test]
    fn zero_poll_interval_is_allowed() {
        let cfg = CruncherConfig {
            poll_interval_ms: 0,
            ..CruncherConfig::default()
        };
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.poll_interval(), Duration::ZERO);
    }

    #[test]
    fn thread_spawn_failed_error_display() {
        let err = ConfigError::ThreadSpawnFailed {
            reason: "cruncher worker: resource limit".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("thread spawn failed"));
        assert!(msg.contains("cruncher worker"));
    }
}
