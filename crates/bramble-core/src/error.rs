//! Error types shared across the Bramble workspace.
//!
//! Organized by subsystem: tree storage (lookup and append validation)
//! and the simpack-facing step signal. Engine-level errors live in the
//! cruncher crate and wrap these.

use std::error::Error;
use std::fmt;

use crate::id::{BlockId, NodeId};

/// Errors from tree storage: lookups and append validation.
///
/// All variants are local and recoverable; a failed lookup or append
/// never leaves partial state in the tree.
#[derive(Clone, Debug, PartialEq)]
pub enum TreeError {
    /// The node ID does not resolve in this tree.
    NodeNotFound {
        /// The offending ID.
        id: NodeId,
    },
    /// The block ID does not resolve in this tree.
    BlockNotFound {
        /// The offending ID.
        id: BlockId,
    },
    /// A traversal bound references a node that is not on the path
    /// being traversed.
    BoundOffPath {
        /// The node named by the bound.
        node: NodeId,
    },
    /// An appended state carries no clock reading.
    ///
    /// Appends go through the crunching engine's clock stamping; a
    /// clockless state reaching the tree is rejected rather than
    /// guessed at.
    UnclockedState,
    /// An appended state carries a non-finite clock reading.
    InvalidClock {
        /// The rejected reading.
        clock: f64,
    },
    /// An appended state's clock reads earlier than its parent's.
    ClockRegression {
        /// The rejected reading.
        clock: f64,
        /// The parent node's reading.
        parent_clock: f64,
    },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeNotFound { id } => write!(f, "node {id} not found"),
            Self::BlockNotFound { id } => write!(f, "block {id} not found"),
            Self::BoundOffPath { node } => {
                write!(f, "bound node {node} is not on the traversed path")
            }
            Self::UnclockedState => write!(f, "state has no clock reading"),
            Self::InvalidClock { clock } => write!(f, "clock reading {clock} is not finite"),
            Self::ClockRegression {
                clock,
                parent_clock,
            } => {
                write!(
                    f,
                    "clock reading {clock} regresses below parent clock {parent_clock}"
                )
            }
        }
    }
}

impl Error for TreeError {}

/// Signal returned by a simpack step computation in place of a state.
///
/// `WorldEnded` is a legitimate termination, not a failure; the engine
/// translates it into normal iterator exhaustion. `Failed` is fatal for
/// the crunching run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepSignal {
    /// The simulated world has reached a natural end; no further
    /// states exist on this timeline.
    WorldEnded,
    /// The step computation could not produce a state.
    Failed {
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl fmt::Display for StepSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WorldEnded => write!(f, "the simulated world ended"),
            Self::Failed { reason } => write!(f, "step computation failed: {reason}"),
        }
    }
}

impl Error for StepSignal {}
