//! Core types and traits for the Bramble simulation-history framework.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the Bramble workspace:
//! type IDs, the [`WorldState`] payload trait, the simpack traits and
//! their inputs, step profiles, the history browser, and error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod browser;
pub mod error;
pub mod id;
pub mod profile;
pub mod state;
pub mod step;

pub use browser::{HistoryBrowser, HistoryEntry};
pub use error::{StepSignal, TreeError};
pub use id::{BlockId, NodeId, TreeGenerationId};
pub use profile::{ArgValue, ProfileArgs, StepProfile};
pub use state::WorldState;
pub use step::{StateProducer, StepFunction, StepGenerator, StepInput, StepKind};
