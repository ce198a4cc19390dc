//! Crunching engine driving Bramble simulation timelines forward.
//!
//! Crunching is the act of computing new world-states at the tip of a
//! lineage. The [`StepIterator`] is the core loop: it owns a private
//! [`HistoryBrowser`](bramble_core::HistoryBrowser) snapshot of the
//! lineage, invokes the active [`StepProfile`](bramble_core::StepProfile)
//! one step at a time, resolves clock readings, and records each
//! produced state. Two drivers wrap it:
//!
//! - [`Cruncher`]: synchronous, borrows the [`Tree`](bramble_tree::Tree)
//!   per call and commits produced states directly;
//! - [`CruncherThread`]: moves the iterator onto a worker thread and
//!   streams [`CruncherEvent`]s back over a bounded channel, so the
//!   simulation runs ahead of its consumer by at most the configured
//!   lookahead.
//!
//! ```text
//!                    ┌───────────────────┐
//!   StepProfile ────▶│   StepIterator    │────▶ Arc<dyn WorldState>
//!                    │ browser + clock   │
//!                    └───────────────────┘
//!                       ▲             ▲
//!              drives   │             │   drives
//!         ┌─────────────┴───┐   ┌─────┴──────────────┐
//!         │    Cruncher     │   │   CruncherThread   │
//!         │ (sync, &mut     │   │ (worker thread +   │
//!         │  Tree appends)  │   │  event channel)    │
//!         └─────────────────┘   └────────────────────┘
//! ```
//!
//! Because browsers hold `Arc`'d snapshots, crunching never borrows
//! the tree: many engines can grow different tips of one tree, each
//! owned by exactly one driver.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod clock;
pub mod config;
pub mod cruncher;
pub mod iterator;
pub mod metrics;
pub mod thread;

pub use clock::AutoClockGenerator;
pub use config::{ConfigError, CruncherConfig};
pub use cruncher::{CrunchReport, Cruncher};
pub use iterator::{CrunchError, StepIterator};
pub use metrics::CrunchMetrics;
pub use thread::{CruncherEvent, CruncherThread, ProducedState, RetireError};
