//! Tree storage for Bramble simulation histories.
//!
//! A simulation run is a tree of world states: linear stretches where
//! one state simply follows another, and fork points where alternate
//! futures split off (different step arguments, edited states, or
//! re-runs of a nondeterministic step). This crate stores that tree
//! and the derived structures used to walk it.
//!
//! # Architecture
//!
//! ```text
//! Tree (arena, owns all nodes)
//! ├── Node      one frozen state + parent/children links
//! ├── Block     cached run of consecutive unforked nodes
//! ├── Path      root-to-endpoint lineage snapshot (ids only)
//! ├── Chunk     node-or-block unit of blockwise traversal
//! └── NodeRange consecutive span of one lineage, endpoints are chunks
//! ```
//!
//! Blocks exist so that traversal and bookkeeping over long unforked
//! stretches cost one step per run instead of one per node. They are a
//! derived cache, patched incrementally on every append; dissolving
//! them back to plain nodes is always loss-free.
//!
//! Everything a reader can hold (paths, ranges, browsers) is a
//! snapshot of ids or `Arc`'d states. Nothing borrows the arena, so
//! readers stay valid while a crunching thread grows the tree through
//! `&mut` access elsewhere.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod block;
pub mod chunk;
pub mod node;
pub mod path;
pub mod range;
pub mod tree;

// Public re-exports for the primary API surface.
pub use block::Block;
pub use chunk::Chunk;
pub use node::Node;
pub use path::{Path, PathChunks};
pub use range::{NodeRange, RangeChunks, RangeNodes};
pub use tree::Tree;
