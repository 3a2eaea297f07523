//! Temporal coupling graph and context assembly.
//!
//! Files that change together in version history tend to belong together in
//! context. This crate accumulates co-change evidence into a weighted graph
//! ([`CouplingGraphBuilder`] / [`CouplingGraph`]), and turns scored seeds plus
//! coupled neighbors into a budget-constrained [`ContextBundle`]
//! (via [`assemble_bundle`]).

pub mod assembler;
pub mod builder;
pub mod error;
pub mod graph;
pub mod types;

pub use assembler::{assemble_bundle, CoupledChunk};
pub use builder::CouplingGraphBuilder;
pub use error::{GraphError, Result};
pub use graph::CouplingGraph;
pub use types::{CoupledFile, CouplingEdge};

pub use weft_protocol::ContextBundle;
