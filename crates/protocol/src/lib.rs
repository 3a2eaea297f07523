//! Shared data model for the Weft retrieval engine.
//!
//! Every crate in the workspace speaks in terms of these types: indexed
//! [`Chunk`]s, per-signal [`SignalHit`]s, fused [`RankedHit`]s, assembly
//! [`Seed`]s, the [`ContextBundle`] handed to consumers, and the validated
//! [`RetrievalConfig`] that tunes the whole pipeline.

pub mod bundle;
pub mod config;
pub mod types;

pub use bundle::{
    BudgetInfo, BundleSummary, ContentMode, ContextBundle, ContextChunk, ContextFile,
    FileRelevance,
};
pub use config::{
    AssemblyConfig, CouplingConfig, GateConfig, RankingConfig, RetrievalConfig,
};
pub use types::{
    Chunk, ChunkMeta, ChunkType, DiffFile, DiffStatus, FileCategory, MatchType, RankedHit, Seed,
    SeedSource, SignalHit,
};
