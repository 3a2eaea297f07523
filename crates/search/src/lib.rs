//! Hybrid retrieval: preprocessing, fusion, gating, and orchestration.
//!
//! The pipeline runs in stages. [`preprocess`] turns a conversational query
//! into signal-specific query strings. The engine fans out to a semantic and
//! a keyword index concurrently, [`fusion`] merges the two ranked lists with
//! reciprocal rank fusion plus demotion and recency adjustments, [`gate`]
//! decides whether unsolicited injection is warranted, and the top fused
//! hits seed coupling-aware context assembly. [`review`] derives seeds from
//! diffs instead of queries, and [`calibrate`] replays captured signals
//! across config variants offline.

pub mod calibrate;
pub mod engine;
pub mod error;
pub mod fusion;
pub mod gate;
pub mod preprocess;
pub mod review;

pub use engine::{ChunkStore, ContextEngine, KeywordIndex, SemanticIndex};
pub use error::{Result, SearchError};
pub use preprocess::{prepare, PreparedQuery};
