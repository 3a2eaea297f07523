//! Assembled context bundles: the engine's output format.

use serde::{Deserialize, Serialize};

use crate::types::{ChunkType, FileCategory};

/// How much chunk content the assembler copies into the bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentMode {
    /// Full chunk text.
    #[default]
    Full,
    /// First three lines followed by an ellipsis marker.
    Preview,
    /// Locations and scores only, no content.
    Metadata,
}

/// A budget-constrained selection of chunks grouped by file, ordered most
/// relevant first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub files: Vec<ContextFile>,
    pub budget: BudgetInfo,
    pub summary: BundleSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextFile {
    pub path: String,
    pub repo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub relevance: FileRelevance,
    pub category: FileCategory,
    /// Best score among this file's chunks.
    pub score: f32,
    /// For coupled files, the seed file that pulled this one in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupled_to: Option<String>,
    pub chunks: Vec<ContextChunk>,
}

/// Why a file is in the bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FileRelevance {
    /// Directly matched by a seed.
    Direct,
    /// Reached through the coupling graph at the given hop depth.
    Coupled { depth: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextChunk {
    pub id: String,
    pub chunk_type: ChunkType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub start_line: u32,
    pub end_line: u32,
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Line-budget accounting, recorded whether or not the budget was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetInfo {
    pub max_lines: u32,
    pub used_lines: u32,
    /// Chunks that would have overflowed the budget and were skipped whole.
    pub skipped_chunks: u32,
}

/// Aggregate counters for quick inspection of a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BundleSummary {
    pub total_files: u32,
    pub total_chunks: u32,
    pub direct_files: u32,
    pub coupled_files: u32,
    pub source_files: u32,
    pub doc_files: u32,
    /// Raw top cosine similarity before fusion, when a semantic signal ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_semantic_score: Option<f32>,
}

impl ContextBundle {
    /// An empty bundle that still carries truthful budget accounting.
    pub fn empty(max_lines: u32) -> Self {
        Self {
            query: None,
            files: Vec::new(),
            budget: BudgetInfo {
                max_lines,
                used_lines: 0,
                skipped_chunks: 0,
            },
            summary: BundleSummary::default(),
        }
    }
}
