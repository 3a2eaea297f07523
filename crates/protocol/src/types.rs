//! Core retrieval types shared across the workspace.

use serde::{Deserialize, Serialize};

/// A unit of indexed code or text, addressed by a stable id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub repo: String,
    pub file_path: String,
    pub chunk_type: ChunkType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub start_line: u32,
    pub end_line: u32,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Unix seconds of the last modification of the source file, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<u64>,
}

impl Chunk {
    /// Inclusive line span of this chunk.
    pub fn line_count(&self) -> u32 {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    pub fn category(&self) -> FileCategory {
        FileCategory::classify(&self.file_path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    Function,
    Method,
    Class,
    Struct,
    Enum,
    Trait,
    Module,
    Block,
}

/// Coarse classification of a file by its role in the repository.
///
/// Documentation and configuration chunks are demoted during fusion so that
/// prose does not crowd out implementation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    Source,
    Documentation,
    Config,
    Test,
}

impl FileCategory {
    pub fn classify(path: &str) -> Self {
        let lower = path.to_lowercase();
        if lower
            .split('/')
            .any(|seg| seg == "tests" || seg == "test" || seg == "__tests__")
            || lower.ends_with("_test.rs")
            || lower.ends_with("_test.go")
            || lower.ends_with(".test.ts")
            || lower.ends_with(".test.js")
            || lower.ends_with("_spec.rb")
        {
            return FileCategory::Test;
        }
        let ext = lower.rsplit('.').next().unwrap_or("");
        match ext {
            "md" | "markdown" | "rst" | "adoc" | "txt" => FileCategory::Documentation,
            "toml" | "yaml" | "yml" | "json" | "ini" | "cfg" | "lock" | "env" => {
                FileCategory::Config
            }
            _ => FileCategory::Source,
        }
    }

    /// Whether fusion applies the documentation demotion multiplier.
    pub fn is_demoted(self) -> bool {
        matches!(self, FileCategory::Documentation | FileCategory::Config)
    }
}

/// Which retrieval signal(s) produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Semantic,
    Keyword,
    Hybrid,
}

/// A raw hit from a single retrieval signal, scored on that signal's own scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalHit {
    pub chunk_id: String,
    pub score: f32,
}

/// Per-chunk metadata the fusion stage needs without fetching full content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkMeta {
    pub category: FileCategory,
    /// Unix seconds of last modification; `None` means age is unknown and no
    /// recency penalty applies.
    pub modified_at: Option<u64>,
}

/// A fused hit with its provenance preserved for diagnostics and tie-breaks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedHit {
    pub chunk_id: String,
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_rank: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_rank: Option<u32>,
    pub match_type: MatchType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
}

/// One file of a parsed diff, with the line numbers added on the new side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffFile {
    pub path: String,
    pub status: DiffStatus,
    #[serde(default)]
    pub added_lines: Vec<u32>,
}

/// An entry point for context assembly: a chunk plus why it was selected.
#[derive(Debug, Clone, PartialEq)]
pub struct Seed {
    pub chunk: Chunk,
    pub score: f32,
    pub source: SeedSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedSource {
    Search { match_type: MatchType },
    Diff { status: DiffStatus },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn classify_by_extension() {
        assert_eq!(FileCategory::classify("src/lib.rs"), FileCategory::Source);
        assert_eq!(
            FileCategory::classify("docs/guide.md"),
            FileCategory::Documentation
        );
        assert_eq!(FileCategory::classify("Cargo.toml"), FileCategory::Config);
        assert_eq!(
            FileCategory::classify("config/settings.YAML"),
            FileCategory::Config
        );
    }

    #[test]
    fn classify_test_paths() {
        assert_eq!(
            FileCategory::classify("tests/integration.rs"),
            FileCategory::Test
        );
        assert_eq!(
            FileCategory::classify("src/parser_test.go"),
            FileCategory::Test
        );
        assert_eq!(
            FileCategory::classify("web/app.test.ts"),
            FileCategory::Test
        );
    }

    #[test]
    fn demotion_covers_docs_and_config() {
        assert!(FileCategory::Documentation.is_demoted());
        assert!(FileCategory::Config.is_demoted());
        assert!(!FileCategory::Source.is_demoted());
        assert!(!FileCategory::Test.is_demoted());
    }

    #[test]
    fn chunk_line_count_is_inclusive() {
        let chunk = Chunk {
            id: "a:1".into(),
            repo: "a".into(),
            file_path: "src/main.rs".into(),
            chunk_type: ChunkType::Function,
            name: Some("main".into()),
            start_line: 10,
            end_line: 24,
            content: String::new(),
            language: Some("rust".into()),
            modified_at: None,
        };
        assert_eq!(chunk.line_count(), 15);
    }

    #[test]
    fn ranked_hit_serde_roundtrip() {
        let hit = RankedHit {
            chunk_id: "repo:src/lib.rs:1".into(),
            score: 0.42,
            semantic_rank: Some(1),
            keyword_rank: None,
            match_type: MatchType::Hybrid,
        };
        let json = serde_json::to_string(&hit).unwrap();
        assert!(!json.contains("keyword_rank"));
        let back: RankedHit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hit);
    }
}
