//! Retrieval pipeline configuration.
//!
//! Every knob lives here, grouped by pipeline stage, with serde defaults so
//! that a partial TOML file (or none at all) yields a working configuration.
//! Validation happens once at load time; the rest of the pipeline trusts the
//! values it is handed.

use std::path::Path;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::bundle::ContentMode;

/// Expansion depths beyond this are rejected at validation time.
pub const MAX_EXPANSION_DEPTH: u32 = 5;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub assembly: AssemblyConfig,
    #[serde(default)]
    pub coupling: CouplingConfig,
}

/// Rank fusion knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Share of the fused score contributed by the semantic signal.
    pub semantic_weight: f32,
    /// Reciprocal-rank smoothing constant.
    pub rrf_k: f32,
    /// Multiplier applied once to documentation and config chunks.
    pub doc_demotion: f32,
    /// Days for a chunk's recency factor to halve.
    pub recency_half_life_days: f32,
    /// Share of the score exposed to recency decay.
    pub recency_weight: f32,
    /// Hits requested from each retrieval signal.
    pub search_limit: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            semantic_weight: 0.7,
            rrf_k: 60.0,
            doc_demotion: 0.5,
            recency_half_life_days: 30.0,
            recency_weight: 0.3,
            search_limit: 10,
        }
    }
}

/// Relevance gate for unsolicited context injection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Minimum raw top cosine similarity for injection to proceed.
    pub threshold: f32,
    /// Queries shorter than this never trigger injection.
    pub min_query_length: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            threshold: 0.75,
            min_query_length: 10,
        }
    }
}

/// Context assembly knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Total line budget for an assembled bundle.
    pub budget_lines: u32,
    /// Coupling expansion depth; 0 disables expansion.
    pub depth: u32,
    /// Coupled files pulled in per frontier file.
    pub max_coupled_per_seed: usize,
    pub content_mode: ContentMode,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            budget_lines: 400,
            depth: 1,
            max_coupled_per_seed: 3,
            content_mode: ContentMode::Full,
        }
    }
}

/// Temporal coupling graph construction and traversal knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CouplingConfig {
    /// Minimum normalized score for an edge to be kept.
    pub threshold: f32,
    /// Minimum co-change count for an edge to be considered at all.
    pub min_co_changes: u32,
    /// Score multiplier per hop beyond the first during expansion.
    pub hop_decay: f32,
    /// Commits touching more files than this are skipped as bulk changes.
    pub max_files_per_commit: usize,
}

impl Default for CouplingConfig {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            min_co_changes: 3,
            hop_decay: 0.5,
            max_files_per_commit: 50,
        }
    }
}

impl RetrievalConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("parsing config from {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects out-of-range knobs so later stages never have to.
    pub fn validate(&self) -> anyhow::Result<()> {
        let r = &self.ranking;
        if !(0.0..=1.0).contains(&r.semantic_weight) {
            bail!("ranking.semantic_weight must be in [0, 1], got {}", r.semantic_weight);
        }
        if r.rrf_k <= 0.0 {
            bail!("ranking.rrf_k must be positive, got {}", r.rrf_k);
        }
        if !(0.0..=1.0).contains(&r.doc_demotion) || r.doc_demotion == 0.0 {
            bail!("ranking.doc_demotion must be in (0, 1], got {}", r.doc_demotion);
        }
        if r.recency_half_life_days <= 0.0 {
            bail!(
                "ranking.recency_half_life_days must be positive, got {}",
                r.recency_half_life_days
            );
        }
        if !(0.0..=1.0).contains(&r.recency_weight) {
            bail!("ranking.recency_weight must be in [0, 1], got {}", r.recency_weight);
        }
        if r.search_limit == 0 {
            bail!("ranking.search_limit must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.gate.threshold) {
            bail!("gate.threshold must be in [0, 1], got {}", self.gate.threshold);
        }
        if self.assembly.budget_lines == 0 {
            bail!("assembly.budget_lines must be at least 1");
        }
        if self.assembly.depth > MAX_EXPANSION_DEPTH {
            bail!(
                "assembly.depth must be at most {}, got {}",
                MAX_EXPANSION_DEPTH,
                self.assembly.depth
            );
        }
        let c = &self.coupling;
        if !(0.0..=1.0).contains(&c.threshold) {
            bail!("coupling.threshold must be in [0, 1], got {}", c.threshold);
        }
        if !(0.0..=1.0).contains(&c.hop_decay) || c.hop_decay == 0.0 {
            bail!("coupling.hop_decay must be in (0, 1], got {}", c.hop_decay);
        }
        if c.min_co_changes == 0 {
            bail!("coupling.min_co_changes must be at least 1");
        }
        if c.max_files_per_commit == 0 {
            bail!("coupling.max_files_per_commit must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write as _;

    #[test]
    fn defaults_are_valid() {
        let config = RetrievalConfig::default();
        config.validate().unwrap();
        assert_eq!(config.ranking.semantic_weight, 0.7);
        assert_eq!(config.ranking.rrf_k, 60.0);
        assert_eq!(config.gate.threshold, 0.75);
        assert_eq!(config.assembly.budget_lines, 400);
        assert_eq!(config.coupling.min_co_changes, 3);
    }

    #[test]
    fn partial_toml_keeps_section_defaults() {
        let config: RetrievalConfig = toml::from_str(
            r#"
            [ranking]
            semantic_weight = 0.5

            [assembly]
            budget_lines = 200
            "#,
        )
        .unwrap();
        assert_eq!(config.ranking.semantic_weight, 0.5);
        assert_eq!(config.ranking.rrf_k, 60.0);
        assert_eq!(config.assembly.budget_lines, 200);
        assert_eq!(config.assembly.depth, 1);
        assert_eq!(config.gate, GateConfig::default());
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let config: RetrievalConfig = toml::from_str("").unwrap();
        assert_eq!(config, RetrievalConfig::default());
    }

    #[test]
    fn rejects_out_of_range_weight() {
        let mut config = RetrievalConfig::default();
        config.ranking.semantic_weight = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_excessive_depth() {
        let mut config = RetrievalConfig::default();
        config.assembly.depth = MAX_EXPANSION_DEPTH + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_doc_demotion() {
        let mut config = RetrievalConfig::default();
        config.ranking.doc_demotion = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_validates_on_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[gate]\nthreshold = 2.0").unwrap();
        let err = RetrievalConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("gate.threshold"));
    }

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[coupling]\nthreshold = 0.4\nhop_decay = 0.25").unwrap();
        let config = RetrievalConfig::load(file.path()).unwrap();
        assert_eq!(config.coupling.threshold, 0.4);
        assert_eq!(config.coupling.hop_decay, 0.25);
    }
}
