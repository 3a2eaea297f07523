//! Co-change accumulation over commit history.

use std::collections::HashMap;

use log::debug;
use weft_protocol::CouplingConfig;

use crate::graph::CouplingGraph;
use crate::types::CouplingEdge;

/// Accumulates per-commit file sets and builds a normalized coupling graph.
///
/// File paths are interned once so the pair matrix stores small integer keys
/// instead of owned strings.
#[derive(Debug, Default)]
pub struct CouplingGraphBuilder {
    paths: Vec<String>,
    ids: HashMap<String, u32>,
    /// Commits touching each file.
    churn: Vec<u32>,
    /// Co-change evidence keyed by ordered id pair (low, high).
    pairs: HashMap<(u32, u32), PairStat>,
    commits_seen: u64,
    commits_skipped: u64,
}

#[derive(Debug, Default, Clone, Copy)]
struct PairStat {
    co_changes: u32,
    last_co_change: Option<u64>,
}

impl CouplingGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, path: &str) -> u32 {
        if let Some(&id) = self.ids.get(path) {
            return id;
        }
        let id = self.paths.len() as u32;
        self.paths.push(path.to_string());
        self.ids.insert(path.to_string(), id);
        self.churn.push(0);
        id
    }

    /// Records one commit's changed files.
    ///
    /// Commits touching more than `max_files_per_commit` files are skipped as
    /// bulk changes (renames, vendoring, formatting sweeps) that would flood
    /// the matrix with noise. Duplicate paths within a commit count once.
    pub fn record_commit(&mut self, files: &[String], config: &CouplingConfig) {
        self.record_commit_at(files, None, config);
    }

    /// Like [`record_commit`](Self::record_commit), with the commit's unix
    /// timestamp when the caller has it.
    pub fn record_commit_at(
        &mut self,
        files: &[String],
        timestamp: Option<u64>,
        config: &CouplingConfig,
    ) {
        self.commits_seen += 1;
        if files.len() > config.max_files_per_commit {
            self.commits_skipped += 1;
            debug!(
                "skipping bulk commit with {} files (limit {})",
                files.len(),
                config.max_files_per_commit
            );
            return;
        }
        let mut ids: Vec<u32> = files.iter().map(|f| self.intern(f)).collect();
        ids.sort_unstable();
        ids.dedup();
        for &id in &ids {
            self.churn[id as usize] += 1;
        }
        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                let stat = self.pairs.entry((ids[i], ids[j])).or_default();
                stat.co_changes += 1;
                stat.last_co_change = stat.last_co_change.max(timestamp);
            }
        }
    }

    /// Number of commits recorded so far, including skipped bulk commits.
    pub fn commits_seen(&self) -> u64 {
        self.commits_seen
    }

    /// Normalizes the accumulated evidence into a graph.
    ///
    /// Edge score is `co_changes / max(churn_a, churn_b)`: symmetric in the
    /// pair and insensitive to one file churning on its own. Pairs below
    /// `min_co_changes` or below the score threshold are dropped.
    pub fn build(&self, config: &CouplingConfig) -> CouplingGraph {
        let mut edges = Vec::new();
        for (&(a, b), stat) in &self.pairs {
            if stat.co_changes < config.min_co_changes {
                continue;
            }
            let denom = self.churn[a as usize].max(self.churn[b as usize]);
            if denom == 0 {
                continue;
            }
            let score = stat.co_changes as f32 / denom as f32;
            if score < config.threshold {
                continue;
            }
            edges.push(CouplingEdge {
                file_a: self.paths[a as usize].clone(),
                file_b: self.paths[b as usize].clone(),
                co_changes: stat.co_changes,
                score,
                last_co_change: stat.last_co_change,
            });
        }
        debug!(
            "built coupling graph: {} edges from {} commits ({} skipped as bulk)",
            edges.len(),
            self.commits_seen,
            self.commits_skipped
        );
        CouplingGraph::from_edges(edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn commit(files: &[&str]) -> Vec<String> {
        files.iter().map(|f| f.to_string()).collect()
    }

    fn config() -> CouplingConfig {
        CouplingConfig {
            threshold: 0.0,
            min_co_changes: 1,
            ..CouplingConfig::default()
        }
    }

    #[test]
    fn score_is_co_changes_over_max_churn() {
        let mut builder = CouplingGraphBuilder::new();
        // a churns 4 times, b twice, together twice.
        builder.record_commit(&commit(&["a.rs", "b.rs"]), &config());
        builder.record_commit(&commit(&["a.rs", "b.rs"]), &config());
        builder.record_commit(&commit(&["a.rs"]), &config());
        builder.record_commit(&commit(&["a.rs"]), &config());
        let graph = builder.build(&config());
        let coupled = graph.coupled_files("b.rs", 0.0, 10);
        assert_eq!(coupled.len(), 1);
        assert_eq!(coupled[0].path, "a.rs");
        assert_eq!(coupled[0].co_changes, 2);
        assert!((coupled[0].score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn min_co_changes_drops_weak_pairs() {
        let mut builder = CouplingGraphBuilder::new();
        builder.record_commit(&commit(&["a.rs", "b.rs"]), &config());
        let cfg = CouplingConfig {
            min_co_changes: 2,
            threshold: 0.0,
            ..CouplingConfig::default()
        };
        let graph = builder.build(&cfg);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn threshold_drops_low_scores() {
        let mut builder = CouplingGraphBuilder::new();
        builder.record_commit(&commit(&["a.rs", "b.rs"]), &config());
        for _ in 0..9 {
            builder.record_commit(&commit(&["a.rs"]), &config());
        }
        // score = 1/10 = 0.1
        let cfg = CouplingConfig {
            min_co_changes: 1,
            threshold: 0.3,
            ..CouplingConfig::default()
        };
        assert_eq!(builder.build(&cfg).edge_count(), 0);
    }

    #[test]
    fn bulk_commits_are_skipped() {
        let mut builder = CouplingGraphBuilder::new();
        let cfg = CouplingConfig {
            max_files_per_commit: 3,
            min_co_changes: 1,
            threshold: 0.0,
            ..CouplingConfig::default()
        };
        builder.record_commit(&commit(&["a.rs", "b.rs", "c.rs", "d.rs"]), &cfg);
        let graph = builder.build(&cfg);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.file_count(), 0);
    }

    #[test]
    fn duplicate_paths_in_a_commit_count_once() {
        let mut builder = CouplingGraphBuilder::new();
        builder.record_commit(&commit(&["a.rs", "a.rs", "b.rs"]), &config());
        let graph = builder.build(&config());
        let coupled = graph.coupled_files("a.rs", 0.0, 10);
        assert_eq!(coupled[0].co_changes, 1);
        assert!((coupled[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn last_co_change_tracks_newest_commit() {
        let mut builder = CouplingGraphBuilder::new();
        builder.record_commit_at(&commit(&["a.rs", "b.rs"]), Some(100), &config());
        builder.record_commit_at(&commit(&["a.rs", "b.rs"]), Some(300), &config());
        builder.record_commit_at(&commit(&["a.rs", "b.rs"]), None, &config());
        let graph = builder.build(&config());
        assert_eq!(graph.to_edges()[0].last_co_change, Some(300));
    }

    #[test]
    fn symmetric_scores() {
        let mut builder = CouplingGraphBuilder::new();
        builder.record_commit(&commit(&["a.rs", "b.rs"]), &config());
        builder.record_commit(&commit(&["b.rs"]), &config());
        let graph = builder.build(&config());
        let from_a = graph.coupled_files("a.rs", 0.0, 10);
        let from_b = graph.coupled_files("b.rs", 0.0, 10);
        assert_eq!(from_a[0].score, from_b[0].score);
    }
}
