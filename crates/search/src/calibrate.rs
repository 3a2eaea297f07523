//! Offline ranking calibration over captured signal lists.
//!
//! Captured semantic/keyword results are replayed through [`fusion::fuse`]
//! under each candidate config, so a weights sweep needs no live indexes
//! and no process restart.

use std::collections::HashMap;

use weft_protocol::{ChunkMeta, RankingConfig, SignalHit};

use crate::fusion;

/// One captured query with its known-relevant chunk ids.
#[derive(Debug, Clone)]
pub struct LabeledQuery {
    pub semantic: Vec<SignalHit>,
    pub keyword: Vec<SignalHit>,
    pub expected: Vec<String>,
}

/// Retrieval quality of one config over the query set.
#[derive(Debug, Clone)]
pub struct SweepPoint {
    pub config: RankingConfig,
    /// Mean reciprocal rank of the first relevant hit.
    pub mrr: f64,
    /// Fraction of queries with a relevant hit in the top `k`.
    pub hit_rate: f64,
}

/// Evaluates each config against every labeled query.
///
/// Results come back best MRR first. Queries with no expected ids are
/// ignored; an empty query set yields an empty sweep.
pub fn sweep(
    queries: &[LabeledQuery],
    configs: &[RankingConfig],
    meta: &HashMap<String, ChunkMeta>,
    now: u64,
    k: usize,
) -> Vec<SweepPoint> {
    let scored: Vec<&LabeledQuery> = queries.iter().filter(|q| !q.expected.is_empty()).collect();
    if scored.is_empty() {
        return Vec::new();
    }
    let mut points: Vec<SweepPoint> = configs
        .iter()
        .map(|config| {
            let mut reciprocal_sum = 0.0f64;
            let mut hits = 0usize;
            for query in &scored {
                let fused = fusion::fuse(&query.semantic, &query.keyword, meta, config, now);
                let first_relevant = fused
                    .iter()
                    .position(|hit| query.expected.iter().any(|id| *id == hit.chunk_id));
                if let Some(pos) = first_relevant {
                    reciprocal_sum += 1.0 / (pos as f64 + 1.0);
                    if pos < k {
                        hits += 1;
                    }
                }
            }
            SweepPoint {
                config: config.clone(),
                mrr: reciprocal_sum / scored.len() as f64,
                hit_rate: hits as f64 / scored.len() as f64,
            }
        })
        .collect();
    points.sort_by(|a, b| b.mrr.partial_cmp(&a.mrr).unwrap_or(std::cmp::Ordering::Equal));
    points
}
