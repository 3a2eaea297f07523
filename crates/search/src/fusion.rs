//! Reciprocal rank fusion with demotion and recency adjustments.
//!
//! The two retrieval signals score on incompatible scales, so fusion works
//! on ranks, not raw scores. Each signal list is sorted descending; a chunk
//! at 1-based rank `r` contributes `weight / (k + r)` and a chunk absent
//! from a list contributes nothing from it. The fused score is then scaled
//! by the documentation demotion and recency factors.

use std::collections::HashMap;

use weft_protocol::{ChunkMeta, MatchType, RankedHit, RankingConfig, SignalHit};

const SECONDS_PER_DAY: f32 = 86_400.0;

/// Fuses two signal lists into one ranked list.
///
/// `meta` supplies per-chunk category and modification time; chunks missing
/// from it are treated as source files of unknown age, which leaves their
/// score unadjusted. `now` is unix seconds.
pub fn fuse(
    semantic: &[SignalHit],
    keyword: &[SignalHit],
    meta: &HashMap<String, ChunkMeta>,
    config: &RankingConfig,
    now: u64,
) -> Vec<RankedHit> {
    let semantic_ranks = rank_by_score(semantic);
    let keyword_ranks = rank_by_score(keyword);
    let semantic_by_id: HashMap<&str, u32> =
        semantic_ranks.iter().map(|(id, r)| (id.as_str(), *r)).collect();
    let keyword_by_id: HashMap<&str, u32> =
        keyword_ranks.iter().map(|(id, r)| (id.as_str(), *r)).collect();

    let mut hits: Vec<RankedHit> = Vec::with_capacity(semantic_ranks.len() + keyword_ranks.len());
    let mut seen: std::collections::HashSet<&str> = std::collections::HashSet::new();

    for (chunk_id, _) in semantic_ranks.iter().chain(keyword_ranks.iter()) {
        let chunk_id = chunk_id.as_str();
        if !seen.insert(chunk_id) {
            continue;
        }
        let semantic_rank = semantic_by_id.get(chunk_id).copied();
        let keyword_rank = keyword_by_id.get(chunk_id).copied();

        let mut score = 0.0f32;
        if let Some(r) = semantic_rank {
            score += config.semantic_weight / (config.rrf_k + r as f32);
        }
        if let Some(r) = keyword_rank {
            score += (1.0 - config.semantic_weight) / (config.rrf_k + r as f32);
        }

        if let Some(m) = meta.get(chunk_id) {
            if m.category.is_demoted() {
                score *= config.doc_demotion;
            }
            score *= recency_factor(m.modified_at, now, config);
        }

        let match_type = match (semantic_rank, keyword_rank) {
            (Some(_), Some(_)) => MatchType::Hybrid,
            (Some(_), None) => MatchType::Semantic,
            _ => MatchType::Keyword,
        };

        hits.push(RankedHit {
            chunk_id: chunk_id.to_string(),
            score,
            semantic_rank,
            keyword_rank,
            match_type,
        });
    }

    sort_hits(&mut hits);
    hits
}

/// 1-based ranks from a stable descending sort of one signal list.
fn rank_by_score(hits: &[SignalHit]) -> Vec<(String, u32)> {
    let mut sorted: Vec<&SignalHit> = hits.iter().collect();
    sorted.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, hit)| (hit.chunk_id.clone(), i as u32 + 1))
        .collect()
}

/// Multiplier in (0, 1] that decays with the chunk's age.
///
/// Age halves the exposed score share every `recency_half_life_days`; the
/// share not exposed to decay (`1 - recency_weight`) is untouchable. An
/// unknown modification time means no penalty.
pub fn recency_factor(modified_at: Option<u64>, now: u64, config: &RankingConfig) -> f32 {
    let Some(modified) = modified_at else {
        return 1.0;
    };
    let age_days = now.saturating_sub(modified) as f32 / SECONDS_PER_DAY;
    let decay = 0.5f32.powf(age_days / config.recency_half_life_days);
    1.0 - config.recency_weight * (1.0 - decay)
}

/// Rescales scores so the top hit is 1.0. No-op for empty or zero-score
/// lists.
pub fn normalize(hits: &mut [RankedHit]) {
    let Some(top) = hits.first().map(|h| h.score) else {
        return;
    };
    if top <= 0.0 {
        return;
    }
    for hit in hits.iter_mut() {
        hit.score /= top;
    }
}

/// Total order: score desc, then semantic rank asc (absent last), then
/// keyword rank asc (absent last), then chunk id asc.
fn sort_hits(hits: &mut [RankedHit]) {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| rank_key(a.semantic_rank).cmp(&rank_key(b.semantic_rank)))
            .then_with(|| rank_key(a.keyword_rank).cmp(&rank_key(b.keyword_rank)))
            .then_with(|| a.chunk_id.cmp(&b.chunk_id))
    });
}

fn rank_key(rank: Option<u32>) -> u32 {
    rank.unwrap_or(u32::MAX)
}
