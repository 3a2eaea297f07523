//! Injection gate: decides whether unsolicited context is worth showing.
//!
//! Explicit searches always pass. Unsolicited injection requires a query of
//! useful length and a raw top semantic similarity at or above the
//! threshold. The check runs on the pre-fusion cosine score, not the fused
//! score, so the threshold keeps a stable meaning across ranking config
//! changes.

use log::debug;
use weft_protocol::GateConfig;

pub fn should_inject(
    query: &str,
    top_semantic: Option<f32>,
    config: &GateConfig,
    explicit: bool,
) -> bool {
    if explicit {
        return true;
    }
    let len = query.trim().chars().count();
    if len < config.min_query_length {
        debug!("gate: query too short ({len} chars), skipping injection");
        return false;
    }
    match top_semantic {
        Some(score) if score >= config.threshold => true,
        Some(score) => {
            debug!(
                "gate: top similarity {score:.3} below threshold {:.3}",
                config.threshold
            );
            false
        }
        None => {
            debug!("gate: no semantic hits, skipping injection");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GateConfig {
        GateConfig::default()
    }

    #[test]
    fn explicit_search_bypasses_everything() {
        assert!(should_inject("x", None, &config(), true));
    }

    #[test]
    fn no_hits_never_inject() {
        assert!(!should_inject("a reasonably long query", None, &config(), false));
    }

    #[test]
    fn threshold_is_inclusive() {
        let query = "how does retry backoff work";
        assert!(should_inject(query, Some(0.75), &config(), false));
        assert!(!should_inject(query, Some(0.7499), &config(), false));
    }

    #[test]
    fn short_queries_never_inject() {
        assert!(!should_inject("retry", Some(0.99), &config(), false));
    }

    #[test]
    fn length_check_ignores_surrounding_whitespace() {
        assert!(!should_inject("   retry   ", Some(0.99), &config(), false));
    }
}
