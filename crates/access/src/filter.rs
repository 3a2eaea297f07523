//! Compiled role filter applied to hits and assembled bundles.

use globset::{Glob, GlobSet, GlobSetBuilder};
use log::debug;
use weft_protocol::ContextBundle;

use crate::config::AccessConfig;
use crate::error::{AccessError, Result};

/// A role's compiled visibility rules over repository names.
///
/// Deny wins over allow. An absent allow set means every repository not
/// denied is visible.
#[derive(Debug)]
pub struct RoleFilter {
    allowed: Option<GlobSet>,
    denied: Option<GlobSet>,
}

impl RoleFilter {
    /// A filter with no restrictions.
    pub fn allow_all() -> Self {
        Self {
            allowed: None,
            denied: None,
        }
    }

    /// Compiles the filter for `role` from `config`.
    ///
    /// Matching role entries of equal specificity are merged by unioning
    /// their allow and deny lists. A role with no matching entries (and no
    /// `default` entry) gets an unrestricted filter.
    pub fn for_role(config: &AccessConfig, role: &str) -> Result<Self> {
        let matched = config.matching_roles(role);
        if matched.is_empty() {
            return Ok(Self::allow_all());
        }
        let mut allow: Vec<&str> = Vec::new();
        let mut deny: Vec<&str> = Vec::new();
        for entry in matched {
            allow.extend(entry.allow.iter().map(String::as_str));
            deny.extend(entry.deny.iter().map(String::as_str));
        }
        Ok(Self {
            allowed: compile(role, &allow)?,
            denied: compile(role, &deny)?,
        })
    }

    pub fn is_allowed(&self, repo: &str) -> bool {
        if let Some(denied) = &self.denied {
            if denied.is_match(repo) {
                return false;
            }
        }
        match &self.allowed {
            Some(allowed) => allowed.is_match(repo),
            None => true,
        }
    }

    /// Removes files from repositories this role may not see.
    ///
    /// Budget accounting stays truthful: the lines the hidden files were
    /// charged are subtracted from `used_lines`, and summary counters are
    /// recomputed. Survivor order is untouched. Applying the same filter
    /// twice is a no-op.
    pub fn filter_bundle(&self, bundle: &mut ContextBundle) {
        let chunk_cap = (bundle.budget.max_lines / 2).max(1);
        let before = bundle.files.len();
        let mut removed_lines = 0u32;
        bundle.files.retain(|file| {
            if self.is_allowed(&file.repo) {
                return true;
            }
            for chunk in &file.chunks {
                let lines = chunk.end_line.saturating_sub(chunk.start_line) + 1;
                removed_lines += lines.min(chunk_cap);
            }
            false
        });
        if bundle.files.len() == before {
            return;
        }
        debug!(
            "role filter hid {} file(s), {} budgeted line(s)",
            before - bundle.files.len(),
            removed_lines
        );
        bundle.budget.used_lines = bundle.budget.used_lines.saturating_sub(removed_lines);

        let summary = &mut bundle.summary;
        summary.total_files = 0;
        summary.total_chunks = 0;
        summary.direct_files = 0;
        summary.coupled_files = 0;
        summary.source_files = 0;
        summary.doc_files = 0;
        for file in &bundle.files {
            summary.total_files += 1;
            summary.total_chunks += file.chunks.len() as u32;
            match file.relevance {
                weft_protocol::FileRelevance::Direct => summary.direct_files += 1,
                weft_protocol::FileRelevance::Coupled { .. } => summary.coupled_files += 1,
            }
            if file.category.is_demoted() {
                summary.doc_files += 1;
            } else {
                summary.source_files += 1;
            }
        }
    }
}

fn compile(role: &str, patterns: &[&str]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| AccessError::InvalidPattern {
            role: role.to_string(),
            pattern: pattern.to_string(),
            source,
        })?;
        builder.add(glob);
    }
    let set = builder.build().map_err(|source| AccessError::InvalidPattern {
        role: role.to_string(),
        pattern: patterns.join(","),
        source,
    })?;
    Ok(Some(set))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use weft_protocol::{
        BudgetInfo, BundleSummary, ChunkType, ContextChunk, ContextFile, FileCategory,
        FileRelevance,
    };

    fn config(toml_src: &str) -> AccessConfig {
        toml::from_str(toml_src).unwrap()
    }

    #[test]
    fn allow_all_permits_everything() {
        let filter = RoleFilter::allow_all();
        assert!(filter.is_allowed("anything"));
    }

    #[test]
    fn allow_list_restricts() {
        let cfg = config(
            r#"
            [roles.backend]
            allow = ["core-*", "shared"]
            "#,
        );
        let filter = RoleFilter::for_role(&cfg, "backend").unwrap();
        assert!(filter.is_allowed("core-api"));
        assert!(filter.is_allowed("shared"));
        assert!(!filter.is_allowed("frontend"));
    }

    #[test]
    fn deny_wins_over_allow() {
        let cfg = config(
            r#"
            [roles.backend]
            allow = ["core-*"]
            deny = ["core-secrets"]
            "#,
        );
        let filter = RoleFilter::for_role(&cfg, "backend").unwrap();
        assert!(filter.is_allowed("core-api"));
        assert!(!filter.is_allowed("core-secrets"));
    }

    #[test]
    fn deny_only_role_allows_the_rest() {
        let cfg = config(
            r#"
            [roles.default]
            deny = ["internal-*"]
            "#,
        );
        let filter = RoleFilter::for_role(&cfg, "default").unwrap();
        assert!(filter.is_allowed("public"));
        assert!(!filter.is_allowed("internal-billing"));
    }

    #[test]
    fn unknown_role_without_default_allows_all() {
        let cfg = config(
            r#"
            [roles.backend]
            allow = ["core-*"]
            "#,
        );
        let filter = RoleFilter::for_role(&cfg, "nobody").unwrap();
        assert!(filter.is_allowed("frontend"));
    }

    #[test]
    fn invalid_pattern_is_reported_with_role() {
        let cfg = config(
            r#"
            [roles.broken]
            allow = ["[unclosed"]
            "#,
        );
        let err = RoleFilter::for_role(&cfg, "broken").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("broken"));
        assert!(msg.contains("[unclosed"));
    }

    fn bundle_with(files: Vec<ContextFile>, used_lines: u32) -> ContextBundle {
        let mut summary = BundleSummary::default();
        for file in &files {
            summary.total_files += 1;
            summary.total_chunks += file.chunks.len() as u32;
            match file.relevance {
                FileRelevance::Direct => summary.direct_files += 1,
                FileRelevance::Coupled { .. } => summary.coupled_files += 1,
            }
            if file.category.is_demoted() {
                summary.doc_files += 1;
            } else {
                summary.source_files += 1;
            }
        }
        ContextBundle {
            query: None,
            files,
            budget: BudgetInfo {
                max_lines: 400,
                used_lines,
                skipped_chunks: 0,
            },
            summary,
        }
    }

    fn file(repo: &str, path: &str, lines: u32) -> ContextFile {
        ContextFile {
            path: path.to_string(),
            repo: repo.to_string(),
            language: None,
            relevance: FileRelevance::Direct,
            category: FileCategory::Source,
            score: 0.5,
            coupled_to: None,
            chunks: vec![ContextChunk {
                id: format!("{repo}:{path}:1"),
                chunk_type: ChunkType::Function,
                name: None,
                start_line: 1,
                end_line: lines,
                score: 0.5,
                content: None,
            }],
        }
    }

    #[test]
    fn filter_bundle_subtracts_hidden_lines() {
        let cfg = config(
            r#"
            [roles.backend]
            deny = ["secret"]
            "#,
        );
        let filter = RoleFilter::for_role(&cfg, "backend").unwrap();
        let mut bundle = bundle_with(
            vec![file("public", "a.rs", 30), file("secret", "b.rs", 20)],
            50,
        );
        filter.filter_bundle(&mut bundle);
        assert_eq!(bundle.files.len(), 1);
        assert_eq!(bundle.files[0].repo, "public");
        assert_eq!(bundle.budget.used_lines, 30);
        assert_eq!(bundle.summary.total_files, 1);
        assert_eq!(bundle.summary.total_chunks, 1);
    }

    #[test]
    fn filter_bundle_is_idempotent() {
        let cfg = config(
            r#"
            [roles.backend]
            deny = ["secret"]
            "#,
        );
        let filter = RoleFilter::for_role(&cfg, "backend").unwrap();
        let mut bundle = bundle_with(
            vec![file("public", "a.rs", 30), file("secret", "b.rs", 20)],
            50,
        );
        filter.filter_bundle(&mut bundle);
        let once = bundle.clone();
        filter.filter_bundle(&mut bundle);
        assert_eq!(bundle, once);
    }

    #[test]
    fn filter_bundle_caps_subtraction_at_half_budget() {
        let cfg = config(
            r#"
            [roles.backend]
            deny = ["secret"]
            "#,
        );
        let filter = RoleFilter::for_role(&cfg, "backend").unwrap();
        // A 300-line chunk was only charged 200 (half of 400).
        let mut bundle = bundle_with(vec![file("secret", "big.rs", 300)], 200);
        filter.filter_bundle(&mut bundle);
        assert_eq!(bundle.budget.used_lines, 0);
    }
}
