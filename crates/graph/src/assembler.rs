//! Pure context assembly: seeds plus coupled chunks in, bundle out.
//!
//! Assembly never does I/O. The caller fetches chunk content for every
//! candidate up front; this module only orders, deduplicates, and enforces
//! the line budget.

use std::collections::{HashMap, HashSet};

use weft_protocol::{
    AssemblyConfig, BudgetInfo, BundleSummary, Chunk, ContentMode, ContextBundle, ContextChunk,
    ContextFile, FileCategory, FileRelevance, Seed,
};

/// A chunk reached through the coupling graph, with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct CoupledChunk {
    pub chunk: Chunk,
    pub score: f32,
    pub depth: u32,
    /// Seed-side file this chunk's file was reached through.
    pub via: String,
}

struct FileEntry {
    path: String,
    repo: String,
    language: Option<String>,
    relevance: FileRelevance,
    category: FileCategory,
    score: f32,
    coupled_to: Option<String>,
    chunks: Vec<ContextChunk>,
}

/// Builds a budget-constrained bundle from scored candidates.
///
/// Seeds are admitted before any coupled chunk, each group strongest first.
/// A chunk that would overflow the remaining budget is skipped whole, never
/// truncated; budget accounting caps any single chunk at half the total
/// budget so one giant chunk cannot starve the rest. Duplicate chunk ids are
/// admitted once.
pub fn assemble_bundle(
    query: Option<String>,
    mut seeds: Vec<Seed>,
    mut coupled: Vec<CoupledChunk>,
    config: &AssemblyConfig,
) -> ContextBundle {
    seeds.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.chunk.id.cmp(&b.chunk.id))
    });
    coupled.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.chunk.id.cmp(&b.chunk.id))
    });

    let budget = config.budget_lines;
    let chunk_cap = (budget / 2).max(1);
    let mut used_lines = 0u32;
    let mut skipped_chunks = 0u32;
    let mut seen: HashSet<String> = HashSet::new();
    let mut files: Vec<FileEntry> = Vec::new();
    let mut file_index: HashMap<(String, String), usize> = HashMap::new();

    let mut admit = |chunk: &Chunk,
                     score: f32,
                     relevance: FileRelevance,
                     via: Option<&str>,
                     used_lines: &mut u32,
                     skipped_chunks: &mut u32| {
        if !seen.insert(chunk.id.clone()) {
            return;
        }
        let cost = chunk.line_count().min(chunk_cap);
        if *used_lines + cost > budget {
            *skipped_chunks += 1;
            return;
        }
        *used_lines += cost;

        let key = (chunk.repo.clone(), chunk.file_path.clone());
        let idx = match file_index.get(&key) {
            Some(&idx) => idx,
            None => {
                files.push(FileEntry {
                    path: chunk.file_path.clone(),
                    repo: chunk.repo.clone(),
                    language: chunk.language.clone(),
                    relevance,
                    category: chunk.category(),
                    score,
                    coupled_to: via.map(str::to_string),
                    chunks: Vec::new(),
                });
                file_index.insert(key, files.len() - 1);
                files.len() - 1
            }
        };
        let entry = &mut files[idx];
        // A direct hit upgrades a file previously reached via coupling.
        if relevance == FileRelevance::Direct {
            entry.relevance = FileRelevance::Direct;
            entry.coupled_to = None;
        }
        if score > entry.score {
            entry.score = score;
        }
        entry.chunks.push(ContextChunk {
            id: chunk.id.clone(),
            chunk_type: chunk.chunk_type,
            name: chunk.name.clone(),
            start_line: chunk.start_line,
            end_line: chunk.end_line,
            score,
            content: render_content(&chunk.content, config.content_mode),
        });
    };

    for seed in &seeds {
        admit(
            &seed.chunk,
            seed.score,
            FileRelevance::Direct,
            None,
            &mut used_lines,
            &mut skipped_chunks,
        );
    }
    for item in &coupled {
        admit(
            &item.chunk,
            item.score,
            FileRelevance::Coupled { depth: item.depth },
            Some(item.via.as_str()),
            &mut used_lines,
            &mut skipped_chunks,
        );
    }

    for entry in &mut files {
        entry.chunks.sort_by_key(|c| c.start_line);
    }
    files.sort_by(|a, b| {
        relevance_rank(a.relevance)
            .cmp(&relevance_rank(b.relevance))
            .then_with(|| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.path.cmp(&b.path))
    });

    let mut summary = BundleSummary::default();
    for entry in &files {
        summary.total_files += 1;
        summary.total_chunks += entry.chunks.len() as u32;
        match entry.relevance {
            FileRelevance::Direct => summary.direct_files += 1,
            FileRelevance::Coupled { .. } => summary.coupled_files += 1,
        }
        if entry.category.is_demoted() {
            summary.doc_files += 1;
        } else {
            summary.source_files += 1;
        }
    }

    ContextBundle {
        query,
        files: files
            .into_iter()
            .map(|entry| ContextFile {
                path: entry.path,
                repo: entry.repo,
                language: entry.language,
                relevance: entry.relevance,
                category: entry.category,
                score: entry.score,
                coupled_to: entry.coupled_to,
                chunks: entry.chunks,
            })
            .collect(),
        budget: BudgetInfo {
            max_lines: budget,
            used_lines,
            skipped_chunks,
        },
        summary,
    }
}

fn relevance_rank(relevance: FileRelevance) -> u32 {
    match relevance {
        FileRelevance::Direct => 0,
        FileRelevance::Coupled { .. } => 1,
    }
}

fn render_content(content: &str, mode: ContentMode) -> Option<String> {
    match mode {
        ContentMode::Full => Some(content.to_string()),
        ContentMode::Metadata => None,
        ContentMode::Preview => {
            if content.lines().count() <= 3 {
                return Some(content.to_string());
            }
            let head: Vec<&str> = content.lines().take(3).collect();
            Some(format!("{}\n...", head.join("\n")))
        }
    }
}
