//! Diff-to-seed mapping for review-style context assembly.

use std::collections::HashMap;

use weft_protocol::{Chunk, DiffFile, DiffStatus, Seed, SeedSource};

/// Scores chunks by how much of them a diff touches.
///
/// A chunk's score is the fraction of its lines that appear in the diff's
/// added-line set for that file, so a fully rewritten helper outranks a
/// function with one edited line. Deleted files have no new-side content and
/// are skipped. Seeds come back strongest first.
pub fn map_diff_to_chunks(diffs: &[DiffFile], chunks: &[Chunk]) -> Vec<Seed> {
    let mut by_file: HashMap<&str, Vec<&Chunk>> = HashMap::new();
    for chunk in chunks {
        by_file.entry(chunk.file_path.as_str()).or_default().push(chunk);
    }

    let mut seeds = Vec::new();
    for diff in diffs {
        if diff.status == DiffStatus::Deleted {
            continue;
        }
        let Some(file_chunks) = by_file.get(diff.path.as_str()) else {
            continue;
        };
        for chunk in file_chunks {
            let overlap = diff
                .added_lines
                .iter()
                .filter(|&&line| line >= chunk.start_line && line <= chunk.end_line)
                .count() as u32;
            if overlap == 0 {
                continue;
            }
            let score = overlap as f32 / chunk.line_count() as f32;
            seeds.push(Seed {
                chunk: (*chunk).clone(),
                score,
                source: SeedSource::Diff {
                    status: diff.status,
                },
            });
        }
    }
    seeds.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.chunk.id.cmp(&b.chunk.id))
    });
    seeds
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use weft_protocol::ChunkType;

    fn chunk(id: &str, path: &str, start: u32, end: u32) -> Chunk {
        Chunk {
            id: id.to_string(),
            repo: "demo".to_string(),
            file_path: path.to_string(),
            chunk_type: ChunkType::Function,
            name: None,
            start_line: start,
            end_line: end,
            content: String::new(),
            language: None,
            modified_at: None,
        }
    }

    fn diff(path: &str, status: DiffStatus, added: &[u32]) -> DiffFile {
        DiffFile {
            path: path.to_string(),
            status,
            added_lines: added.to_vec(),
        }
    }

    #[test]
    fn score_is_fraction_of_chunk_touched() {
        let chunks = vec![chunk("a", "f.rs", 1, 10), chunk("b", "f.rs", 11, 20)];
        let diffs = vec![diff("f.rs", DiffStatus::Modified, &[1, 2, 3, 4, 5, 11])];
        let seeds = map_diff_to_chunks(&diffs, &chunks);
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].chunk.id, "a");
        assert!((seeds[0].score - 0.5).abs() < 1e-6);
        assert!((seeds[1].score - 0.1).abs() < 1e-6);
    }

    #[test]
    fn untouched_chunks_are_excluded() {
        let chunks = vec![chunk("a", "f.rs", 1, 10)];
        let diffs = vec![diff("f.rs", DiffStatus::Modified, &[50])];
        assert!(map_diff_to_chunks(&diffs, &chunks).is_empty());
    }

    #[test]
    fn deleted_files_are_skipped() {
        let chunks = vec![chunk("a", "gone.rs", 1, 10)];
        let diffs = vec![diff("gone.rs", DiffStatus::Deleted, &[1, 2])];
        assert!(map_diff_to_chunks(&diffs, &chunks).is_empty());
    }

    #[test]
    fn seed_source_records_diff_status() {
        let chunks = vec![chunk("a", "new.rs", 1, 4)];
        let diffs = vec![diff("new.rs", DiffStatus::Added, &[1, 2, 3, 4])];
        let seeds = map_diff_to_chunks(&diffs, &chunks);
        assert_eq!(
            seeds[0].source,
            SeedSource::Diff {
                status: DiffStatus::Added
            }
        );
        assert!((seeds[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn files_without_chunks_contribute_nothing() {
        let diffs = vec![diff("unknown.rs", DiffStatus::Modified, &[1])];
        assert!(map_diff_to_chunks(&diffs, &[]).is_empty());
    }
}
