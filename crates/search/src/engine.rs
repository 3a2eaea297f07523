//! Async orchestration of the retrieval pipeline.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use log::{debug, warn};
use tokio::sync::RwLock;

use weft_access::{resolve_role, AccessConfig, RoleFilter};
use weft_graph::{assemble_bundle, CoupledChunk, CouplingGraph};
use weft_protocol::{
    Chunk, ChunkMeta, ContextBundle, DiffFile, DiffStatus, RetrievalConfig, Seed, SeedSource,
    SignalHit,
};

use crate::error::{Result, SearchError};
use crate::{fusion, gate, preprocess, review};

/// Embedding-based retrieval over indexed chunks. Scores are cosine
/// similarities.
#[async_trait]
pub trait SemanticIndex: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> anyhow::Result<Vec<SignalHit>>;
}

/// Lexical retrieval over indexed chunks. Scores are on the index's own
/// scale; fusion only uses their order.
#[async_trait]
pub trait KeywordIndex: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> anyhow::Result<Vec<SignalHit>>;
}

/// Chunk content and metadata lookup.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    async fn get_chunks(&self, ids: &[String]) -> anyhow::Result<Vec<Chunk>>;
    async fn chunks_in_file(&self, path: &str) -> anyhow::Result<Vec<Chunk>>;
}

/// The retrieval pipeline: preprocess, fan out, gate, fuse, expand,
/// assemble, filter.
///
/// The coupling graph lives behind a read/write lock holding an `Arc`
/// snapshot. Searches clone the `Arc` and keep ranking against their
/// snapshot even while a re-analysis installs a new one.
pub struct ContextEngine {
    semantic: Arc<dyn SemanticIndex>,
    keyword: Arc<dyn KeywordIndex>,
    store: Arc<dyn ChunkStore>,
    access: AccessConfig,
    config: RetrievalConfig,
    coupling: RwLock<Arc<CouplingGraph>>,
}

impl ContextEngine {
    pub fn new(
        semantic: Arc<dyn SemanticIndex>,
        keyword: Arc<dyn KeywordIndex>,
        store: Arc<dyn ChunkStore>,
        config: RetrievalConfig,
        access: AccessConfig,
    ) -> Self {
        Self {
            semantic,
            keyword,
            store,
            access,
            config,
            coupling: RwLock::new(Arc::new(CouplingGraph::default())),
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Atomically replaces the coupling graph snapshot.
    pub async fn install_coupling_graph(&self, graph: CouplingGraph) {
        let mut slot = self.coupling.write().await;
        *slot = Arc::new(graph);
        debug!(
            "installed coupling graph: {} files, {} edges",
            slot.file_count(),
            slot.edge_count()
        );
    }

    /// Runs the full pipeline for a query with the engine's own config.
    pub async fn search(
        &self,
        query: &str,
        role: Option<&str>,
        explicit: bool,
    ) -> Result<Option<ContextBundle>> {
        self.search_with(query, role, explicit, &self.config).await
    }

    /// Runs the full pipeline for a query under a caller-supplied config,
    /// so per-request overrides and calibration sweeps need no engine
    /// rebuild. The config is assumed validated.
    ///
    /// Returns `Ok(None)` when the injection gate declines; explicit
    /// searches bypass the gate. A failed retrieval signal degrades to an
    /// empty list rather than failing the search, so one unavailable index
    /// leaves the other signal working. Role visibility is enforced after
    /// assembly: hidden repositories may win budget that is then released,
    /// the price of keeping one unified index and unchanged relevance
    /// ordering among visible results.
    pub async fn search_with(
        &self,
        query: &str,
        role: Option<&str>,
        explicit: bool,
        config: &RetrievalConfig,
    ) -> Result<Option<ContextBundle>> {
        let prepared = preprocess::prepare(query);
        debug!(
            "searching: semantic={:?} keyword={:?}",
            prepared.semantic, prepared.keyword
        );
        let limit = config.ranking.search_limit;
        let (semantic, keyword) = tokio::join!(
            self.semantic.search(&prepared.semantic, limit),
            self.keyword.search(&prepared.keyword, limit),
        );
        let semantic = degrade("semantic index", semantic);
        let keyword = degrade("keyword index", keyword);

        let top_semantic = semantic
            .iter()
            .map(|h| h.score)
            .fold(None, |top: Option<f32>, s| {
                Some(top.map_or(s, |t| t.max(s)))
            });
        if !gate::should_inject(query, top_semantic, &config.gate, explicit) {
            return Ok(None);
        }

        let mut ids: Vec<String> = semantic
            .iter()
            .chain(keyword.iter())
            .map(|h| h.chunk_id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        let chunks = self
            .store
            .get_chunks(&ids)
            .await
            .map_err(|source| SearchError::Collaborator {
                name: "chunk store",
                source,
            })?;
        let meta: HashMap<String, ChunkMeta> = chunks
            .iter()
            .map(|c| {
                (
                    c.id.clone(),
                    ChunkMeta {
                        category: c.category(),
                        modified_at: c.modified_at,
                    },
                )
            })
            .collect();
        let mut by_id: HashMap<String, Chunk> =
            chunks.into_iter().map(|c| (c.id.clone(), c)).collect();

        let mut fused = fusion::fuse(&semantic, &keyword, &meta, &config.ranking, unix_now());
        fused.truncate(limit);
        fusion::normalize(&mut fused);

        let filter = RoleFilter::for_role(&self.access, &resolve_role(role))?;
        let seeds: Vec<Seed> = fused
            .into_iter()
            .filter_map(|hit| {
                let chunk = by_id.remove(&hit.chunk_id)?;
                Some(Seed {
                    chunk,
                    score: hit.score,
                    source: SeedSource::Search {
                        match_type: hit.match_type,
                    },
                })
            })
            .collect();

        if seeds.is_empty() {
            if !explicit {
                return Ok(None);
            }
            let mut bundle = ContextBundle::empty(config.assembly.budget_lines);
            bundle.query = Some(query.to_string());
            bundle.summary.top_semantic_score = top_semantic;
            return Ok(Some(bundle));
        }

        let coupled = self.expand_coupling(&seeds, config).await;
        let mut bundle = assemble_bundle(
            Some(query.to_string()),
            seeds,
            coupled,
            &config.assembly,
        );
        filter.filter_bundle(&mut bundle);
        bundle.summary.top_semantic_score = top_semantic;
        Ok(Some(bundle))
    }

    /// Assembles context around a diff instead of a query. The injection
    /// gate does not apply; review context is always explicit.
    pub async fn assemble_for_diff(
        &self,
        diffs: &[DiffFile],
        role: Option<&str>,
    ) -> Result<ContextBundle> {
        let filter = RoleFilter::for_role(&self.access, &resolve_role(role))?;
        let mut chunks: Vec<Chunk> = Vec::new();
        for diff in diffs {
            if diff.status == DiffStatus::Deleted {
                continue;
            }
            match self.store.chunks_in_file(&diff.path).await {
                Ok(file_chunks) => chunks.extend(file_chunks),
                Err(err) => warn!("chunk store failed for {}: {err:#}", diff.path),
            }
        }
        let seeds = review::map_diff_to_chunks(diffs, &chunks);
        let coupled = self.expand_coupling(&seeds, &self.config).await;
        let mut bundle = assemble_bundle(None, seeds, coupled, &self.config.assembly);
        filter.filter_bundle(&mut bundle);
        Ok(bundle)
    }

    /// Walks the coupling graph from the seed files and fetches chunks for
    /// every reachable file. Lookup failures degrade to skipping the file.
    async fn expand_coupling(&self, seeds: &[Seed], config: &RetrievalConfig) -> Vec<CoupledChunk> {
        let depth = config.assembly.depth;
        if depth == 0 || seeds.is_empty() {
            return Vec::new();
        }
        let graph = self.coupling.read().await.clone();
        let mut seed_files: Vec<String> =
            seeds.iter().map(|s| s.chunk.file_path.clone()).collect();
        seed_files.sort();
        seed_files.dedup();
        let coupled_files = graph.expand(
            &seed_files,
            depth,
            config.assembly.max_coupled_per_seed,
            config.coupling.threshold,
            config.coupling.hop_decay,
        );

        let mut out = Vec::new();
        for file in coupled_files {
            match self.store.chunks_in_file(&file.path).await {
                Ok(chunks) => {
                    for chunk in chunks {
                        out.push(CoupledChunk {
                            chunk,
                            score: file.score,
                            depth: file.depth,
                            via: file.via.clone(),
                        });
                    }
                }
                Err(err) => {
                    warn!("chunk store failed for coupled file {}: {err:#}", file.path);
                }
            }
        }
        out
    }
}

fn degrade(name: &str, result: anyhow::Result<Vec<SignalHit>>) -> Vec<SignalHit> {
    match result {
        Ok(hits) => hits,
        Err(err) => {
            warn!("{name} unavailable, degrading to empty results: {err:#}");
            Vec::new()
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
