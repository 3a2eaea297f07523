//! Petgraph-backed storage and traversal of the coupling graph.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::error::Result;
use crate::types::{CoupledFile, CouplingEdge};

#[derive(Debug, Clone, Copy)]
struct EdgeWeight {
    co_changes: u32,
    score: f32,
    last_co_change: Option<u64>,
}

/// An immutable snapshot of file coupling, safe to share across tasks.
#[derive(Debug)]
pub struct CouplingGraph {
    graph: UnGraph<String, EdgeWeight>,
    nodes: HashMap<String, NodeIndex>,
}

impl Default for CouplingGraph {
    fn default() -> Self {
        Self::from_edges(Vec::new())
    }
}

impl CouplingGraph {
    pub fn from_edges(edges: Vec<CouplingEdge>) -> Self {
        let mut graph = UnGraph::new_undirected();
        let mut nodes: HashMap<String, NodeIndex> = HashMap::new();
        for edge in edges {
            let a = *nodes
                .entry(edge.file_a.clone())
                .or_insert_with(|| graph.add_node(edge.file_a.clone()));
            let b = *nodes
                .entry(edge.file_b.clone())
                .or_insert_with(|| graph.add_node(edge.file_b.clone()));
            graph.add_edge(
                a,
                b,
                EdgeWeight {
                    co_changes: edge.co_changes,
                    score: edge.score,
                    last_co_change: edge.last_co_change,
                },
            );
        }
        Self { graph, nodes }
    }

    pub fn file_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.nodes.contains_key(path)
    }

    /// Direct neighbors of `path` scoring at least `min_score`, strongest
    /// first, at most `limit`.
    pub fn coupled_files(&self, path: &str, min_score: f32, limit: usize) -> Vec<CoupledFile> {
        let Some(&node) = self.nodes.get(path) else {
            return Vec::new();
        };
        let mut out: Vec<CoupledFile> = self
            .graph
            .edges(node)
            .filter(|edge| edge.weight().score >= min_score)
            .map(|edge| {
                let other = if edge.source() == node {
                    edge.target()
                } else {
                    edge.source()
                };
                CoupledFile {
                    path: self.graph[other].clone(),
                    score: edge.weight().score,
                    co_changes: edge.weight().co_changes,
                    depth: 1,
                    via: path.to_string(),
                }
            })
            .collect();
        sort_coupled(&mut out);
        out.truncate(limit);
        out
    }

    /// Breadth-first expansion from `seeds` up to `depth` hops.
    ///
    /// Seeds are pre-marked visited so they are never reported as their own
    /// neighbors. At each hop, every frontier file contributes at most
    /// `max_per_seed` of its strongest unvisited neighbors. The reported
    /// score is the edge score at the hop of discovery multiplied by
    /// `hop_decay` for each hop beyond the first.
    pub fn expand(
        &self,
        seeds: &[String],
        depth: u32,
        max_per_seed: usize,
        min_score: f32,
        hop_decay: f32,
    ) -> Vec<CoupledFile> {
        if depth == 0 || max_per_seed == 0 {
            return Vec::new();
        }
        let mut visited: HashSet<String> = seeds.iter().cloned().collect();
        let mut frontier: Vec<String> = seeds
            .iter()
            .filter(|s| self.nodes.contains_key(*s))
            .cloned()
            .collect();
        let mut out = Vec::new();
        for hop in 1..=depth {
            let decay = hop_decay.powi(hop as i32 - 1);
            let mut next_frontier = Vec::new();
            for file in &frontier {
                let mut neighbors = self.coupled_files(file, min_score, usize::MAX);
                neighbors.retain(|n| !visited.contains(&n.path));
                neighbors.truncate(max_per_seed);
                for neighbor in neighbors {
                    visited.insert(neighbor.path.clone());
                    next_frontier.push(neighbor.path.clone());
                    out.push(CoupledFile {
                        score: neighbor.score * decay,
                        depth: hop,
                        ..neighbor
                    });
                }
            }
            if next_frontier.is_empty() {
                break;
            }
            frontier = next_frontier;
        }
        sort_coupled(&mut out);
        out
    }

    pub fn to_edges(&self) -> Vec<CouplingEdge> {
        self.graph
            .edge_indices()
            .filter_map(|idx| {
                let (a, b) = self.graph.edge_endpoints(idx)?;
                let weight = self.graph[idx];
                Some(CouplingEdge {
                    file_a: self.graph[a].clone(),
                    file_b: self.graph[b].clone(),
                    co_changes: weight.co_changes,
                    score: weight.score,
                    last_co_change: weight.last_co_change,
                })
            })
            .collect()
    }

    /// Persists the edge list as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer(std::io::BufWriter::new(file), &self.to_edges())?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let edges: Vec<CouplingEdge> = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(Self::from_edges(edges))
    }
}

fn sort_coupled(files: &mut [CoupledFile]) {
    files.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.path.cmp(&b.path))
    });
}
