use serde::{Deserialize, Serialize};

/// An undirected coupling edge between two files, with its evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouplingEdge {
    pub file_a: String,
    pub file_b: String,
    /// Commits in which both files changed.
    pub co_changes: u32,
    /// `co_changes / max(churn_a, churn_b)`, in [0, 1].
    pub score: f32,
    /// Unix seconds of the most recent co-change, when commit timestamps
    /// were available during analysis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_co_change: Option<u64>,
}

/// A file reached from a seed during graph traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoupledFile {
    pub path: String,
    /// Edge score with hop decay applied for hops beyond the first.
    pub score: f32,
    pub co_changes: u32,
    /// Hop count from the nearest seed, starting at 1.
    pub depth: u32,
    /// The frontier file this one was reached through.
    pub via: String,
}
