//! Subgraph extraction around seed drugs.
//!
//! For every seed present in the graph, neighbors are ranked by edge weight
//! (descending, ties keep adjacency order) and the top `k` are kept. The result
//! is the subgraph induced by the seeds plus their kept neighbors: every graph
//! edge with both endpoints in that node set, not only the ranking edges.

use crate::{DrugId, Edge, Graph, Node};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const DEFAULT_TOP_K: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Neighbors kept per seed.
    pub top_k: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Induced view of a graph, scoped to one query.
///
/// Only built by [`query_subgraph`]: `nodes` is always sorted by name, which
/// the lookups below and the layout engine rely on.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Subgraph {
    /// Nodes in name order.
    pub(crate) nodes: Vec<Node>,
    /// Edges in graph (discovery) order.
    pub(crate) edges: Vec<Edge>,
    /// Seeds found in the graph, deduplicated, in request order.
    pub(crate) seeds: Vec<String>,
    /// Seeds not found in the graph, deduplicated, in request order.
    pub(crate) unknown_seeds: Vec<String>,
}

impl Subgraph {
    /// The empty result returned when no seed resolves.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn seeds(&self) -> &[String] {
        &self.seeds
    }

    pub fn unknown_seeds(&self) -> &[String] {
        &self.unknown_seeds
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains(&self, drug: &str) -> bool {
        self.nodes
            .binary_search_by(|n| n.drug.as_str().cmp(drug))
            .is_ok()
    }

    pub fn is_seed(&self, drug: &str) -> bool {
        self.seeds.iter().any(|s| s == drug)
    }

    /// Position of a drug in `nodes`.
    pub fn index_of(&self, drug: &str) -> Option<usize> {
        self.nodes
            .binary_search_by(|n| n.drug.as_str().cmp(drug))
            .ok()
    }
}

/// Top `k` neighbors of `drug` by edge weight.
///
/// Returns an empty list for drugs not in the graph.
pub fn rank_neighbors<'g>(graph: &'g Graph, drug: &str, k: usize) -> Vec<(&'g str, u64)> {
    match graph.drug_id(drug) {
        Some(id) => top_neighbor_ids(graph, id, k)
            .into_iter()
            .map(|(neighbor, weight)| (graph.node_by_id(neighbor).drug.as_str(), weight))
            .collect(),
        None => Vec::new(),
    }
}

fn top_neighbor_ids(graph: &Graph, id: DrugId, k: usize) -> Vec<(DrugId, u64)> {
    let mut ranked: Vec<(DrugId, u64)> = graph
        .adjacent(id)
        .iter()
        .map(|&(neighbor, idx)| (neighbor, graph.edge_by_index(idx).weight))
        .collect();
    // Stable sort: equal weights keep adjacency order.
    ranked.sort_by(|x, y| y.1.cmp(&x.1));
    ranked.truncate(k);
    ranked
}

/// Extract the bounded induced subgraph around `seeds`.
///
/// Unknown seeds are skipped and reported in `Subgraph::unknown_seeds`; when
/// no seed resolves the empty sentinel comes back.
pub fn query_subgraph<S: AsRef<str>>(graph: &Graph, seeds: &[S], k: usize) -> Subgraph {
    let mut present: Vec<String> = Vec::new();
    let mut unknown: Vec<String> = Vec::new();
    let mut members: BTreeSet<DrugId> = BTreeSet::new();

    for seed in seeds {
        let seed = seed.as_ref();
        match graph.drug_id(seed) {
            Some(id) => {
                if present.iter().any(|s| s == seed) {
                    continue;
                }
                present.push(seed.to_string());
                members.insert(id);
                members.extend(top_neighbor_ids(graph, id, k).into_iter().map(|(n, _)| n));
            }
            None => {
                tracing::warn!(seed, "seed drug not found in graph");
                if !unknown.iter().any(|s| s == seed) {
                    unknown.push(seed.to_string());
                }
            }
        }
    }

    if members.is_empty() {
        tracing::info!(requested = seeds.len(), "no seeds resolved, returning empty subgraph");
        return Subgraph {
            unknown_seeds: unknown,
            ..Subgraph::empty()
        };
    }

    let mut edge_indices: Vec<u32> = Vec::new();
    for &id in &members {
        for &(neighbor, idx) in graph.adjacent(id) {
            if neighbor > id && members.contains(&neighbor) {
                edge_indices.push(idx);
            }
        }
    }
    edge_indices.sort_unstable();

    let subgraph = Subgraph {
        nodes: members
            .iter()
            .map(|&id| graph.node_by_id(id).clone())
            .collect(),
        edges: edge_indices
            .into_iter()
            .map(|idx| graph.edge_by_index(idx).clone())
            .collect(),
        seeds: present,
        unknown_seeds: unknown,
    };
    tracing::debug!(
        seeds = subgraph.seeds.len(),
        nodes = subgraph.node_count(),
        edges = subgraph.edge_count(),
        "extracted subgraph"
    );
    subgraph
}

impl Graph {
    /// Convenience wrapper around [`query_subgraph`].
    pub fn subgraph<S: AsRef<str>>(&self, seeds: &[S], config: &QueryConfig) -> Subgraph {
        query_subgraph(self, seeds, config.top_k)
    }
}
