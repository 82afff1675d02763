//! ddigraph: drug co-occurrence graph over adverse-event reports
//!
//! Two drugs are connected when they were administered during overlapping
//! time windows inside the same report. The crate covers both halves of the
//! system:
//!
//! ```text
//!  batch (offline)                          query (interactive)
//!  ───────────────                          ───────────────────
//!  DrugExposure stream                      Arc<GraphSnapshot>
//!        │                                        │
//!        ▼                                        ▼
//!  overlap::overlapping_pairs  (per report)  query::query_subgraph (seeds, k)
//!        │                                        │
//!        ▼                                        ▼
//!  aggregate::GraphAggregator  (fold)        layout::spring_layout (seeded)
//!        │                                        │
//!        ▼                                        ▼
//!  Graph  ──────► snapshot::SnapshotStore     view::NetworkView
//! ```
//!
//! ## Module Organization
//!
//! - `dates`: report date normalization + open-interval sentinels
//! - `exposure`: validated per-drug exposure records
//! - `overlap`: closed-interval pairwise overlap scan
//! - `aggregate`: canonical edge accumulation and the parallel batch build
//! - `query`: bounded neighbor ranking and induced subgraphs
//! - `layout`: deterministic force-directed placement
//! - `snapshot`: versioned, atomically swappable graph snapshots
//! - `view`: subgraph + layout joined for renderers
//! - `reactions`: reaction/indication analytics over report records

pub mod aggregate;
pub mod dates;
pub mod exposure;
pub mod layout;
pub mod overlap;
pub mod query;
pub mod reactions;
pub mod snapshot;
pub mod view;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub use aggregate::{build_graph, build_graph_from_raw, BuildReport, GraphAggregator};
pub use dates::{parse_report_date, DateBound, DateParseError};
pub use exposure::{DrugExposure, MissingDataError, RawExposure};
pub use layout::{layout, spring_layout, Layout, LayoutConfig, Point};
pub use query::{query_subgraph, rank_neighbors, QueryConfig, Subgraph, DEFAULT_TOP_K};
pub use snapshot::{GraphSnapshot, SnapshotStore};
pub use view::NetworkView;

/// Severity contributed by every report.
///
/// The upstream report-severity signal is disabled, so each report folds in
/// zero and every `mean_severity` in the graph is zero.
pub const DISABLED_REPORT_SEVERITY: f64 = 0.0;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GraphError {
    #[error("edge ({drug_a}, {drug_b}) is not canonical: drug_a must precede drug_b")]
    NonCanonicalEdge { drug_a: String, drug_b: String },
    #[error("duplicate edge for pair ({drug_a}, {drug_b})")]
    DuplicateEdge { drug_a: String, drug_b: String },
    #[error("edge ({drug_a}, {drug_b}) has non-positive weight {weight}")]
    InvalidWeight {
        drug_a: String,
        drug_b: String,
        weight: i64,
    },
    #[error("edge endpoint `{drug}` has no node row")]
    MissingNode { drug: String },
    #[error("node `{drug}` has no incident edge")]
    OrphanNode { drug: String },
    #[error("duplicate node row for `{drug}`")]
    DuplicateNode { drug: String },
}

// ============================================================================
// Drug Interning
// ============================================================================

/// Compact drug identity inside one `Graph`.
///
/// Ids are assigned in lexicographic name order, so comparing ids is the same
/// as comparing names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct DrugId(u32);

impl DrugId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Name <-> id lookup table kept beside the adjacency arrays.
#[derive(Debug, Clone, Default)]
pub struct DrugInterner {
    name_to_id: AHashMap<String, DrugId>,
    id_to_name: Vec<String>,
}

impl DrugInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a drug name, returning its id
    pub fn intern(&mut self, name: &str) -> DrugId {
        if let Some(id) = self.name_to_id.get(name) {
            return *id;
        }
        let id = DrugId(self.id_to_name.len() as u32);
        self.name_to_id.insert(name.to_string(), id);
        self.id_to_name.push(name.to_string());
        id
    }

    /// Look up an existing id without inserting.
    pub fn id_of(&self, name: &str) -> Option<DrugId> {
        self.name_to_id.get(name).copied()
    }

    pub fn name(&self, id: DrugId) -> Option<&str> {
        self.id_to_name.get(id.index()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.id_to_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_name.is_empty()
    }
}

// ============================================================================
// Nodes and Edges
// ============================================================================

/// One canonical drug pair. `drug_a < drug_b` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub drug_a: String,
    pub drug_b: String,
    /// Number of overlap events folded into this edge.
    pub weight: u64,
    pub mean_severity: f64,
}

impl Edge {
    /// Whether `drug` is one of the two endpoints.
    pub fn touches(&self, drug: &str) -> bool {
        self.drug_a == drug || self.drug_b == drug
    }

    /// The endpoint that is not `drug`.
    pub fn other(&self, drug: &str) -> Option<&str> {
        if self.drug_a == drug {
            Some(&self.drug_b)
        } else if self.drug_b == drug {
            Some(&self.drug_a)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub drug: String,
    /// Unweighted mean of `mean_severity` over incident edges.
    pub mean_severity: f64,
}

/// Order two names into the canonical `(smaller, larger)` pair.
pub fn canonical_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

// ============================================================================
// Graph
// ============================================================================

/// Immutable drug co-occurrence graph.
///
/// Edges keep the order they were given in, which for a built graph is the
/// order each pair was first discovered; nodes are indexed by `DrugId`. The
/// adjacency lists hold `(neighbor, edge index)` in edge order, so neighbor
/// ties resolve by discovery order.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    drugs: DrugInterner,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    adjacency: Vec<Vec<(DrugId, u32)>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from canonical edges, deriving node aggregates.
    pub fn from_edges(edges: Vec<Edge>) -> Result<Self, GraphError> {
        validate_edges(&edges)?;

        let mut sums: BTreeMap<&str, (f64, u64)> = BTreeMap::new();
        for edge in &edges {
            for drug in [edge.drug_a.as_str(), edge.drug_b.as_str()] {
                let slot = sums.entry(drug).or_insert((0.0, 0));
                slot.0 += edge.mean_severity;
                slot.1 += 1;
            }
        }
        let severities: BTreeMap<String, f64> = sums
            .into_iter()
            .map(|(drug, (sum, count))| (drug.to_string(), sum / count as f64))
            .collect();

        Ok(Self::assemble(edges, severities))
    }

    /// Rebuild a graph from persisted edge and node rows.
    ///
    /// Node rows must cover exactly the edge endpoints. Edge rows keep their
    /// stored order, which is the discovery order they were written in.
    pub fn from_parts(edges: Vec<Edge>, nodes: Vec<Node>) -> Result<Self, GraphError> {
        validate_edges(&edges)?;

        let mut severities: BTreeMap<String, f64> = BTreeMap::new();
        for node in nodes {
            if severities.contains_key(&node.drug) {
                return Err(GraphError::DuplicateNode { drug: node.drug });
            }
            severities.insert(node.drug, node.mean_severity);
        }

        let mut endpoints: BTreeSet<&str> = BTreeSet::new();
        for edge in &edges {
            for drug in [edge.drug_a.as_str(), edge.drug_b.as_str()] {
                if !severities.contains_key(drug) {
                    return Err(GraphError::MissingNode {
                        drug: drug.to_string(),
                    });
                }
                endpoints.insert(drug);
            }
        }
        if let Some(orphan) = severities.keys().find(|d| !endpoints.contains(d.as_str())) {
            return Err(GraphError::OrphanNode {
                drug: orphan.clone(),
            });
        }

        Ok(Self::assemble(edges, severities))
    }

    fn assemble(edges: Vec<Edge>, severities: BTreeMap<String, f64>) -> Self {
        // BTreeMap iteration is name-ordered, so ids follow name order.
        let mut drugs = DrugInterner::new();
        let mut nodes = Vec::with_capacity(severities.len());
        for (drug, mean_severity) in severities {
            drugs.intern(&drug);
            nodes.push(Node {
                drug,
                mean_severity,
            });
        }

        let mut adjacency = vec![Vec::new(); nodes.len()];
        for (idx, edge) in edges.iter().enumerate() {
            let (Some(a), Some(b)) = (drugs.id_of(&edge.drug_a), drugs.id_of(&edge.drug_b)) else {
                continue;
            };
            adjacency[a.index()].push((b, idx as u32));
            adjacency[b.index()].push((a, idx as u32));
        }

        Self {
            drugs,
            nodes,
            edges,
            adjacency,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in name order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Edges in discovery order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn contains(&self, drug: &str) -> bool {
        self.drugs.id_of(drug).is_some()
    }

    pub fn drug_id(&self, drug: &str) -> Option<DrugId> {
        self.drugs.id_of(drug)
    }

    pub fn drug_name(&self, id: DrugId) -> Option<&str> {
        self.drugs.name(id)
    }

    pub fn node(&self, drug: &str) -> Option<&Node> {
        self.drugs.id_of(drug).map(|id| &self.nodes[id.index()])
    }

    pub(crate) fn node_by_id(&self, id: DrugId) -> &Node {
        &self.nodes[id.index()]
    }

    pub(crate) fn edge_by_index(&self, idx: u32) -> &Edge {
        &self.edges[idx as usize]
    }

    /// Look up the edge for an unordered pair.
    pub fn edge(&self, x: &str, y: &str) -> Option<&Edge> {
        let (a, b) = canonical_pair(x, y);
        let id_a = self.drugs.id_of(a)?;
        self.adjacency[id_a.index()]
            .iter()
            .map(|(_, idx)| &self.edges[*idx as usize])
            .find(|e| e.drug_a == a && e.drug_b == b)
    }

    /// Adjacency of one drug as `(neighbor id, edge index)`, in edge order.
    pub(crate) fn adjacent(&self, id: DrugId) -> &[(DrugId, u32)] {
        &self.adjacency[id.index()]
    }

    /// Neighbors of `drug` with their connecting edge, in edge order.
    pub fn neighbors<'a>(&'a self, drug: &str) -> impl Iterator<Item = (&'a str, &'a Edge)> + 'a {
        let adjacent: &'a [(DrugId, u32)] = match self.drugs.id_of(drug) {
            Some(id) => &self.adjacency[id.index()],
            None => &[],
        };
        adjacent.iter().map(move |(neighbor, idx)| {
            (
                self.nodes[neighbor.index()].drug.as_str(),
                &self.edges[*idx as usize],
            )
        })
    }

    pub fn degree(&self, drug: &str) -> usize {
        self.drugs
            .id_of(drug)
            .map(|id| self.adjacency[id.index()].len())
            .unwrap_or(0)
    }
}

fn validate_edges(edges: &[Edge]) -> Result<(), GraphError> {
    let mut seen: BTreeSet<(&str, &str)> = BTreeSet::new();
    for edge in edges {
        if edge.drug_a >= edge.drug_b {
            return Err(GraphError::NonCanonicalEdge {
                drug_a: edge.drug_a.clone(),
                drug_b: edge.drug_b.clone(),
            });
        }
        if edge.weight == 0 {
            return Err(GraphError::InvalidWeight {
                drug_a: edge.drug_a.clone(),
                drug_b: edge.drug_b.clone(),
                weight: 0,
            });
        }
        if !seen.insert((edge.drug_a.as_str(), edge.drug_b.as_str())) {
            return Err(GraphError::DuplicateEdge {
                drug_a: edge.drug_a.clone(),
                drug_b: edge.drug_b.clone(),
            });
        }
    }
    Ok(())
}
