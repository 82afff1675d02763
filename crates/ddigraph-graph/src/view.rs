//! Renderer-ready join of a subgraph and its layout.

use crate::layout::{Layout, Point};
use crate::query::Subgraph;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewNode {
    pub drug: String,
    pub x: f64,
    pub y: f64,
    /// Seeds are highlighted by renderers.
    pub is_seed: bool,
    pub mean_severity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewEdge {
    pub drug_a: String,
    pub drug_b: String,
    pub weight: u64,
    pub from: Point,
    pub to: Point,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkView {
    pub nodes: Vec<ViewNode>,
    pub edges: Vec<ViewEdge>,
    pub unknown_seeds: Vec<String>,
}

impl NetworkView {
    /// Join a subgraph with the layout computed for it.
    ///
    /// Nodes missing from the layout are placed at the origin.
    pub fn new(subgraph: &Subgraph, layout: &Layout) -> Self {
        let at = |drug: &str| layout.get(drug).unwrap_or(Point { x: 0.0, y: 0.0 });

        let nodes = subgraph
            .nodes
            .iter()
            .map(|node| {
                let p = at(&node.drug);
                ViewNode {
                    drug: node.drug.clone(),
                    x: p.x,
                    y: p.y,
                    is_seed: subgraph.is_seed(&node.drug),
                    mean_severity: node.mean_severity,
                }
            })
            .collect();

        let edges = subgraph
            .edges
            .iter()
            .map(|edge| ViewEdge {
                drug_a: edge.drug_a.clone(),
                drug_b: edge.drug_b.clone(),
                weight: edge.weight,
                from: at(&edge.drug_a),
                to: at(&edge.drug_b),
            })
            .collect();

        Self {
            nodes,
            edges,
            unknown_seeds: subgraph.unknown_seeds.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
