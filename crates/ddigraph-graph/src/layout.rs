//! Force-directed (spring model) layout of a subgraph.
//!
//! Fruchterman-Reingold with edge weights scaling attraction: every pair of
//! nodes repels with `k² / d`, connected pairs attract with `w · d² / k`, and
//! each step moves a node by at most the current temperature, which cools
//! linearly to zero. Initial positions are drawn from a seeded RNG in node
//! name order, so the same subgraph and seed always give the same layout.
//!
//! A layout is a plain value computed per call. Nothing is cached between calls.

use crate::query::Subgraph;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

pub const DEFAULT_LAYOUT_SEED: u64 = 42;
pub const DEFAULT_ITERATIONS: usize = 50;

/// Smallest distance used in force computation.
const MIN_DISTANCE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub seed: u64,
    pub iterations: usize,
    /// Stop early once the mean displacement per node drops below this.
    pub threshold: f64,
    /// Coordinates are rescaled into `[-scale, scale]`.
    pub scale: f64,
    /// Optional wall-clock budget; iteration stops when exceeded.
    pub time_budget_ms: Option<u64>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_LAYOUT_SEED,
            iterations: DEFAULT_ITERATIONS,
            threshold: 1e-4,
            scale: 1.0,
            time_budget_ms: None,
        }
    }
}

impl LayoutConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Drug name -> 2D coordinate, valid for the subgraph it was computed on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub positions: BTreeMap<String, Point>,
}

impl Layout {
    pub fn get(&self, drug: &str) -> Option<Point> {
        self.positions.get(drug).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Point)> {
        self.positions.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Layout with default parameters and the given seed.
pub fn layout(subgraph: &Subgraph, seed: u64) -> Layout {
    spring_layout(subgraph, &LayoutConfig::with_seed(seed))
}

pub fn spring_layout(subgraph: &Subgraph, config: &LayoutConfig) -> Layout {
    let n = subgraph.nodes.len();
    match n {
        0 => return Layout::default(),
        1 => {
            let mut positions = BTreeMap::new();
            positions.insert(subgraph.nodes[0].drug.clone(), Point { x: 0.0, y: 0.0 });
            return Layout { positions };
        }
        _ => {}
    }

    // Dense symmetric weight matrix; subgraphs are bounded by seeds * (k + 1).
    let mut weights = vec![0.0f64; n * n];
    for edge in &subgraph.edges {
        let (Some(a), Some(b)) = (subgraph.index_of(&edge.drug_a), subgraph.index_of(&edge.drug_b))
        else {
            continue;
        };
        weights[a * n + b] = edge.weight as f64;
        weights[b * n + a] = edge.weight as f64;
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut pos: Vec<[f64; 2]> = (0..n).map(|_| [rng.gen::<f64>(), rng.gen::<f64>()]).collect();

    let k = (1.0 / n as f64).sqrt();
    let mut temperature = 0.1 * span(&pos);
    let cooling = temperature / (config.iterations as f64 + 1.0);
    let deadline = config
        .time_budget_ms
        .map(|ms| Instant::now() + Duration::from_millis(ms));

    let mut displacement = vec![[0.0f64; 2]; n];
    for iteration in 0..config.iterations {
        for i in 0..n {
            let mut d = [0.0, 0.0];
            for j in 0..n {
                if i == j {
                    continue;
                }
                let dx = pos[i][0] - pos[j][0];
                let dy = pos[i][1] - pos[j][1];
                let dist = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
                let force = k * k / (dist * dist) - weights[i * n + j] * dist / k;
                d[0] += dx * force;
                d[1] += dy * force;
            }
            displacement[i] = d;
        }

        let mut moved = 0.0;
        for i in 0..n {
            let [dx, dy] = displacement[i];
            let length = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
            let step = [dx * temperature / length, dy * temperature / length];
            pos[i][0] += step[0];
            pos[i][1] += step[1];
            moved += step[0] * step[0] + step[1] * step[1];
        }
        temperature -= cooling;

        if moved.sqrt() / (n as f64) < config.threshold {
            tracing::trace!(iteration, "layout converged");
            break;
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            tracing::debug!(iteration, "layout time budget exhausted");
            break;
        }
    }

    rescale(&mut pos, config.scale);

    Layout {
        positions: subgraph
            .nodes
            .iter()
            .zip(pos)
            .map(|(node, [x, y])| (node.drug.clone(), Point { x, y }))
            .collect(),
    }
}

/// Largest extent of the point cloud along either axis.
fn span(pos: &[[f64; 2]]) -> f64 {
    (0..2)
        .map(|axis| {
            let (lo, hi) = pos.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p[axis]), hi.max(p[axis]))
            });
            hi - lo
        })
        .fold(0.0, f64::max)
}

/// Center on the origin and scale the largest absolute coordinate to `scale`.
fn rescale(pos: &mut [[f64; 2]], scale: f64) {
    let n = pos.len() as f64;
    for axis in 0..2 {
        let mean = pos.iter().map(|p| p[axis]).sum::<f64>() / n;
        for p in pos.iter_mut() {
            p[axis] -= mean;
        }
    }
    let limit = pos
        .iter()
        .flat_map(|p| [p[0].abs(), p[1].abs()])
        .fold(0.0, f64::max);
    if limit > 0.0 {
        for p in pos.iter_mut() {
            p[0] *= scale / limit;
            p[1] *= scale / limit;
        }
    }
}
