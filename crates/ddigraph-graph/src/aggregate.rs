//! Graph aggregation: fold per-report overlap events into canonical edges.
//!
//! Each ordered overlapping pair increments the accumulator of its canonical
//! drug pair by one. Because the overlap scan emits both `(i, j)` and `(j, i)`,
//! one physically overlapping pair adds 2 to the edge weight.
//!
//! The batch build groups exposures by report, runs the per-report scan in
//! parallel, and folds the results serially in report-id order. Edges come out
//! in the order their pair was first seen during that fold, which later
//! serves as the neighbor tie-break. Weights do not depend on row order at
//! all; edge order depends only on row order within each report.

use crate::exposure::{DrugExposure, RawExposure};
use crate::overlap::overlapping_drug_pairs;
use crate::{canonical_pair, DrugId, DrugInterner, Edge, Graph, DISABLED_REPORT_SEVERITY};
use ahash::AHashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Running totals for one canonical drug pair.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EdgeAccumulator {
    pub count: u64,
    pub severity_sum: f64,
    /// Position of the pair among all distinct pairs, by first event.
    pub first_seen: u64,
}

impl EdgeAccumulator {
    pub fn mean_severity(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.severity_sum / self.count as f64
        }
    }
}

/// Counters describing one batch build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Distinct report ids seen among valid exposures.
    pub reports: usize,
    /// Valid exposures folded into the build.
    pub exposures: usize,
    /// Records dropped for missing report id or drug name.
    pub dropped_records: usize,
    /// Present date bounds that could not be parsed and were replaced by sentinels.
    pub date_parse_failures: usize,
    /// Ordered overlap events folded into edges.
    pub overlap_events: u64,
    /// Overlap events between two entries of the same drug; these never form edges.
    pub same_drug_events: u64,
    pub edges: usize,
    pub nodes: usize,
}

/// Accumulates overlap events keyed by canonical drug pair.
#[derive(Debug, Default)]
pub struct GraphAggregator {
    drugs: DrugInterner,
    accumulators: AHashMap<(DrugId, DrugId), EdgeAccumulator>,
    overlap_events: u64,
    same_drug_events: u64,
}

impl GraphAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one ordered overlap event.
    pub fn record(&mut self, drug_x: &str, drug_y: &str, severity: f64) {
        if drug_x == drug_y {
            self.same_drug_events += 1;
            return;
        }
        let (a, b) = canonical_pair(drug_x, drug_y);
        let key = (self.drugs.intern(a), self.drugs.intern(b));
        let next = self.accumulators.len() as u64;
        let acc = self
            .accumulators
            .entry(key)
            .or_insert_with(|| EdgeAccumulator {
                first_seen: next,
                ..EdgeAccumulator::default()
            });
        acc.count += 1;
        acc.severity_sum += severity;
        self.overlap_events += 1;
    }

    /// Scan one report and fold every ordered overlapping pair.
    pub fn fold_report(&mut self, exposures: &[DrugExposure], severity: f64) {
        for (x, y) in overlapping_drug_pairs(exposures) {
            self.record(x, y, severity);
        }
    }

    pub fn overlap_events(&self) -> u64 {
        self.overlap_events
    }

    pub fn same_drug_events(&self) -> u64 {
        self.same_drug_events
    }

    /// Accumulator for an unordered pair, if any event was folded into it.
    pub fn accumulator(&self, x: &str, y: &str) -> Option<&EdgeAccumulator> {
        let (a, b) = canonical_pair(x, y);
        let key = (self.drugs.id_of(a)?, self.drugs.id_of(b)?);
        self.accumulators.get(&key)
    }

    /// Finalize edges in discovery order and derive node aggregates.
    pub fn finish(self) -> Graph {
        let mut discovered: Vec<(u64, Edge)> = self
            .accumulators
            .iter()
            .filter_map(|(&(a, b), acc)| {
                let edge = Edge {
                    drug_a: self.drugs.name(a)?.to_string(),
                    drug_b: self.drugs.name(b)?.to_string(),
                    weight: acc.count,
                    mean_severity: acc.mean_severity(),
                };
                Some((acc.first_seen, edge))
            })
            .collect();
        discovered.sort_by_key(|(first_seen, _)| *first_seen);
        let edges: Vec<Edge> = discovered.into_iter().map(|(_, edge)| edge).collect();

        // Accumulator keys are canonical and unique, so validation cannot fail.
        Graph::from_edges(edges).unwrap_or_default()
    }
}

/// Build a graph from already-validated exposures.
pub fn build_graph<I>(exposures: I) -> Graph
where
    I: IntoIterator<Item = DrugExposure>,
{
    let mut by_report: BTreeMap<String, Vec<DrugExposure>> = BTreeMap::new();
    for exposure in exposures {
        by_report
            .entry(exposure.report_id.clone())
            .or_default()
            .push(exposure);
    }
    fold_reports(&by_report).finish()
}

/// Validate raw event-store rows and build the graph, counting dropped records
/// and unreadable dates along the way.
pub fn build_graph_from_raw<I>(rows: I) -> (Graph, BuildReport)
where
    I: IntoIterator<Item = RawExposure>,
{
    let mut report = BuildReport::default();
    let mut by_report: BTreeMap<String, Vec<DrugExposure>> = BTreeMap::new();

    for row in rows {
        match row.normalize() {
            Ok(normalized) => {
                report.exposures += 1;
                report.date_parse_failures += normalized.unparsed_dates as usize;
                by_report
                    .entry(normalized.exposure.report_id.clone())
                    .or_default()
                    .push(normalized.exposure);
            }
            Err(err) => {
                report.dropped_records += 1;
                tracing::debug!(error = %err, "dropping exposure record");
            }
        }
    }
    report.reports = by_report.len();

    let aggregator = fold_reports(&by_report);
    report.overlap_events = aggregator.overlap_events();
    report.same_drug_events = aggregator.same_drug_events();

    let graph = aggregator.finish();
    report.edges = graph.edge_count();
    report.nodes = graph.node_count();

    if report.dropped_records > 0 || report.date_parse_failures > 0 {
        tracing::warn!(
            dropped_records = report.dropped_records,
            date_parse_failures = report.date_parse_failures,
            "exposure records needed normalization"
        );
    }
    tracing::info!(
        reports = report.reports,
        exposures = report.exposures,
        overlap_events = report.overlap_events,
        edges = report.edges,
        nodes = report.nodes,
        "built co-occurrence graph"
    );

    (graph, report)
}

fn fold_reports(by_report: &BTreeMap<String, Vec<DrugExposure>>) -> GraphAggregator {
    let reports: Vec<&Vec<DrugExposure>> = by_report.values().filter(|r| r.len() > 1).collect();

    let events: Vec<Vec<(&str, &str)>> = reports
        .par_iter()
        .map(|&exposures| overlapping_drug_pairs(exposures))
        .collect();

    let mut aggregator = GraphAggregator::new();
    for report_events in events {
        for (x, y) in report_events {
            aggregator.record(x, y, DISABLED_REPORT_SEVERITY);
        }
    }
    aggregator
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(report: &str, drug: &str, start: Option<&str>, end: Option<&str>) -> RawExposure {
        RawExposure::new(report, drug, start, end)
    }

    #[test]
    fn test_overlapping_pair_weight_is_two() {
        let (graph, report) = build_graph_from_raw(vec![
            raw("R1", "DrugA", Some("20200101"), Some("20200131")),
            raw("R1", "DrugB", Some("20200115"), Some("20200215")),
        ]);
        let edge = graph.edge("DrugA", "DrugB").unwrap();
        assert_eq!(edge.weight, 2);
        assert_eq!(edge.mean_severity, 0.0);
        assert_eq!(report.overlap_events, 2);
        assert_eq!(report.reports, 1);
    }

    #[test]
    fn test_weights_accumulate_across_reports() {
        let (graph, _) = build_graph_from_raw(vec![
            raw("R1", "B", None, None),
            raw("R1", "A", None, None),
            raw("R2", "A", None, None),
            raw("R2", "B", None, None),
            raw("R2", "C", Some("1990"), Some("1991")),
        ]);
        assert_eq!(graph.edge("A", "B").unwrap().weight, 4);
        assert_eq!(graph.edge("A", "C").unwrap().weight, 2);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_dropped_and_unparsed_records_are_counted() {
        let (graph, report) = build_graph_from_raw(vec![
            RawExposure {
                report_id: Some("R1".into()),
                drug_name: None,
                ..Default::default()
            },
            raw("R1", "A", Some("not-a-date"), None),
            raw("R1", "B", None, Some("20200101")),
        ]);
        assert_eq!(report.dropped_records, 1);
        assert_eq!(report.date_parse_failures, 1);
        assert_eq!(report.exposures, 2);
        assert_eq!(graph.edge("A", "B").unwrap().weight, 2);
    }

    #[test]
    fn test_same_drug_twice_forms_no_edge() {
        let (graph, report) = build_graph_from_raw(vec![
            raw("R1", "A", None, None),
            raw("R1", "A", None, None),
        ]);
        assert!(graph.is_empty());
        assert_eq!(report.same_drug_events, 2);
        assert_eq!(report.overlap_events, 0);
    }

    #[test]
    fn test_aggregator_tracks_severity_sum() {
        let mut aggregator = GraphAggregator::new();
        aggregator.record("B", "A", 1.0);
        aggregator.record("A", "B", 3.0);
        let acc = *aggregator.accumulator("A", "B").unwrap();
        assert_eq!(acc.count, 2);
        assert_eq!(acc.mean_severity(), 2.0);

        let graph = aggregator.finish();
        assert_eq!(graph.edge("A", "B").unwrap().mean_severity, 2.0);
        assert_eq!(graph.node("A").unwrap().mean_severity, 2.0);
    }

    #[test]
    fn test_edges_come_out_in_discovery_order() {
        // R1 introduces SEED-ZED before R2 introduces ALPHA-SEED.
        let (graph, _) = build_graph_from_raw(vec![
            raw("R2", "SEED", None, None),
            raw("R2", "ALPHA", None, None),
            raw("R1", "SEED", None, None),
            raw("R1", "ZED", None, None),
        ]);
        let pairs: Vec<(&str, &str)> = graph
            .edges()
            .iter()
            .map(|e| (e.drug_a.as_str(), e.drug_b.as_str()))
            .collect();
        assert_eq!(pairs, vec![("SEED", "ZED"), ("ALPHA", "SEED")]);
        let neighbors: Vec<&str> = graph.neighbors("SEED").map(|(n, _)| n).collect();
        assert_eq!(neighbors, vec!["ZED", "ALPHA"]);
    }

    #[test]
    fn test_edge_weights_do_not_depend_on_row_order() {
        let d = |s: &str| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
        let exposures = vec![
            DrugExposure::new("R1", "A", d("2020-01-01"), d("2020-01-10")),
            DrugExposure::new("R1", "B", d("2020-01-05"), None),
            DrugExposure::new("R2", "C", None, d("2020-01-07")),
            DrugExposure::new("R2", "B", d("2020-01-07"), None),
            DrugExposure::new("R1", "C", d("2021-01-01"), None),
        ];
        let sorted = |graph: Graph| {
            let mut edges = graph.edges().to_vec();
            edges.sort_by(|x, y| (&x.drug_a, &x.drug_b).cmp(&(&y.drug_a, &y.drug_b)));
            (edges, graph.nodes().to_vec())
        };
        let forward = sorted(build_graph(exposures.clone()));
        let backward = sorted(build_graph(exposures.into_iter().rev()));
        assert_eq!(forward, backward);
    }
}
