//! Worked scenarios over small hand-built reports.

use ddigraph_graph::*;

fn raw(report: &str, drug: &str, start: Option<&str>, end: Option<&str>) -> RawExposure {
    RawExposure::new(report, drug, start, end)
}

#[test]
fn test_overlapping_window_creates_double_counted_edge() {
    let (graph, _) = build_graph_from_raw(vec![
        raw("R1", "DrugA", Some("20200101"), Some("20200131")),
        raw("R1", "DrugB", Some("20200115"), Some("20200215")),
    ]);
    let edge = graph.edge("DrugA", "DrugB").expect("edge should exist");
    assert_eq!(edge.drug_a, "DrugA");
    assert_eq!(edge.drug_b, "DrugB");
    assert_eq!(edge.weight, 2);
}

#[test]
fn test_disjoint_windows_create_no_edge() {
    let (graph, report) = build_graph_from_raw(vec![
        raw("R2", "DrugA", Some("20200301"), Some("20200310")),
        raw("R2", "DrugC", Some("20200401"), Some("20200410")),
    ]);
    assert!(graph.edge("DrugA", "DrugC").is_none());
    assert_eq!(report.overlap_events, 0);
    assert!(graph.is_empty());
}

#[test]
fn test_missing_end_date_is_ongoing() {
    let (graph, report) = build_graph_from_raw(vec![
        raw("R3", "DrugX", Some("20190101"), None),
        raw("R3", "DrugY", Some("20210601"), Some("20210610")),
    ]);
    assert_eq!(graph.edge("DrugY", "DrugX").map(|e| e.weight), Some(2));
    assert_eq!(report.date_parse_failures, 0);
}

#[test]
fn test_unknown_seed_returns_empty_sentinel() {
    let (graph, _) = build_graph_from_raw(vec![
        raw("R1", "DrugA", None, None),
        raw("R1", "DrugB", None, None),
    ]);
    let sub = query_subgraph(&graph, &["Unknown"], 20);
    assert_eq!(sub.nodes(), Subgraph::empty().nodes());
    assert!(sub.is_empty());
    assert!(layout(&sub, 42).is_empty());
}

#[test]
fn test_query_then_layout_round() {
    let (graph, _) = build_graph_from_raw(vec![
        raw("R1", "WARFARIN", None, None),
        raw("R1", "ASPIRIN", None, None),
        raw("R2", "WARFARIN", None, None),
        raw("R2", "ASPIRIN", None, None),
        raw("R2", "OMEPRAZOLE", None, None),
        raw("R3", "METFORMIN", None, None),
        raw("R3", "LISINOPRIL", None, None),
    ]);

    assert_eq!(rank_neighbors(&graph, "WARFARIN", 20)[0], ("ASPIRIN", 4));

    let sub = query_subgraph(&graph, &["WARFARIN"], 20);
    assert_eq!(sub.node_count(), 3);
    assert_eq!(sub.edge_count(), 3);
    assert!(!sub.contains("METFORMIN"));

    let placed = layout(&sub, 42);
    let view = NetworkView::new(&sub, &placed);
    assert_eq!(view.nodes.iter().filter(|n| n.is_seed).count(), 1);
    assert_eq!(view.edges.len(), 3);
}
