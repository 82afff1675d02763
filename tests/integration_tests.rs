//! Integration tests for the complete ddigraph pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - Source store → batch build → `DDI_GRAPH`/`DDI_NODES`
//! - Persisted graph → snapshot → query → layout → view
//! - Summarization fallback
//!
//! Run with: cargo test --test integration_tests

use ddigraph_graph::{
    query_subgraph, spring_layout, Graph, LayoutConfig, NetworkView, QueryConfig, SnapshotStore,
};
use ddigraph_storage::{load_graph_file, run_batch, StorageConfig, StorageError};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn write_source(path: &Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE DRUGS (safetyreportid, medicinalproduct, drugstartdate, drugenddate);
         -- R1: A/B overlap
         INSERT INTO DRUGS VALUES ('R1', 'DrugA', '20200101', '20200131');
         INSERT INTO DRUGS VALUES ('R1', 'DrugB', '20200115', '20200215');
         -- R2: disjoint
         INSERT INTO DRUGS VALUES ('R2', 'DrugA', '20200301', '20200310');
         INSERT INTO DRUGS VALUES ('R2', 'DrugC', '20200401', '20200410');
         -- R3: open end date
         INSERT INTO DRUGS VALUES ('R3', 'DrugX', '20190101', NULL);
         INSERT INTO DRUGS VALUES ('R3', 'DrugY', '20210601', '20210610');
         -- R4: all dates missing, everything overlaps
         INSERT INTO DRUGS VALUES ('R4', 'DrugA', NULL, NULL);
         INSERT INTO DRUGS VALUES ('R4', 'DrugB', NULL, NULL);
         INSERT INTO DRUGS VALUES ('R4', 'DrugX', NULL, NULL);
         -- dropped: no drug name
         INSERT INTO DRUGS VALUES ('R5', NULL, '20200101', '20200102');",
    )
    .unwrap();
}

fn build_config(dir: &Path) -> StorageConfig {
    let source = dir.join("source.db");
    write_source(&source);
    StorageConfig {
        source_db: source,
        graph_db: dir.join("ddi-graph.db"),
        ..StorageConfig::default()
    }
}

// ============================================================================
// Batch build → persistence
// ============================================================================

#[test]
fn test_batch_build_persists_expected_edges() {
    let dir = tempdir().unwrap();
    let config = build_config(dir.path());

    let outcome = run_batch(&config).unwrap();
    assert_eq!(outcome.report.dropped_records, 1);
    assert_eq!(outcome.report.reports, 4);

    let graph = load_graph_file(&config.graph_db).unwrap();
    assert_eq!(graph.edge("DrugA", "DrugB").map(|e| e.weight), Some(4));
    assert_eq!(graph.edge("DrugX", "DrugY").map(|e| e.weight), Some(2));
    assert_eq!(graph.edge("DrugA", "DrugX").map(|e| e.weight), Some(2));
    assert!(graph.edge("DrugA", "DrugC").is_none());
    assert!(!graph.contains("DrugC"));

    for edge in graph.edges() {
        assert!(edge.drug_a < edge.drug_b);
        assert_eq!(edge.weight % 2, 0);
        assert_eq!(edge.mean_severity, 0.0);
    }
    for node in graph.nodes() {
        assert_eq!(node.mean_severity, 0.0);
    }
}

#[test]
fn test_persisted_schema_matches_contract() {
    let dir = tempdir().unwrap();
    let config = build_config(dir.path());
    run_batch(&config).unwrap();

    let conn = Connection::open(&config.graph_db).unwrap();
    let columns = |table: &str| -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("SELECT name FROM pragma_table_info('{table}')"))
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    };
    assert_eq!(
        columns("DDI_GRAPH"),
        vec!["drug_a", "drug_b", "weight", "mean_severity"]
    );
    assert_eq!(columns("DDI_NODES"), vec!["drug", "mean_severity"]);
}

#[test]
fn test_rebuild_is_idempotent() {
    let dir = tempdir().unwrap();
    let config = build_config(dir.path());

    run_batch(&config).unwrap();
    let first = load_graph_file(&config.graph_db).unwrap();
    run_batch(&config).unwrap();
    let second = load_graph_file(&config.graph_db).unwrap();

    assert_eq!(first.edges(), second.edges());
    assert_eq!(first.nodes(), second.nodes());
}

#[test]
fn test_failed_build_keeps_previous_graph() {
    let dir = tempdir().unwrap();
    let config = build_config(dir.path());
    run_batch(&config).unwrap();

    let broken = StorageConfig {
        drugs_table: "MISSING_TABLE".into(),
        ..config.clone()
    };
    assert!(matches!(
        run_batch(&broken),
        Err(StorageError::Schema { .. })
    ));

    let graph = load_graph_file(&config.graph_db).unwrap();
    assert_eq!(graph.edge_count(), 4);
}

// ============================================================================
// Query path
// ============================================================================

#[test]
fn test_query_layout_view_from_persisted_graph() {
    let dir = tempdir().unwrap();
    let config = build_config(dir.path());
    run_batch(&config).unwrap();

    let store = SnapshotStore::new(load_graph_file(&config.graph_db).unwrap());
    let snapshot = store.current();
    let sub = snapshot.graph.subgraph(&["DrugA"], &QueryConfig::default());
    assert_eq!(sub.seeds(), ["DrugA"]);
    assert!(sub.contains("DrugB"));
    assert!(sub.contains("DrugX"));
    assert_eq!(sub.edge_count(), 3);

    let placed = spring_layout(&sub, &LayoutConfig::default());
    let again = spring_layout(&sub, &LayoutConfig::default());
    assert_eq!(placed, again);

    let view = NetworkView::new(&sub, &placed);
    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["nodes"].as_array().map(Vec::len), Some(3));
    assert_eq!(json["edges"].as_array().map(Vec::len), Some(3));
}

#[test]
fn test_unknown_seed_yields_empty_view() {
    let dir = tempdir().unwrap();
    let config = build_config(dir.path());
    run_batch(&config).unwrap();

    let graph = load_graph_file(&config.graph_db).unwrap();
    let sub = query_subgraph(&graph, &["NotADrug"], 20);
    assert!(sub.is_empty());
    assert_eq!(sub.unknown_seeds(), ["NotADrug"]);

    let view = NetworkView::new(&sub, &spring_layout(&sub, &LayoutConfig::default()));
    assert!(view.is_empty());
}

#[test]
fn test_concurrent_queries_share_one_snapshot() {
    let dir = tempdir().unwrap();
    let config = build_config(dir.path());
    run_batch(&config).unwrap();

    let store = Arc::new(SnapshotStore::new(
        load_graph_file(&config.graph_db).unwrap(),
    ));
    let expected = {
        let snapshot = store.current();
        let sub = query_subgraph(&snapshot.graph, &["DrugA", "DrugY"], 20);
        spring_layout(&sub, &LayoutConfig::with_seed(9))
    };

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                s.spawn(move || {
                    if i == 4 {
                        // A publish mid-flight must not disturb readers holding the old snapshot.
                        store.publish(Graph::new());
                    }
                    let snapshot = store.current();
                    let sub = query_subgraph(&snapshot.graph, &["DrugA", "DrugY"], 20);
                    (snapshot.version, spring_layout(&sub, &LayoutConfig::with_seed(9)))
                })
            })
            .collect();

        for handle in handles {
            let (version, placed) = handle.join().unwrap();
            if version == 1 {
                assert_eq!(placed, expected);
            } else {
                assert!(placed.is_empty());
            }
        }
    });
    assert_eq!(store.version(), 2);
}

// ============================================================================
// Summarization
// ============================================================================

#[test]
fn test_summary_fallback_without_provider() {
    use ddigraph_summarize::{summarize_or_fallback, StaticSummarizer, FALLBACK_SUMMARY};

    assert_eq!(summarize_or_fallback(None, "Nausea"), FALLBACK_SUMMARY);
    let canned = StaticSummarizer::new().with_answer(
        "Nausea",
        "Summary of Nausea: feeling of sickness (severity level: mild)",
    );
    assert!(summarize_or_fallback(Some(&canned), "Nausea").starts_with("Summary of Nausea"));
}
