//! The offline batch job: source rows in, graph relations out.

use crate::persist::save_graph;
use crate::source::{open_source, read_exposures};
use crate::{Result, StorageConfig};
use ddigraph_graph::{build_graph_from_raw, BuildReport};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub report: BuildReport,
    pub graph_db: PathBuf,
    pub elapsed_ms: u64,
}

/// Read exposures, build the graph and persist it.
///
/// Any I/O or schema error aborts before the graph database is touched, and
/// the write itself is one transaction, so a failed run never leaves partial
/// relations behind.
pub fn run_batch(config: &StorageConfig) -> Result<BatchOutcome> {
    let started = Instant::now();
    tracing::info!(source = %config.source_db.display(), "starting graph build");

    let rows = {
        let conn = open_source(&config.source_db)?;
        read_exposures(&conn, &config.drugs_table)?
    };
    let (graph, report) = build_graph_from_raw(rows);
    save_graph(&config.graph_db, &graph)?;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    tracing::info!(
        graph_db = %config.graph_db.display(),
        edges = report.edges,
        nodes = report.nodes,
        elapsed_ms,
        "graph build finished"
    );
    Ok(BatchOutcome {
        report,
        graph_db: config.graph_db.clone(),
        elapsed_ms,
    })
}
