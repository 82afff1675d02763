//! Graph persistence: `DDI_GRAPH` + `DDI_NODES`.

use crate::{Result, StorageError, EDGES_TABLE, NODES_TABLE};
use ddigraph_graph::{Edge, Graph, GraphError, Node};
use rusqlite::{params, Connection};
use std::path::Path;

/// Replace both graph relations inside a single transaction.
pub fn write_graph(conn: &mut Connection, graph: &Graph) -> Result<()> {
    let tx = conn.transaction()?;

    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {EDGES_TABLE};
         DROP TABLE IF EXISTS {NODES_TABLE};
         CREATE TABLE {EDGES_TABLE} (
             drug_a TEXT NOT NULL,
             drug_b TEXT NOT NULL,
             weight INTEGER NOT NULL,
             mean_severity REAL NOT NULL
         );
         CREATE TABLE {NODES_TABLE} (
             drug TEXT NOT NULL,
             mean_severity REAL NOT NULL
         );"
    ))?;

    {
        let mut insert_edge = tx.prepare(&format!(
            "INSERT INTO {EDGES_TABLE} (drug_a, drug_b, weight, mean_severity) VALUES (?1, ?2, ?3, ?4)"
        ))?;
        for edge in graph.edges() {
            insert_edge.execute(params![
                edge.drug_a,
                edge.drug_b,
                edge.weight as i64,
                edge.mean_severity
            ])?;
        }

        let mut insert_node = tx.prepare(&format!(
            "INSERT INTO {NODES_TABLE} (drug, mean_severity) VALUES (?1, ?2)"
        ))?;
        for node in graph.nodes() {
            insert_node.execute(params![node.drug, node.mean_severity])?;
        }
    }

    tx.commit()?;
    tracing::info!(
        edges = graph.edge_count(),
        nodes = graph.node_count(),
        "wrote graph relations"
    );
    Ok(())
}

/// Open (or create) `path` and write the graph into it.
pub fn save_graph(path: &Path, graph: &Graph) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut conn = Connection::open(path)?;
    write_graph(&mut conn, graph)
}

/// Load a graph snapshot from the two persisted relations.
///
/// Edge rows are read back in insertion order, so neighbor ties resolve the
/// same way before and after a round trip.
pub fn load_graph(conn: &Connection) -> Result<Graph> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT drug_a, drug_b, weight, mean_severity FROM {EDGES_TABLE} ORDER BY rowid"
        ))
        .map_err(|e| StorageError::schema(EDGES_TABLE, e))?;
    let edges = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, f64>(3)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| StorageError::schema(EDGES_TABLE, e))?;

    let edges = edges
        .into_iter()
        .map(|(drug_a, drug_b, weight, mean_severity)| {
            if weight <= 0 {
                return Err(GraphError::InvalidWeight {
                    drug_a,
                    drug_b,
                    weight,
                });
            }
            Ok(Edge {
                drug_a,
                drug_b,
                weight: weight as u64,
                mean_severity,
            })
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut stmt = conn
        .prepare(&format!("SELECT drug, mean_severity FROM {NODES_TABLE}"))
        .map_err(|e| StorageError::schema(NODES_TABLE, e))?;
    let nodes = stmt
        .query_map([], |row| {
            Ok(Node {
                drug: row.get(0)?,
                mean_severity: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| StorageError::schema(NODES_TABLE, e))?;

    let graph = Graph::from_parts(edges, nodes)?;
    tracing::info!(
        edges = graph.edge_count(),
        nodes = graph.node_count(),
        "loaded graph snapshot"
    );
    Ok(graph)
}

pub fn load_graph_file(path: &Path) -> Result<Graph> {
    let conn = crate::open_source(path)?;
    load_graph(&conn)
}
