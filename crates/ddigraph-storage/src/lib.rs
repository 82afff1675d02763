//! ddigraph storage layer
//!
//! SQLite on both ends of the batch job:
//!
//! ```text
//!  source db (DRUGS, reaction view)        graph db
//!  ────────────────────────────────        ────────
//!  source::read_exposures  ──► build ──►   persist::write_graph
//!  reactions::read_reaction_records        DDI_GRAPH(drug_a, drug_b, weight, mean_severity)
//!                                          DDI_NODES(drug, mean_severity)
//!                                               │
//!                                               ▼
//!                                          persist::load_graph ──► query path
//! ```
//!
//! Both graph relations are written in one transaction: either both land or
//! neither does.

pub mod batch;
pub mod persist;
pub mod reactions;
pub mod source;

use ddigraph_graph::GraphError;
use rusqlite::types::ValueRef;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use batch::{run_batch, BatchOutcome};
pub use persist::{load_graph, load_graph_file, save_graph, write_graph};
pub use reactions::read_reaction_records;
pub use source::{open_source, read_exposures};

pub const DEFAULT_DRUGS_TABLE: &str = "DRUGS";
pub const DEFAULT_REACTIONS_VIEW: &str = "vwEventDrugReaction";
pub const EDGES_TABLE: &str = "DDI_GRAPH";
pub const NODES_TABLE: &str = "DDI_NODES";

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("schema mismatch in `{table}`: {reason}")]
    Schema { table: String, reason: String },
    #[error("source database not found: {0}")]
    MissingSource(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid persisted graph: {0}")]
    Graph(#[from] GraphError),
}

impl StorageError {
    pub(crate) fn schema(table: &str, reason: impl ToString) -> Self {
        StorageError::Schema {
            table: table.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Normalized event store.
    pub source_db: PathBuf,
    /// Output database holding `DDI_GRAPH` and `DDI_NODES`.
    pub graph_db: PathBuf,
    pub drugs_table: String,
    pub reactions_view: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            source_db: PathBuf::from("data/fda_data.db"),
            graph_db: PathBuf::from("data/ddi-graph.db"),
            drugs_table: DEFAULT_DRUGS_TABLE.to_string(),
            reactions_view: DEFAULT_REACTIONS_VIEW.to_string(),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Table and view names are interpolated into SQL, so only plain identifiers pass.
pub(crate) fn checked_identifier(name: &str) -> Result<&str> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(StorageError::schema(name, "not a plain SQL identifier"))
    }
}

/// Read a loosely typed column as text. Whole-number reals lose their `.0`
/// so `20200101.0` reads as `20200101`.
pub(crate) fn value_as_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some(format!("{}", f as i64)),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

pub(crate) fn value_as_f64(value: ValueRef<'_>) -> Option<f64> {
    match value {
        ValueRef::Integer(i) => Some(i as f64),
        ValueRef::Real(f) => Some(f),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes).ok()?.trim().parse().ok(),
        ValueRef::Null | ValueRef::Blob(_) => None,
    }
}
