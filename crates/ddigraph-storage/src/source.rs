//! Event store reader: normalized per-drug exposure rows.

use crate::{checked_identifier, value_as_text, Result, StorageError};
use ddigraph_graph::RawExposure;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

/// Open the source database read-only. A missing file is an error rather
/// than an empty database.
pub fn open_source(path: &Path) -> Result<Connection> {
    if !path.exists() {
        return Err(StorageError::MissingSource(path.to_path_buf()));
    }
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    Ok(conn)
}

/// Read every exposure row from `table`.
///
/// Columns may be loosely typed (dates stored as integers or reals); all four
/// are read as optional text and validated later by the aggregator.
pub fn read_exposures(conn: &Connection, table: &str) -> Result<Vec<RawExposure>> {
    let table = checked_identifier(table)?;
    let sql = format!(
        "SELECT safetyreportid, medicinalproduct, drugstartdate, drugenddate FROM {table}"
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| StorageError::schema(table, e))?;

    let rows = stmt.query_map([], |row| {
        Ok(RawExposure {
            report_id: value_as_text(row.get_ref(0)?),
            drug_name: value_as_text(row.get_ref(1)?),
            start_date: value_as_text(row.get_ref(2)?),
            end_date: value_as_text(row.get_ref(3)?),
        })
    })?;

    let exposures = rows.collect::<std::result::Result<Vec<_>, _>>()?;
    tracing::info!(table, rows = exposures.len(), "read exposure rows");
    Ok(exposures)
}
