//! Flattened report/drug/reaction rows for the analytics views.

use crate::{checked_identifier, value_as_f64, value_as_text, Result, StorageError};
use ddigraph_graph::reactions::ReactionRecord;
use rusqlite::Connection;

pub fn read_reaction_records(conn: &Connection, view: &str) -> Result<Vec<ReactionRecord>> {
    let view = checked_identifier(view)?;
    let sql = format!(
        "SELECT safetyreportid, medicinalproduct, drugindication, reaction, \
                patientsex, patientonsetage, receiptdate, serious \
         FROM {view}"
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| StorageError::schema(view, e))?;

    let rows = stmt.query_map([], |row| {
        Ok(ReactionRecord {
            report_id: value_as_text(row.get_ref(0)?).unwrap_or_default(),
            drug_name: value_as_text(row.get_ref(1)?),
            indication: value_as_text(row.get_ref(2)?),
            reaction: value_as_text(row.get_ref(3)?),
            patient_sex: value_as_text(row.get_ref(4)?),
            onset_age: value_as_f64(row.get_ref(5)?),
            receipt_date: value_as_text(row.get_ref(6)?),
            serious: value_as_text(row.get_ref(7)?),
        })
    })?;

    let records = rows.collect::<std::result::Result<Vec<_>, _>>()?;
    tracing::debug!(view, rows = records.len(), "read reaction records");
    Ok(records)
}
