use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::repository::{parse_date, parse_ts, parse_uuid};
use crate::db::DatabaseError;
use crate::models::LabResult;

pub fn insert_lab_result(conn: &Connection, lab: &LabResult) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO lab_results (id, patient_id, test_name, result_value, unit, reference_range,
         test_date, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            lab.id.to_string(),
            lab.patient_id.to_string(),
            lab.test_name,
            lab.result_value,
            lab.unit,
            lab.reference_range,
            lab.test_date.to_string(),
            lab.notes,
            lab.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn list_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<LabResult>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, test_name, result_value, unit, reference_range, test_date, notes,
         created_at
         FROM lab_results WHERE patient_id = ?1 ORDER BY test_date DESC",
    )?;
    let rows = stmt.query_map(params![patient_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, String>(6)?,
            row.get::<_, Option<String>>(7)?,
            row.get::<_, String>(8)?,
        ))
    })?;

    let mut labs = Vec::new();
    for row in rows {
        let (id, patient_id, test_name, result_value, unit, range, test_date, notes, created_at) =
            row?;
        labs.push(LabResult {
            id: parse_uuid(&id)?,
            patient_id: parse_uuid(&patient_id)?,
            test_name,
            result_value,
            unit,
            reference_range: range,
            test_date: parse_date(&test_date)?,
            notes,
            created_at: parse_ts(&created_at)?,
        });
    }
    Ok(labs)
}
