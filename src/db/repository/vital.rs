use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::repository::{parse_ts, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::VitalType;
use crate::models::Vital;

pub fn insert_vital(conn: &Connection, vital: &Vital) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO vitals (id, patient_id, vital_type, value, unit, recorded_at, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            vital.id.to_string(),
            vital.patient_id.to_string(),
            vital.vital_type.as_str(),
            vital.value,
            vital.unit,
            vital.recorded_at.to_rfc3339(),
            vital.notes,
            vital.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn list_for_patient(conn: &Connection, patient_id: &Uuid) -> Result<Vec<Vital>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, vital_type, value, unit, recorded_at, notes, created_at
         FROM vitals WHERE patient_id = ?1 ORDER BY recorded_at DESC",
    )?;
    let rows = stmt.query_map(params![patient_id.to_string()], vital_row)?;

    let mut vitals = Vec::new();
    for row in rows {
        vitals.push(vital_from_row(row?)?);
    }
    Ok(vitals)
}

/// Readings of one type, newest first, for the dashboard trend window.
pub fn recent_for_type(
    conn: &Connection,
    patient_id: &Uuid,
    vital_type: VitalType,
    limit: usize,
) -> Result<Vec<Vital>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, vital_type, value, unit, recorded_at, notes, created_at
         FROM vitals WHERE patient_id = ?1 AND vital_type = ?2
         ORDER BY recorded_at DESC LIMIT ?3",
    )?;
    let rows = stmt.query_map(
        params![patient_id.to_string(), vital_type.as_str(), limit as i64],
        vital_row,
    )?;

    let mut vitals = Vec::new();
    for row in rows {
        vitals.push(vital_from_row(row?)?);
    }
    Ok(vitals)
}

/// Distinct vital types the patient has recorded.
pub fn types_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<VitalType>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT vital_type FROM vitals WHERE patient_id = ?1 ORDER BY vital_type",
    )?;
    let rows = stmt.query_map(params![patient_id.to_string()], |row| {
        row.get::<_, String>(0)
    })?;

    let mut types = Vec::new();
    for row in rows {
        types.push(VitalType::from_str(&row?)?);
    }
    Ok(types)
}

type VitalRow = (
    String,
    String,
    String,
    f64,
    String,
    String,
    Option<String>,
    String,
);

fn vital_row(row: &rusqlite::Row<'_>) -> Result<VitalRow, rusqlite::Error> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn vital_from_row(row: VitalRow) -> Result<Vital, DatabaseError> {
    let (id, patient_id, vital_type, value, unit, recorded_at, notes, created_at) = row;
    Ok(Vital {
        id: parse_uuid(&id)?,
        patient_id: parse_uuid(&patient_id)?,
        vital_type: VitalType::from_str(&vital_type)?,
        value,
        unit,
        recorded_at: parse_ts(&recorded_at)?,
        notes,
        created_at: parse_ts(&created_at)?,
    })
}
