use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::repository::{parse_date, parse_ts, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::MedicationFrequency;
use crate::models::Medication;

pub fn insert_medication(conn: &Connection, med: &Medication) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medications (id, patient_id, name, dosage, frequency, custom_frequency,
         start_date, end_date, instructions, reminders_enabled, is_active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            med.id.to_string(),
            med.patient_id.to_string(),
            med.name,
            med.dosage,
            med.frequency.as_str(),
            med.custom_frequency,
            med.start_date.to_string(),
            med.end_date.map(|d| d.to_string()),
            med.instructions,
            med.reminders_enabled as i32,
            med.is_active as i32,
            med.created_at.to_rfc3339(),
            med.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn list_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Medication>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, name, dosage, frequency, custom_frequency, start_date, end_date,
         instructions, reminders_enabled, is_active, created_at, updated_at
         FROM medications WHERE patient_id = ?1 ORDER BY created_at DESC",
    )?;

    let rows = stmt.query_map(params![patient_id.to_string()], medication_row)?;

    let mut meds = Vec::new();
    for row in rows {
        meds.push(medication_from_row(row?)?);
    }
    Ok(meds)
}

struct MedicationRow {
    id: String,
    patient_id: String,
    name: String,
    dosage: String,
    frequency: String,
    custom_frequency: Option<String>,
    start_date: String,
    end_date: Option<String>,
    instructions: Option<String>,
    reminders_enabled: i32,
    is_active: i32,
    created_at: String,
    updated_at: String,
}

fn medication_row(row: &rusqlite::Row<'_>) -> Result<MedicationRow, rusqlite::Error> {
    Ok(MedicationRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        name: row.get(2)?,
        dosage: row.get(3)?,
        frequency: row.get(4)?,
        custom_frequency: row.get(5)?,
        start_date: row.get(6)?,
        end_date: row.get(7)?,
        instructions: row.get(8)?,
        reminders_enabled: row.get(9)?,
        is_active: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn medication_from_row(row: MedicationRow) -> Result<Medication, DatabaseError> {
    Ok(Medication {
        id: parse_uuid(&row.id)?,
        patient_id: parse_uuid(&row.patient_id)?,
        name: row.name,
        dosage: row.dosage,
        frequency: MedicationFrequency::from_str(&row.frequency)?,
        custom_frequency: row.custom_frequency,
        start_date: parse_date(&row.start_date)?,
        end_date: row.end_date.as_deref().map(parse_date).transpose()?,
        instructions: row.instructions,
        reminders_enabled: row.reminders_enabled != 0,
        is_active: row.is_active != 0,
        created_at: parse_ts(&row.created_at)?,
        updated_at: parse_ts(&row.updated_at)?,
    })
}
