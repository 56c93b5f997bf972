use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::repository::{parse_date, parse_ts, parse_uuid};
use crate::db::DatabaseError;
use crate::models::{ExtractedMedication, Prescription};

pub fn insert_prescription(conn: &Connection, rx: &Prescription) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO prescriptions (id, patient_id, doctor_name, notes, extracted_text,
         medications, date_prescribed, uploaded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            rx.id.to_string(),
            rx.patient_id.to_string(),
            rx.doctor_name,
            rx.notes,
            rx.extracted_text,
            serde_json::to_string(&rx.medications).unwrap_or_else(|_| "[]".into()),
            rx.date_prescribed.map(|d| d.to_string()),
            rx.uploaded_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_prescription_by_id(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<Prescription>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, patient_id, doctor_name, notes, extracted_text, medications,
             date_prescribed, uploaded_at
             FROM prescriptions WHERE id = ?1",
            params![id.to_string()],
            prescription_row,
        )
        .optional()?;
    row.map(prescription_from_row).transpose()
}

pub fn list_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Prescription>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, doctor_name, notes, extracted_text, medications, date_prescribed,
         uploaded_at
         FROM prescriptions WHERE patient_id = ?1 ORDER BY uploaded_at DESC",
    )?;
    let rows = stmt.query_map(params![patient_id.to_string()], prescription_row)?;

    let mut out = Vec::new();
    for row in rows {
        out.push(prescription_from_row(row?)?);
    }
    Ok(out)
}

type PrescriptionRow = (
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
    Option<String>,
    String,
);

fn prescription_row(row: &rusqlite::Row<'_>) -> Result<PrescriptionRow, rusqlite::Error> {
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

fn prescription_from_row(row: PrescriptionRow) -> Result<Prescription, DatabaseError> {
    let (id, patient_id, doctor_name, notes, extracted_text, meds, date_prescribed, uploaded_at) =
        row;
    let medications: Vec<ExtractedMedication> = serde_json::from_str(&meds)
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;
    Ok(Prescription {
        id: parse_uuid(&id)?,
        patient_id: parse_uuid(&patient_id)?,
        doctor_name,
        notes,
        extracted_text,
        medications,
        date_prescribed: date_prescribed.as_deref().map(parse_date).transpose()?,
        uploaded_at: parse_ts(&uploaded_at)?,
    })
}
