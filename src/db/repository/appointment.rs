use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::repository::{parse_date, parse_ts, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::{AppointmentStatus, ConsultationType};
use crate::models::Appointment;

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (id, patient_id, doctor_id, scheduled_date, scheduled_time,
         consultation_type, status, reason, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            appt.id.to_string(),
            appt.patient_id.to_string(),
            appt.doctor_id.to_string(),
            appt.scheduled_date.to_string(),
            appt.scheduled_time,
            appt.consultation_type.as_str(),
            appt.status.as_str(),
            appt.reason,
            appt.created_at.to_rfc3339(),
            appt.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_appointment_by_id(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<Appointment>, DatabaseError> {
    let row = conn
        .query_row(
            &select_sql("id = ?1"),
            params![id.to_string()],
            appointment_row,
        )
        .optional()?;
    row.map(appointment_from_row).transpose()
}

pub fn list_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Appointment>, DatabaseError> {
    list_where(conn, "patient_id = ?1", &patient_id.to_string())
}

pub fn list_for_doctor(
    conn: &Connection,
    doctor_id: &Uuid,
) -> Result<Vec<Appointment>, DatabaseError> {
    list_where(conn, "doctor_id = ?1", &doctor_id.to_string())
}

pub fn update_status(
    conn: &Connection,
    id: &Uuid,
    status: AppointmentStatus,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE appointments SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![
            status.as_str(),
            chrono::Utc::now().to_rfc3339(),
            id.to_string()
        ],
    )?;
    Ok(())
}

/// True when the doctor has at least one appointment with the patient.
/// Used by the ownership gate for doctors who are not the assigned doctor.
pub fn doctor_patient_link_exists(
    conn: &Connection,
    doctor_id: &Uuid,
    patient_id: &Uuid,
) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM appointments WHERE doctor_id = ?1 AND patient_id = ?2",
        params![doctor_id.to_string(), patient_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn select_sql(predicate: &str) -> String {
    format!(
        "SELECT id, patient_id, doctor_id, scheduled_date, scheduled_time, consultation_type,
         status, reason, created_at, updated_at
         FROM appointments WHERE {predicate} ORDER BY scheduled_date DESC, scheduled_time DESC"
    )
}

fn list_where(
    conn: &Connection,
    predicate: &str,
    arg: &str,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&select_sql(predicate))?;
    let rows = stmt.query_map(params![arg], appointment_row)?;

    let mut appts = Vec::new();
    for row in rows {
        appts.push(appointment_from_row(row?)?);
    }
    Ok(appts)
}

type AppointmentRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    String,
    String,
);

fn appointment_row(row: &rusqlite::Row<'_>) -> Result<AppointmentRow, rusqlite::Error> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
    ))
}

fn appointment_from_row(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    let (id, patient_id, doctor_id, date, time, ctype, status, reason, created_at, updated_at) =
        row;
    Ok(Appointment {
        id: parse_uuid(&id)?,
        patient_id: parse_uuid(&patient_id)?,
        doctor_id: parse_uuid(&doctor_id)?,
        scheduled_date: parse_date(&date)?,
        scheduled_time: time,
        consultation_type: ConsultationType::from_str(&ctype)?,
        status: AppointmentStatus::from_str(&status)?,
        reason,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}
