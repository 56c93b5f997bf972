use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::repository::{parse_ts, parse_uuid};
use crate::db::DatabaseError;
use crate::models::Doctor;

pub fn insert_doctor(conn: &Connection, doctor: &Doctor) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO doctors (id, user_id, specialization, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            doctor.id.to_string(),
            doctor.user_id.to_string(),
            doctor.specialization,
            doctor.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_doctor_by_id(conn: &Connection, id: &Uuid) -> Result<Option<Doctor>, DatabaseError> {
    fetch_one(conn, "id = ?1", &id.to_string())
}

pub fn get_doctor_by_user_id(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Option<Doctor>, DatabaseError> {
    fetch_one(conn, "user_id = ?1", &user_id.to_string())
}

fn fetch_one(
    conn: &Connection,
    predicate: &str,
    arg: &str,
) -> Result<Option<Doctor>, DatabaseError> {
    let sql = format!(
        "SELECT id, user_id, specialization, created_at FROM doctors WHERE {predicate}"
    );
    let row = conn
        .query_row(&sql, params![arg], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
            ))
        })
        .optional()?;

    row.map(|(id, user_id, specialization, created_at)| {
        Ok(Doctor {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            specialization,
            created_at: parse_ts(&created_at)?,
        })
    })
    .transpose()
}
