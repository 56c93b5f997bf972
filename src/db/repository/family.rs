use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::repository::{parse_ts, parse_uuid};
use crate::db::DatabaseError;
use crate::models::FamilyMember;

pub fn insert_member(conn: &Connection, member: &FamilyMember) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO family_members (id, patient_id, name, relationship, phone,
         is_emergency_contact, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            member.id.to_string(),
            member.patient_id.to_string(),
            member.name,
            member.relationship,
            member.phone,
            member.is_emergency_contact as i64,
            member.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn list_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<FamilyMember>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, name, relationship, phone, is_emergency_contact, created_at
         FROM family_members WHERE patient_id = ?1 ORDER BY created_at",
    )?;
    let rows = stmt.query_map(params![patient_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, i64>(5)?,
            row.get::<_, String>(6)?,
        ))
    })?;

    let mut members = Vec::new();
    for row in rows {
        let (id, patient_id, name, relationship, phone, emergency, created_at) = row?;
        members.push(FamilyMember {
            id: parse_uuid(&id)?,
            patient_id: parse_uuid(&patient_id)?,
            name,
            relationship,
            phone,
            is_emergency_contact: emergency != 0,
            created_at: parse_ts(&created_at)?,
        });
    }
    Ok(members)
}

/// Remove one member, scoped to the owning patient.
pub fn delete_member(conn: &Connection, id: &Uuid, patient_id: &Uuid) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM family_members WHERE id = ?1 AND patient_id = ?2",
        params![id.to_string(), patient_id.to_string()],
    )?;
    Ok(changed > 0)
}
