use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::repository::{parse_ts, parse_uuid};
use crate::db::DatabaseError;
use crate::models::Consent;

pub fn insert_consent(conn: &Connection, consent: &Consent) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO consents (id, patient_id, consent_type, granted_to, purpose, granted,
         created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            consent.id.to_string(),
            consent.patient_id.to_string(),
            consent.consent_type,
            consent.granted_to,
            consent.purpose,
            consent.granted as i64,
            consent.created_at.to_rfc3339(),
            consent.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn list_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Consent>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, consent_type, granted_to, purpose, granted, created_at, updated_at
         FROM consents WHERE patient_id = ?1 ORDER BY created_at DESC",
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
            row.get::<_, String>(7)?,
        ))
    })?;

    let mut consents = Vec::new();
    for row in rows {
        let (id, patient_id, consent_type, granted_to, purpose, granted, created_at, updated_at) =
            row?;
        consents.push(Consent {
            id: parse_uuid(&id)?,
            patient_id: parse_uuid(&patient_id)?,
            consent_type,
            granted_to,
            purpose,
            granted: granted != 0,
            created_at: parse_ts(&created_at)?,
            updated_at: parse_ts(&updated_at)?,
        });
    }
    Ok(consents)
}

/// One-way revocation, scoped to the owning patient. Returns false when the
/// consent is missing, owned by someone else, or already revoked.
pub fn revoke(conn: &Connection, id: &Uuid, patient_id: &Uuid) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE consents SET granted = 0, updated_at = ?3
         WHERE id = ?1 AND patient_id = ?2 AND granted = 1",
        params![
            id.to_string(),
            patient_id.to_string(),
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(changed > 0)
}
