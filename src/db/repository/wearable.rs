use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::repository::{parse_ts, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::WearableStatus;
use crate::models::WearableConnection;

/// One connection per patient: replaces any previous row for the patient.
pub fn upsert_connection(conn: &Connection, wc: &WearableConnection) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO wearable_connections (id, patient_id, provider, access_token, refresh_token,
         status, connected_at, last_sync_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(patient_id) DO UPDATE SET
           provider = excluded.provider,
           access_token = excluded.access_token,
           refresh_token = excluded.refresh_token,
           status = excluded.status,
           connected_at = excluded.connected_at,
           last_sync_at = excluded.last_sync_at",
        params![
            wc.id.to_string(),
            wc.patient_id.to_string(),
            wc.provider,
            wc.access_token,
            wc.refresh_token,
            wc.status.as_str(),
            wc.connected_at.to_rfc3339(),
            wc.last_sync_at.map(|t| t.to_rfc3339()),
        ],
    )?;
    Ok(())
}

pub fn get_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Option<WearableConnection>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, patient_id, provider, access_token, refresh_token, status, connected_at,
             last_sync_at
             FROM wearable_connections WHERE patient_id = ?1",
            params![patient_id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, Option<String>>(7)?,
                ))
            },
        )
        .optional()?;

    row.map(
        |(id, patient_id, provider, access_token, refresh_token, status, connected_at, last_sync)| {
            Ok(WearableConnection {
                id: parse_uuid(&id)?,
                patient_id: parse_uuid(&patient_id)?,
                provider,
                access_token,
                refresh_token,
                status: WearableStatus::from_str(&status)?,
                connected_at: parse_ts(&connected_at)?,
                last_sync_at: last_sync.as_deref().map(parse_ts).transpose()?,
            })
        },
    )
    .transpose()
}

pub fn mark_synced(conn: &Connection, patient_id: &Uuid) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE wearable_connections SET last_sync_at = ?1 WHERE patient_id = ?2",
        params![chrono::Utc::now().to_rfc3339(), patient_id.to_string()],
    )?;
    Ok(())
}

pub fn delete_for_patient(conn: &Connection, patient_id: &Uuid) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM wearable_connections WHERE patient_id = ?1",
        params![patient_id.to_string()],
    )?;
    Ok(changed > 0)
}
