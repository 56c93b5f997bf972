use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;

/// Append one audit entry. The table is append-only; no update or delete
/// path exists.
pub fn insert_entry(
    conn: &Connection,
    user_id: &Uuid,
    action: &str,
    resource_type: &str,
    resource_id: Option<&Uuid>,
    details: Option<&serde_json::Value>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO audit_log (user_id, action, resource_type, resource_id, details, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user_id.to_string(),
            action,
            resource_type,
            resource_id.map(|id| id.to_string()),
            details.map(|d| d.to_string()),
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn count_by_action(conn: &Connection, action: &str) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM audit_log WHERE action = ?1",
        params![action],
        |row| row.get(0),
    )?;
    Ok(count)
}
