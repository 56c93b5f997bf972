//! Best-effort audit trail.
//!
//! Auditing never blocks the operation it describes: a failed insert is
//! logged and swallowed. The underlying table is append-only.

use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::audit as audit_repo;

pub mod actions {
    pub const SIGNUP: &str = "user_signup";
    pub const LOGIN: &str = "user_login";
    pub const TOKEN_REFRESH: &str = "token_refresh";
    pub const PROFILE_VIEW: &str = "profile_view";
    pub const PROFILE_UPDATE: &str = "profile_update";
    pub const RECORD_CREATE: &str = "record_create";
    pub const RECORD_VIEW: &str = "record_view";
    pub const STATUS_CHANGE: &str = "status_change";
    pub const EMERGENCY_ACCESS: &str = "emergency_access";
    pub const PRESCRIPTION_UPLOAD: &str = "prescription_uploaded";
    pub const HOSPITAL_SEARCH: &str = "hospital_search";
    pub const WEARABLE_LINK: &str = "wearable_link";
}

pub fn record(
    conn: &Connection,
    user_id: &Uuid,
    action: &str,
    resource_type: &str,
    resource_id: Option<&Uuid>,
    details: Option<&serde_json::Value>,
) {
    if let Err(err) =
        audit_repo::insert_entry(conn, user_id, action, resource_type, resource_id, details)
    {
        tracing::warn!(%user_id, action, error = %err, "audit entry lost");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use chrono::Utc;

    #[test]
    fn record_appends_entry() {
        let conn = open_memory_database().unwrap();
        let user_id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at)
             VALUES (?1, 'N', 'a@example.com', 'h', 'patient', ?2, ?2)",
            rusqlite::params![user_id.to_string(), Utc::now().to_rfc3339()],
        )
        .unwrap();

        record(
            &conn,
            &user_id,
            actions::LOGIN,
            "user",
            Some(&user_id),
            None,
        );
        assert_eq!(
            audit_repo::count_by_action(&conn, actions::LOGIN).unwrap(),
            1
        );
    }

    #[test]
    fn failed_write_is_swallowed() {
        let conn = open_memory_database().unwrap();
        conn.execute_batch("DROP TABLE audit_log").unwrap();
        // Must not panic or surface an error to the caller.
        record(&conn, &Uuid::new_v4(), actions::LOGIN, "user", None, None);
    }
}
