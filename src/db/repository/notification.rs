use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::repository::{parse_ts, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::NotificationType;
use crate::models::Notification;

pub fn insert_notification(conn: &Connection, n: &Notification) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO notifications (id, user_id, kind, title, message, read, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            n.id.to_string(),
            n.user_id.to_string(),
            n.kind.as_str(),
            n.title,
            n.message,
            n.read as i32,
            n.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn list_for_user(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Vec<Notification>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, kind, title, message, read, created_at
         FROM notifications WHERE user_id = ?1 ORDER BY created_at DESC",
    )?;
    let rows = stmt.query_map(params![user_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, i32>(5)?,
            row.get::<_, String>(6)?,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (id, user_id, kind, title, message, read, created_at) = row?;
        out.push(Notification {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            kind: NotificationType::from_str(&kind)?,
            title,
            message,
            read: read != 0,
            created_at: parse_ts(&created_at)?,
        });
    }
    Ok(out)
}

/// Monotonic mark-read: the statement can only set the flag, never clear
/// it. Returns false when the notification does not exist or belongs to
/// another user.
pub fn mark_read(conn: &Connection, id: &Uuid, user_id: &Uuid) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE notifications SET read = 1 WHERE id = ?1 AND user_id = ?2",
        params![id.to_string(), user_id.to_string()],
    )?;
    Ok(changed > 0)
}

pub fn unread_count(conn: &Connection, user_id: &Uuid) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND read = 0",
        params![user_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use chrono::Utc;

    fn seed_user(conn: &Connection) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at)
             VALUES (?1, 'N', ?2, 'h', 'doctor', ?3, ?3)",
            params![id.to_string(), format!("{id}@example.com"), now],
        )
        .unwrap();
        id
    }

    fn sample(user_id: Uuid) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            user_id,
            kind: NotificationType::PrescriptionUploaded,
            title: "New prescription".into(),
            message: "A patient uploaded a prescription".into(),
            read: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn mark_read_is_scoped_to_owner() {
        let conn = open_memory_database().unwrap();
        let owner = seed_user(&conn);
        let other = seed_user(&conn);
        let n = sample(owner);
        insert_notification(&conn, &n).unwrap();

        assert!(!mark_read(&conn, &n.id, &other).unwrap());
        assert!(mark_read(&conn, &n.id, &owner).unwrap());

        let listed = list_for_user(&conn, &owner).unwrap();
        assert!(listed[0].read);
    }

    #[test]
    fn mark_read_never_clears() {
        let conn = open_memory_database().unwrap();
        let owner = seed_user(&conn);
        let n = sample(owner);
        insert_notification(&conn, &n).unwrap();

        mark_read(&conn, &n.id, &owner).unwrap();
        // A second call is a no-op on the flag value.
        mark_read(&conn, &n.id, &owner).unwrap();
        assert!(list_for_user(&conn, &owner).unwrap()[0].read);
        assert_eq!(unread_count(&conn, &owner).unwrap(), 0);
    }

    #[test]
    fn list_is_newest_first() {
        let conn = open_memory_database().unwrap();
        let owner = seed_user(&conn);
        let mut older = sample(owner);
        older.created_at = Utc::now() - chrono::Duration::hours(1);
        older.title = "older".into();
        let newer = sample(owner);
        insert_notification(&conn, &older).unwrap();
        insert_notification(&conn, &newer).unwrap();

        let listed = list_for_user(&conn, &owner).unwrap();
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[1].title, "older");
    }
}
