use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::repository::{parse_ts, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::Role;
use crate::models::User;

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, name, email, password_hash, role, phone, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            user.id.to_string(),
            user.name,
            user.email,
            user.password_hash,
            user.role.as_str(),
            user.phone,
            user.created_at.to_rfc3339(),
            user.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_user_by_id(conn: &Connection, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, email, password_hash, role, phone, created_at, updated_at
             FROM users WHERE id = ?1",
            params![id.to_string()],
            user_row,
        )
        .optional()?;
    row.map(user_from_row).transpose()
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, email, password_hash, role, phone, created_at, updated_at
             FROM users WHERE email = ?1",
            params![email],
            user_row,
        )
        .optional()?;
    row.map(user_from_row).transpose()
}

/// Refresh `updated_at` (last-seen on login).
pub fn touch_user(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE users SET updated_at = ?1 WHERE id = ?2",
        params![chrono::Utc::now().to_rfc3339(), id.to_string()],
    )?;
    Ok(())
}

type UserRow = (
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    String,
    String,
);

fn user_row(row: &rusqlite::Row<'_>) -> Result<UserRow, rusqlite::Error> {
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

fn user_from_row(row: UserRow) -> Result<User, DatabaseError> {
    let (id, name, email, password_hash, role, phone, created_at, updated_at) = row;
    Ok(User {
        id: parse_uuid(&id)?,
        name,
        email,
        password_hash,
        role: Role::from_str(&role)?,
        phone,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use chrono::Utc;

    fn sample_user(email: &str, role: Role) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "Ada Example".into(),
            email: email.into(),
            password_hash: "pbkdf2$stub".into(),
            role,
            phone: Some("+1555000".into()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn insert_and_fetch_round_trips() {
        let conn = open_memory_database().unwrap();
        let user = sample_user("ada@example.com", Role::Patient);
        insert_user(&conn, &user).unwrap();

        let fetched = get_user_by_email(&conn, "ada@example.com")
            .unwrap()
            .unwrap();
        assert_eq!(fetched.id, user.id);
        assert_eq!(fetched.role, Role::Patient);
        assert_eq!(fetched.phone.as_deref(), Some("+1555000"));
    }

    #[test]
    fn duplicate_email_is_unique_violation() {
        let conn = open_memory_database().unwrap();
        insert_user(&conn, &sample_user("dup@example.com", Role::Patient)).unwrap();
        let err = insert_user(&conn, &sample_user("dup@example.com", Role::Doctor)).unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[test]
    fn missing_user_is_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_user_by_id(&conn, &Uuid::new_v4()).unwrap().is_none());
    }
}
