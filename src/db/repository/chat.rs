use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;
use uuid::Uuid;

use crate::db::repository::{parse_ts, parse_uuid};
use crate::db::DatabaseError;

/// One saved exchange with the assistant.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub session_id: String,
    pub message: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

pub fn insert_message(conn: &Connection, msg: &ChatMessage) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO chat_messages (id, patient_id, session_id, message, response, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            msg.id.to_string(),
            msg.patient_id.to_string(),
            msg.session_id,
            msg.message,
            msg.response,
            msg.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// The most recent exchanges of one session, oldest first (prompt order).
pub fn session_history(
    conn: &Connection,
    patient_id: &Uuid,
    session_id: &str,
    limit: usize,
) -> Result<Vec<ChatMessage>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, session_id, message, response, created_at
         FROM chat_messages WHERE patient_id = ?1 AND session_id = ?2
         ORDER BY created_at DESC LIMIT ?3",
    )?;
    let rows = stmt.query_map(
        params![patient_id.to_string(), session_id, limit as i64],
        message_row,
    )?;

    let mut out = Vec::new();
    for row in rows {
        out.push(message_from_row(row?)?);
    }
    out.reverse();
    Ok(out)
}

pub fn recent_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
    limit: usize,
) -> Result<Vec<ChatMessage>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, session_id, message, response, created_at
         FROM chat_messages WHERE patient_id = ?1 ORDER BY created_at DESC LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![patient_id.to_string(), limit as i64], message_row)?;

    let mut out = Vec::new();
    for row in rows {
        out.push(message_from_row(row?)?);
    }
    Ok(out)
}

type MessageRow = (String, String, String, String, String, String);

fn message_row(row: &rusqlite::Row<'_>) -> Result<MessageRow, rusqlite::Error> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn message_from_row(row: MessageRow) -> Result<ChatMessage, DatabaseError> {
    let (id, patient_id, session_id, message, response, created_at) = row;
    Ok(ChatMessage {
        id: parse_uuid(&id)?,
        patient_id: parse_uuid(&patient_id)?,
        session_id,
        message,
        response,
        created_at: parse_ts(&created_at)?,
    })
}
