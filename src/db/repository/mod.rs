pub mod appointment;
pub mod audit;
pub mod chat;
pub mod consent;
pub mod doctor;
pub mod family;
pub mod insurance;
pub mod lab_result;
pub mod medication;
pub mod notification;
pub mod patient;
pub mod prescription;
pub mod user;
pub mod vital;
pub mod wearable;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::DatabaseError;

/// Parse a stored UUID column. Stored values are written by this
/// application, so a parse failure is a constraint violation, not input
/// validation.
pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

pub(crate) fn parse_ts(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

pub(crate) fn parse_json_list(s: &str) -> Result<Vec<String>, DatabaseError> {
    serde_json::from_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}
