//! Request handlers, one file per resource family.

pub mod appointments;
pub mod auth;
pub mod chat;
pub mod consents;
pub mod emergency;
pub mod family;
pub mod health;
pub mod hospitals;
pub mod insurance;
pub mod labs;
pub mod medications;
pub mod notifications;
pub mod patients;
pub mod prescriptions;
pub mod vitals;
pub mod wearables;

use rusqlite::Connection;

use crate::api::ApiError;
use crate::db::repository::patient as patient_repo;
use crate::models::{Patient, User};

/// The caller's own patient profile, or 404 when none exists (a doctor or
/// admin token hitting a patient-only route passes the role gate upstream
/// and must not reach here).
pub(crate) fn own_patient(conn: &Connection, user: &User) -> Result<Patient, ApiError> {
    patient_repo::get_patient_by_user_id(conn, &user.id)?
        .ok_or(ApiError::NotFound("patient profile"))
}
