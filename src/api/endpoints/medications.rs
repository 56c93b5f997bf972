//! Medication list for the signed-in patient.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::middleware::AuthUser;
use crate::api::{ApiContext, ApiError, Envelope};
use crate::audit::{self, actions};
use crate::authz;
use crate::db::repository::medication as medication_repo;
use crate::models::enums::{MedicationFrequency, Role};
use crate::models::Medication;

#[derive(Debug, Deserialize)]
pub struct CreateMedicationRequest {
    pub name: String,
    pub dosage: String,
    pub frequency: MedicationFrequency,
    pub custom_frequency: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub instructions: Option<String>,
    #[serde(default)]
    pub reminders_enabled: bool,
}

pub async fn create_medication(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(body): Json<CreateMedicationRequest>,
) -> Result<(StatusCode, Json<Envelope<Medication>>), ApiError> {
    authz::authorize(&user, &[Role::Patient])?;
    if body.name.trim().is_empty() {
        return Err(ApiError::Validation("medication name must not be empty".into()));
    }
    if body.frequency == MedicationFrequency::Custom && body.custom_frequency.is_none() {
        return Err(ApiError::Validation(
            "custom frequency requires a description".into(),
        ));
    }
    if let Some(end) = body.end_date {
        if end < body.start_date {
            return Err(ApiError::Validation("end date precedes start date".into()));
        }
    }

    let conn = ctx.db.lock().expect("db lock");
    let patient = super::own_patient(&conn, &user)?;

    let now = Utc::now();
    let medication = Medication {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        name: body.name.trim().to_string(),
        dosage: body.dosage,
        frequency: body.frequency,
        custom_frequency: body.custom_frequency,
        start_date: body.start_date,
        end_date: body.end_date,
        instructions: body.instructions,
        reminders_enabled: body.reminders_enabled,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    medication_repo::insert_medication(&conn, &medication)?;

    audit::record(
        &conn,
        &user.id,
        actions::RECORD_CREATE,
        "medication",
        Some(&medication.id),
        None,
    );
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok_with(medication, "medication added")),
    ))
}

pub async fn list_medications(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Envelope<Vec<Medication>>>, ApiError> {
    authz::authorize(&user, &[Role::Patient])?;
    let conn = ctx.db.lock().expect("db lock");
    let patient = super::own_patient(&conn, &user)?;
    let medications = medication_repo::list_for_patient(&conn, &patient.id)?;
    Ok(Json(Envelope::ok(medications)))
}
