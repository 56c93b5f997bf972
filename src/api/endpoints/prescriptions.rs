//! Prescription records.
//!
//! Uploading a prescription notifies the patient's assigned doctor over the
//! realtime channel; the notification is durable either way.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::middleware::AuthUser;
use crate::api::{ApiContext, ApiError, Envelope};
use crate::audit::{self, actions};
use crate::authz;
use crate::db::repository::{
    doctor as doctor_repo, patient as patient_repo, prescription as prescription_repo,
};
use crate::models::enums::{NotificationType, Role};
use crate::models::{ExtractedMedication, Notification, Prescription};
use crate::registry;

#[derive(Debug, Deserialize)]
pub struct CreatePrescriptionRequest {
    pub doctor_name: Option<String>,
    pub notes: Option<String>,
    pub extracted_text: Option<String>,
    #[serde(default)]
    pub medications: Vec<ExtractedMedication>,
    pub date_prescribed: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub patient_id: Option<Uuid>,
}

pub async fn create_prescription(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(body): Json<CreatePrescriptionRequest>,
) -> Result<(StatusCode, Json<Envelope<Prescription>>), ApiError> {
    authz::authorize(&user, &[Role::Patient])?;
    let conn = ctx.db.lock().expect("db lock");
    let patient = super::own_patient(&conn, &user)?;

    let prescription = Prescription {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        doctor_name: body.doctor_name,
        notes: body.notes,
        extracted_text: body.extracted_text,
        medications: body.medications,
        date_prescribed: body.date_prescribed,
        uploaded_at: Utc::now(),
    };
    prescription_repo::insert_prescription(&conn, &prescription)?;

    if let Some(doctor_id) = patient.doctor_id {
        if let Some(doctor) = doctor_repo::get_doctor_by_id(&conn, &doctor_id)? {
            let notification = Notification {
                id: Uuid::new_v4(),
                user_id: doctor.user_id,
                kind: NotificationType::PrescriptionUploaded,
                title: "New prescription".into(),
                message: format!("{} uploaded a prescription", user.name),
                read: false,
                created_at: Utc::now(),
            };
            registry::create_notification(&conn, &ctx.registry, &notification)?;
        }
    }

    audit::record(
        &conn,
        &user.id,
        actions::PRESCRIPTION_UPLOAD,
        "prescription",
        Some(&prescription.id),
        None,
    );
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok_with(prescription, "prescription uploaded")),
    ))
}

pub async fn list_prescriptions(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Envelope<Vec<Prescription>>>, ApiError> {
    authz::authorize(&user, &[Role::Patient, Role::Doctor])?;
    let conn = ctx.db.lock().expect("db lock");

    let patient = match user.role {
        Role::Patient => super::own_patient(&conn, &user)?,
        _ => {
            let patient_id = query.patient_id.ok_or_else(|| {
                ApiError::Validation("patient_id query parameter required".into())
            })?;
            let patient = patient_repo::get_patient_by_id(&conn, &patient_id)?
                .ok_or(ApiError::NotFound("patient"))?;
            authz::authorize_patient_access(&conn, &user, &patient)?;
            patient
        }
    };

    let prescriptions = prescription_repo::list_for_patient(&conn, &patient.id)?;
    Ok(Json(Envelope::ok(prescriptions)))
}

pub async fn get_prescription(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Prescription>>, ApiError> {
    let conn = ctx.db.lock().expect("db lock");
    let prescription = prescription_repo::get_prescription_by_id(&conn, &id)?
        .ok_or(ApiError::NotFound("prescription"))?;
    let patient = patient_repo::get_patient_by_id(&conn, &prescription.patient_id)?
        .ok_or(ApiError::NotFound("patient"))?;
    authz::authorize_patient_access(&conn, &user, &patient)?;

    audit::record(
        &conn,
        &user.id,
        actions::RECORD_VIEW,
        "prescription",
        Some(&prescription.id),
        None,
    );
    Ok(Json(Envelope::ok(prescription)))
}
