//! Patient profile routes.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::middleware::AuthUser;
use crate::api::{ApiContext, ApiError, Envelope};
use crate::audit::{self, actions};
use crate::authz;
use crate::db::repository::{doctor as doctor_repo, patient as patient_repo, user as user_repo};
use crate::models::enums::{NotificationType, Role};
use crate::models::{Notification, Patient, UserView};
use crate::registry;

/// Profile payload: account fields plus the patient extension record.
#[derive(Debug, Serialize)]
pub struct PatientProfile {
    pub user: UserView,
    pub patient: Patient,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePatientRequest {
    pub blood_group: Option<String>,
    pub allergies: Option<Vec<String>>,
    pub chronic_conditions: Option<Vec<String>>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub medical_summary: Option<String>,
    pub doctor_id: Option<Uuid>,
}

pub async fn get_me(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Envelope<PatientProfile>>, ApiError> {
    authz::authorize(&user, &[Role::Patient])?;
    let conn = ctx.db.lock().expect("db lock");
    let patient = super::own_patient(&conn, &user)?;

    audit::record(
        &conn,
        &user.id,
        actions::PROFILE_VIEW,
        "patient",
        Some(&patient.id),
        None,
    );
    Ok(Json(Envelope::ok(PatientProfile {
        user: UserView::from(&user),
        patient,
    })))
}

pub async fn update_me(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(body): Json<UpdatePatientRequest>,
) -> Result<Json<Envelope<PatientProfile>>, ApiError> {
    authz::authorize(&user, &[Role::Patient])?;
    let conn = ctx.db.lock().expect("db lock");
    let mut patient = super::own_patient(&conn, &user)?;
    let previous_doctor = patient.doctor_id;

    if let Some(v) = body.blood_group {
        patient.blood_group = Some(v);
    }
    if let Some(v) = body.allergies {
        patient.allergies = v;
    }
    if let Some(v) = body.chronic_conditions {
        patient.chronic_conditions = v;
    }
    if let Some(v) = body.emergency_contact_name {
        patient.emergency_contact_name = Some(v);
    }
    if let Some(v) = body.emergency_contact_phone {
        patient.emergency_contact_phone = Some(v);
    }
    if let Some(v) = body.date_of_birth {
        patient.date_of_birth = Some(v);
    }
    if let Some(v) = body.gender {
        patient.gender = Some(v);
    }
    if let Some(v) = body.address {
        patient.address = Some(v);
    }
    if let Some(v) = body.medical_summary {
        patient.medical_summary = Some(v);
    }
    if let Some(doctor_id) = body.doctor_id {
        if doctor_repo::get_doctor_by_id(&conn, &doctor_id)?.is_none() {
            return Err(ApiError::NotFound("doctor"));
        }
        patient.doctor_id = Some(doctor_id);
    }

    patient_repo::update_patient(&conn, &patient)?;
    // The store never writes these columns; keep the in-memory copy honest.
    let patient = patient_repo::get_patient_by_id(&conn, &patient.id)?
        .ok_or(ApiError::NotFound("patient profile"))?;

    if patient.doctor_id != previous_doctor {
        if let Some(doctor_id) = patient.doctor_id {
            let n = Notification {
                id: Uuid::new_v4(),
                user_id: user.id,
                kind: NotificationType::DoctorAssigned,
                title: "Doctor assigned".into(),
                message: "Your care team was updated".into(),
                read: false,
                created_at: chrono::Utc::now(),
            };
            registry::create_notification(&conn, &ctx.registry, &n)?;
            tracing::info!(patient_id = %patient.id, %doctor_id, "doctor assigned");
        }
    }

    audit::record(
        &conn,
        &user.id,
        actions::PROFILE_UPDATE,
        "patient",
        Some(&patient.id),
        None,
    );
    Ok(Json(Envelope::ok_with(
        PatientProfile {
            user: UserView::from(&user),
            patient,
        },
        "profile updated",
    )))
}

pub async fn get_patient(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<PatientProfile>>, ApiError> {
    authz::authorize(&user, &[Role::Doctor, Role::Admin])?;
    let conn = ctx.db.lock().expect("db lock");
    let patient = patient_repo::get_patient_by_id(&conn, &id)?
        .ok_or(ApiError::NotFound("patient"))?;
    authz::authorize_patient_access(&conn, &user, &patient)?;

    let owner = user_repo::get_user_by_id(&conn, &patient.user_id)?
        .ok_or(ApiError::NotFound("patient"))?;

    audit::record(
        &conn,
        &user.id,
        actions::RECORD_VIEW,
        "patient",
        Some(&patient.id),
        None,
    );
    Ok(Json(Envelope::ok(PatientProfile {
        user: UserView::from(&owner),
        patient,
    })))
}
