//! Appointment booking and status changes.

use std::str::FromStr;

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
    appointment as appointment_repo, doctor as doctor_repo, patient as patient_repo,
};
use crate::models::enums::{AppointmentStatus, ConsultationType, NotificationType, Role};
use crate::models::{Appointment, Notification};
use crate::registry;

#[derive(Debug, Deserialize)]
pub struct CreateAppointmentRequest {
    pub doctor_id: Uuid,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: String,
    pub consultation_type: ConsultationType,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub patient_id: Option<Uuid>,
}

/// Status arrives as a plain string and is parsed into the closed enum so
/// unknown values fail with 400 rather than a framework rejection.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

pub async fn create_appointment(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(body): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Envelope<Appointment>>), ApiError> {
    authz::authorize(&user, &[Role::Patient])?;
    let conn = ctx.db.lock().expect("db lock");
    let patient = super::own_patient(&conn, &user)?;
    let doctor = doctor_repo::get_doctor_by_id(&conn, &body.doctor_id)?
        .ok_or(ApiError::NotFound("doctor"))?;

    let now = Utc::now();
    let appointment = Appointment {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        doctor_id: doctor.id,
        scheduled_date: body.scheduled_date,
        scheduled_time: body.scheduled_time,
        consultation_type: body.consultation_type,
        status: AppointmentStatus::Scheduled,
        reason: body.reason,
        created_at: now,
        updated_at: now,
    };
    appointment_repo::insert_appointment(&conn, &appointment)?;

    let notification = Notification {
        id: Uuid::new_v4(),
        user_id: doctor.user_id,
        kind: NotificationType::AppointmentReminder,
        title: "New appointment".into(),
        message: format!(
            "{} booked {} on {}",
            user.name,
            appointment.consultation_type.as_str(),
            appointment.scheduled_date
        ),
        read: false,
        created_at: now,
    };
    registry::create_notification(&conn, &ctx.registry, &notification)?;

    audit::record(
        &conn,
        &user.id,
        actions::RECORD_CREATE,
        "appointment",
        Some(&appointment.id),
        None,
    );
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok_with(appointment, "appointment booked")),
    ))
}

pub async fn list_appointments(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Envelope<Vec<Appointment>>>, ApiError> {
    let conn = ctx.db.lock().expect("db lock");
    let appointments = match user.role {
        Role::Patient => {
            let patient = super::own_patient(&conn, &user)?;
            appointment_repo::list_for_patient(&conn, &patient.id)?
        }
        Role::Doctor => {
            let doctor = doctor_repo::get_doctor_by_user_id(&conn, &user.id)?
                .ok_or(ApiError::NotFound("doctor profile"))?;
            appointment_repo::list_for_doctor(&conn, &doctor.id)?
        }
        Role::Admin => {
            let patient_id = query.patient_id.ok_or_else(|| {
                ApiError::Validation("patient_id query parameter required".into())
            })?;
            appointment_repo::list_for_patient(&conn, &patient_id)?
        }
    };
    Ok(Json(Envelope::ok(appointments)))
}

pub async fn update_status(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<Envelope<Appointment>>, ApiError> {
    authz::authorize(&user, &[Role::Doctor, Role::Patient])?;
    let status = AppointmentStatus::from_str(&body.status)
        .map_err(|_| ApiError::Validation(format!("unknown appointment status: {}", body.status)))?;

    let conn = ctx.db.lock().expect("db lock");
    let appointment = appointment_repo::get_appointment_by_id(&conn, &id)?
        .ok_or(ApiError::NotFound("appointment"))?;
    let patient = patient_repo::get_patient_by_id(&conn, &appointment.patient_id)?
        .ok_or(ApiError::NotFound("patient"))?;
    authz::authorize_patient_access(&conn, &user, &patient)?;

    appointment_repo::update_status(&conn, &appointment.id, status)?;
    let updated = appointment_repo::get_appointment_by_id(&conn, &appointment.id)?
        .ok_or(ApiError::NotFound("appointment"))?;

    audit::record(
        &conn,
        &user.id,
        actions::STATUS_CHANGE,
        "appointment",
        Some(&appointment.id),
        Some(&serde_json::json!({
            "from": appointment.status.as_str(),
            "to": status.as_str(),
        })),
    );
    Ok(Json(Envelope::ok_with(updated, "status updated")))
}
