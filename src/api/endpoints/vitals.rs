//! Vitals capture and the dashboard summary.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::middleware::AuthUser;
use crate::api::{ApiContext, ApiError, Envelope};
use crate::audit::{self, actions};
use crate::authz;
use crate::db::repository::vital as vital_repo;
use crate::models::enums::{Role, VitalType};
use crate::models::vital::trend_of;
use crate::models::{Vital, VitalSummary};

/// Trend window per vital type.
const DASHBOARD_WINDOW: usize = 10;

#[derive(Debug, Deserialize)]
pub struct CreateVitalRequest {
    pub vital_type: VitalType,
    pub value: f64,
    pub unit: String,
    pub recorded_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

pub async fn create_vital(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(body): Json<CreateVitalRequest>,
) -> Result<(StatusCode, Json<Envelope<Vital>>), ApiError> {
    authz::authorize(&user, &[Role::Patient])?;
    if !body.value.is_finite() || body.value < 0.0 {
        return Err(ApiError::Validation("vital value must be a non-negative number".into()));
    }

    let conn = ctx.db.lock().expect("db lock");
    let patient = super::own_patient(&conn, &user)?;

    let now = Utc::now();
    let vital = Vital {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        vital_type: body.vital_type,
        value: body.value,
        unit: body.unit,
        recorded_at: body.recorded_at.unwrap_or(now),
        notes: body.notes,
        created_at: now,
    };
    vital_repo::insert_vital(&conn, &vital)?;

    audit::record(
        &conn,
        &user.id,
        actions::RECORD_CREATE,
        "vital",
        Some(&vital.id),
        None,
    );
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok_with(vital, "vital recorded")),
    ))
}

pub async fn list_vitals(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Envelope<Vec<Vital>>>, ApiError> {
    authz::authorize(&user, &[Role::Patient])?;
    let conn = ctx.db.lock().expect("db lock");
    let patient = super::own_patient(&conn, &user)?;
    let vitals = vital_repo::list_for_patient(&conn, &patient.id)?;
    Ok(Json(Envelope::ok(vitals)))
}

/// Latest reading plus trend for every vital type the patient has recorded.
pub async fn dashboard(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Envelope<Vec<VitalSummary>>>, ApiError> {
    authz::authorize(&user, &[Role::Patient])?;
    let conn = ctx.db.lock().expect("db lock");
    let patient = super::own_patient(&conn, &user)?;

    let mut summaries = Vec::new();
    for vital_type in vital_repo::types_for_patient(&conn, &patient.id)? {
        let recent = vital_repo::recent_for_type(&conn, &patient.id, vital_type, DASHBOARD_WINDOW)?;
        let Some(latest) = recent.first() else {
            continue;
        };
        let values: Vec<f64> = recent.iter().map(|v| v.value).collect();
        summaries.push(VitalSummary {
            vital_type,
            latest_value: latest.value,
            unit: latest.unit.clone(),
            recorded_at: latest.recorded_at,
            trend: trend_of(&values),
            reading_count: recent.len(),
        });
    }
    Ok(Json(Envelope::ok(summaries)))
}
