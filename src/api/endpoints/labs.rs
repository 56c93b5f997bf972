//! Lab results.

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
use crate::db::repository::lab_result as lab_repo;
use crate::models::enums::Role;
use crate::models::LabResult;

#[derive(Debug, Deserialize)]
pub struct CreateLabRequest {
    pub test_name: String,
    pub result_value: String,
    pub unit: Option<String>,
    pub reference_range: Option<String>,
    pub test_date: NaiveDate,
    pub notes: Option<String>,
}

pub async fn create_lab(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(body): Json<CreateLabRequest>,
) -> Result<(StatusCode, Json<Envelope<LabResult>>), ApiError> {
    authz::authorize(&user, &[Role::Patient])?;
    if body.test_name.trim().is_empty() {
        return Err(ApiError::Validation("test name must not be empty".into()));
    }

    let conn = ctx.db.lock().expect("db lock");
    let patient = super::own_patient(&conn, &user)?;

    let lab = LabResult {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        test_name: body.test_name.trim().to_string(),
        result_value: body.result_value,
        unit: body.unit,
        reference_range: body.reference_range,
        test_date: body.test_date,
        notes: body.notes,
        created_at: Utc::now(),
    };
    lab_repo::insert_lab_result(&conn, &lab)?;

    audit::record(
        &conn,
        &user.id,
        actions::RECORD_CREATE,
        "lab_result",
        Some(&lab.id),
        None,
    );
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok_with(lab, "lab result added")),
    ))
}

pub async fn list_labs(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Envelope<Vec<LabResult>>>, ApiError> {
    authz::authorize(&user, &[Role::Patient])?;
    let conn = ctx.db.lock().expect("db lock");
    let patient = super::own_patient(&conn, &user)?;
    let labs = lab_repo::list_for_patient(&conn, &patient.id)?;
    Ok(Json(Envelope::ok(labs)))
}
