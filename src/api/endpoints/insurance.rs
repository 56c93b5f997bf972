//! Insurance policies on file for the signed-in patient.

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
use crate::db::repository::insurance as insurance_repo;
use crate::models::enums::Role;
use crate::models::InsurancePolicy;

#[derive(Debug, Deserialize)]
pub struct CreatePolicyRequest {
    pub provider: String,
    pub policy_number: String,
    pub coverage_type: Option<String>,
    pub valid_from: NaiveDate,
    pub valid_until: Option<NaiveDate>,
}

pub async fn create_policy(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(body): Json<CreatePolicyRequest>,
) -> Result<(StatusCode, Json<Envelope<InsurancePolicy>>), ApiError> {
    authz::authorize(&user, &[Role::Patient])?;
    if body.provider.trim().is_empty() || body.policy_number.trim().is_empty() {
        return Err(ApiError::Validation(
            "provider and policy number must not be empty".into(),
        ));
    }
    if let Some(until) = body.valid_until {
        if until < body.valid_from {
            return Err(ApiError::Validation("policy expires before it starts".into()));
        }
    }

    let conn = ctx.db.lock().expect("db lock");
    let patient = super::own_patient(&conn, &user)?;

    let now = Utc::now();
    let policy = InsurancePolicy {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        provider: body.provider.trim().to_string(),
        policy_number: body.policy_number.trim().to_string(),
        coverage_type: body.coverage_type,
        valid_from: body.valid_from,
        valid_until: body.valid_until,
        created_at: now,
        updated_at: now,
    };
    insurance_repo::insert_policy(&conn, &policy)?;

    audit::record(
        &conn,
        &user.id,
        actions::RECORD_CREATE,
        "insurance_policy",
        Some(&policy.id),
        None,
    );
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok_with(policy, "insurance policy added")),
    ))
}

pub async fn list_policies(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Envelope<Vec<InsurancePolicy>>>, ApiError> {
    authz::authorize(&user, &[Role::Patient])?;
    let conn = ctx.db.lock().expect("db lock");
    let patient = super::own_patient(&conn, &user)?;
    let policies = insurance_repo::list_for_patient(&conn, &patient.id)?;
    Ok(Json(Envelope::ok(policies)))
}
