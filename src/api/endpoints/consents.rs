//! Data-sharing consents.
//!
//! A consent is granted at creation and can only be revoked, never
//! re-granted; the record stays on file either way.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::middleware::AuthUser;
use crate::api::{ApiContext, ApiError, Envelope};
use crate::audit::{self, actions};
use crate::authz;
use crate::db::repository::consent as consent_repo;
use crate::models::enums::Role;
use crate::models::Consent;

#[derive(Debug, Deserialize)]
pub struct CreateConsentRequest {
    pub consent_type: String,
    pub granted_to: String,
    pub purpose: Option<String>,
}

pub async fn create_consent(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(body): Json<CreateConsentRequest>,
) -> Result<(StatusCode, Json<Envelope<Consent>>), ApiError> {
    authz::authorize(&user, &[Role::Patient])?;
    if body.consent_type.trim().is_empty() || body.granted_to.trim().is_empty() {
        return Err(ApiError::Validation(
            "consent type and grantee must not be empty".into(),
        ));
    }

    let conn = ctx.db.lock().expect("db lock");
    let patient = super::own_patient(&conn, &user)?;

    let now = Utc::now();
    let consent = Consent {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        consent_type: body.consent_type.trim().to_string(),
        granted_to: body.granted_to.trim().to_string(),
        purpose: body.purpose,
        granted: true,
        created_at: now,
        updated_at: now,
    };
    consent_repo::insert_consent(&conn, &consent)?;

    audit::record(
        &conn,
        &user.id,
        actions::RECORD_CREATE,
        "consent",
        Some(&consent.id),
        None,
    );
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok_with(consent, "consent recorded")),
    ))
}

pub async fn list_consents(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Envelope<Vec<Consent>>>, ApiError> {
    authz::authorize(&user, &[Role::Patient])?;
    let conn = ctx.db.lock().expect("db lock");
    let patient = super::own_patient(&conn, &user)?;
    let consents = consent_repo::list_for_patient(&conn, &patient.id)?;
    Ok(Json(Envelope::ok(consents)))
}

/// A consent owned by another patient, already revoked, or missing is
/// indistinguishable from the caller's side.
pub async fn revoke_consent(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<serde_json::Value>>, ApiError> {
    authz::authorize(&user, &[Role::Patient])?;
    let conn = ctx.db.lock().expect("db lock");
    let patient = super::own_patient(&conn, &user)?;
    if !consent_repo::revoke(&conn, &id, &patient.id)? {
        return Err(ApiError::NotFound("consent"));
    }

    audit::record(
        &conn,
        &user.id,
        actions::STATUS_CHANGE,
        "consent",
        Some(&id),
        Some(&serde_json::json!({ "granted": false })),
    );
    Ok(Json(Envelope::ok_with(
        serde_json::json!({ "id": id, "granted": false }),
        "consent revoked",
    )))
}
