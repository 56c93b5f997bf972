//! Unauthenticated emergency lookup.
//!
//! The token is the only credential. The response is the fixed
//! `EmergencyView` allow-list; nothing else about the patient leaves this
//! endpoint.

use axum::extract::{Path, State};
use axum::Json;

use crate::api::{ApiContext, ApiError, Envelope};
use crate::audit::{self, actions};
use crate::db::repository::{patient as patient_repo, user as user_repo};
use crate::models::EmergencyView;

pub async fn emergency_lookup(
    State(ctx): State<ApiContext>,
    Path(token): Path<String>,
) -> Result<Json<Envelope<EmergencyView>>, ApiError> {
    let conn = ctx.db.lock().expect("db lock");
    let patient = patient_repo::get_patient_by_emergency_token(&conn, &token)?
        .ok_or(ApiError::NotFound("emergency record"))?;
    let owner = user_repo::get_user_by_id(&conn, &patient.user_id)?
        .ok_or(ApiError::NotFound("emergency record"))?;

    // The accessed patient's user is the audit subject; the caller is
    // anonymous by design.
    audit::record(
        &conn,
        &owner.id,
        actions::EMERGENCY_ACCESS,
        "patient",
        Some(&patient.id),
        None,
    );
    tracing::info!(patient_id = %patient.id, "emergency record accessed");

    Ok(Json(Envelope::ok(EmergencyView::from_parts(
        &owner.name,
        &patient,
    ))))
}
