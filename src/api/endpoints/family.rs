//! Family members on a patient's record.

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
use crate::db::repository::family as family_repo;
use crate::models::enums::Role;
use crate::models::FamilyMember;

#[derive(Debug, Deserialize)]
pub struct CreateMemberRequest {
    pub name: String,
    pub relationship: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub is_emergency_contact: bool,
}

pub async fn add_member(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(body): Json<CreateMemberRequest>,
) -> Result<(StatusCode, Json<Envelope<FamilyMember>>), ApiError> {
    authz::authorize(&user, &[Role::Patient])?;
    if body.name.trim().is_empty() || body.relationship.trim().is_empty() {
        return Err(ApiError::Validation(
            "name and relationship must not be empty".into(),
        ));
    }

    let conn = ctx.db.lock().expect("db lock");
    let patient = super::own_patient(&conn, &user)?;

    let member = FamilyMember {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        name: body.name.trim().to_string(),
        relationship: body.relationship.trim().to_lowercase(),
        phone: body.phone,
        is_emergency_contact: body.is_emergency_contact,
        created_at: Utc::now(),
    };
    family_repo::insert_member(&conn, &member)?;

    audit::record(
        &conn,
        &user.id,
        actions::RECORD_CREATE,
        "family_member",
        Some(&member.id),
        None,
    );
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok_with(member, "family member added")),
    ))
}

pub async fn list_members(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Envelope<Vec<FamilyMember>>>, ApiError> {
    authz::authorize(&user, &[Role::Patient])?;
    let conn = ctx.db.lock().expect("db lock");
    let patient = super::own_patient(&conn, &user)?;
    let members = family_repo::list_for_patient(&conn, &patient.id)?;
    Ok(Json(Envelope::ok(members)))
}

pub async fn remove_member(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<serde_json::Value>>, ApiError> {
    authz::authorize(&user, &[Role::Patient])?;
    let conn = ctx.db.lock().expect("db lock");
    let patient = super::own_patient(&conn, &user)?;
    if !family_repo::delete_member(&conn, &id, &patient.id)? {
        return Err(ApiError::NotFound("family member"));
    }
    Ok(Json(Envelope::ok_with(
        serde_json::json!({ "id": id }),
        "family member removed",
    )))
}
