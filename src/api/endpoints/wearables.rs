//! Wearable provider link.
//!
//! The OAuth exchange happens on the device against the provider; this
//! service only stores the resulting credentials and reports link status.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::middleware::AuthUser;
use crate::api::{ApiContext, ApiError, Envelope};
use crate::audit::{self, actions};
use crate::authz;
use crate::db::repository::wearable as wearable_repo;
use crate::models::enums::{Role, WearableStatus};
use crate::models::WearableConnection;

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub provider: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Status view; the stored credentials never appear in a response.
#[derive(Debug, Serialize)]
pub struct StatusView {
    pub connected: bool,
    pub provider: Option<String>,
    pub status: Option<WearableStatus>,
    pub connected_at: Option<DateTime<Utc>>,
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl StatusView {
    fn from_connection(wc: Option<&WearableConnection>) -> Self {
        match wc {
            Some(wc) => Self {
                connected: wc.status == WearableStatus::Connected,
                provider: Some(wc.provider.clone()),
                status: Some(wc.status),
                connected_at: Some(wc.connected_at),
                last_sync_at: wc.last_sync_at,
            },
            None => Self {
                connected: false,
                provider: None,
                status: None,
                connected_at: None,
                last_sync_at: None,
            },
        }
    }
}

pub async fn connect(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(body): Json<ConnectRequest>,
) -> Result<(StatusCode, Json<Envelope<StatusView>>), ApiError> {
    authz::authorize(&user, &[Role::Patient])?;
    if body.provider.trim().is_empty() || body.access_token.trim().is_empty() {
        return Err(ApiError::Validation(
            "provider and access_token are required".into(),
        ));
    }

    let conn = ctx.db.lock().expect("db lock");
    let patient = super::own_patient(&conn, &user)?;

    let wc = WearableConnection {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        provider: body.provider.trim().to_lowercase(),
        access_token: body.access_token,
        refresh_token: body.refresh_token,
        status: WearableStatus::Connected,
        connected_at: Utc::now(),
        last_sync_at: None,
    };
    wearable_repo::upsert_connection(&conn, &wc)?;

    audit::record(
        &conn,
        &user.id,
        actions::WEARABLE_LINK,
        "wearable",
        Some(&wc.id),
        Some(&serde_json::json!({ "provider": wc.provider })),
    );
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok_with(
            StatusView::from_connection(Some(&wc)),
            "wearable connected",
        )),
    ))
}

pub async fn status(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Envelope<StatusView>>, ApiError> {
    authz::authorize(&user, &[Role::Patient])?;
    let conn = ctx.db.lock().expect("db lock");
    let patient = super::own_patient(&conn, &user)?;
    let wc = wearable_repo::get_for_patient(&conn, &patient.id)?;
    Ok(Json(Envelope::ok(StatusView::from_connection(wc.as_ref()))))
}

pub async fn sync(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Envelope<StatusView>>, ApiError> {
    authz::authorize(&user, &[Role::Patient])?;
    let conn = ctx.db.lock().expect("db lock");
    let patient = super::own_patient(&conn, &user)?;
    let wc = wearable_repo::get_for_patient(&conn, &patient.id)?
        .ok_or(ApiError::NotFound("wearable connection"))?;
    if wc.status != WearableStatus::Connected {
        return Err(ApiError::Validation("wearable is not connected".into()));
    }

    wearable_repo::mark_synced(&conn, &patient.id)?;
    let refreshed = wearable_repo::get_for_patient(&conn, &patient.id)?;
    Ok(Json(Envelope::ok_with(
        StatusView::from_connection(refreshed.as_ref()),
        "sync recorded",
    )))
}

pub async fn disconnect(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Envelope<StatusView>>, ApiError> {
    authz::authorize(&user, &[Role::Patient])?;
    let conn = ctx.db.lock().expect("db lock");
    let patient = super::own_patient(&conn, &user)?;
    if !wearable_repo::delete_for_patient(&conn, &patient.id)? {
        return Err(ApiError::NotFound("wearable connection"));
    }
    Ok(Json(Envelope::ok_with(
        StatusView::from_connection(None),
        "wearable disconnected",
    )))
}
