//! Notification inbox.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::api::middleware::AuthUser;
use crate::api::{ApiContext, ApiError, Envelope};
use crate::db::repository::notification as notification_repo;
use crate::models::Notification;

#[derive(Debug, Serialize)]
pub struct Inbox {
    pub notifications: Vec<Notification>,
    pub unread_count: i64,
}

pub async fn list_notifications(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Envelope<Inbox>>, ApiError> {
    let conn = ctx.db.lock().expect("db lock");
    let notifications = notification_repo::list_for_user(&conn, &user.id)?;
    let unread_count = notification_repo::unread_count(&conn, &user.id)?;
    Ok(Json(Envelope::ok(Inbox {
        notifications,
        unread_count,
    })))
}

/// Monotonic mark-read; a notification owned by another user is
/// indistinguishable from a missing one.
pub async fn mark_read(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<serde_json::Value>>, ApiError> {
    let conn = ctx.db.lock().expect("db lock");
    if !notification_repo::mark_read(&conn, &id, &user.id)? {
        return Err(ApiError::NotFound("notification"));
    }
    Ok(Json(Envelope::ok_with(
        serde_json::json!({ "id": id, "read": true }),
        "notification marked read",
    )))
}
