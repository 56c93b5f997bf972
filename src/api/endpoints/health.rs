//! Liveness probe. Deliberately touches nothing but the process itself.

use axum::Json;

use crate::api::Envelope;
use crate::config::{APP_NAME, APP_VERSION};

pub async fn health() -> Json<Envelope<serde_json::Value>> {
    Json(Envelope::ok_with(
        serde_json::json!({
            "app": APP_NAME,
            "version": APP_VERSION,
        }),
        "healthy",
    ))
}
