//! Route table and CORS wiring.

use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::api::endpoints::{
    appointments, auth, chat, consents, emergency, family, health, hospitals, insurance, labs,
    medications, notifications, patients, prescriptions, vitals, wearables,
};
use crate::api::middleware::require_auth;
use crate::api::websocket;
use crate::api::ApiContext;
use crate::config::Settings;

pub fn build_router(ctx: ApiContext) -> Router {
    let protected = Router::new()
        .route("/patients/me", get(patients::get_me).patch(patients::update_me))
        .route("/patients/:id", get(patients::get_patient))
        .route(
            "/medications",
            post(medications::create_medication).get(medications::list_medications),
        )
        .route(
            "/appointments",
            post(appointments::create_appointment).get(appointments::list_appointments),
        )
        .route("/appointments/:id/status", patch(appointments::update_status))
        .route("/vitals", post(vitals::create_vital).get(vitals::list_vitals))
        .route("/vitals/dashboard", get(vitals::dashboard))
        .route("/labs", post(labs::create_lab).get(labs::list_labs))
        .route(
            "/insurance",
            post(insurance::create_policy).get(insurance::list_policies),
        )
        .route(
            "/consents",
            post(consents::create_consent).get(consents::list_consents),
        )
        .route("/consents/:id/revoke", post(consents::revoke_consent))
        .route(
            "/family",
            post(family::add_member).get(family::list_members),
        )
        .route("/family/:id", delete(family::remove_member))
        .route(
            "/prescriptions",
            post(prescriptions::create_prescription).get(prescriptions::list_prescriptions),
        )
        .route("/prescriptions/:id", get(prescriptions::get_prescription))
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/:id/read", post(notifications::mark_read))
        .route("/ai/chat", post(chat::chat))
        .route("/ai/chat/history", get(chat::history))
        .route("/hospitals/nearby", get(hospitals::nearby))
        .route("/hospitals/emergency", get(hospitals::emergency))
        .route("/wearables/connect", post(wearables::connect))
        .route("/wearables/status", get(wearables::status))
        .route("/wearables/sync", post(wearables::sync))
        .route("/wearables", delete(wearables::disconnect))
        .route_layer(middleware::from_fn_with_state(ctx.clone(), require_auth));

    // The websocket route authenticates inside the upgrade handler; the
    // emergency route is deliberately anonymous.
    let public = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/emergency/:token", get(emergency::emergency_lookup))
        .route("/ws/notifications", get(websocket::ws_upgrade))
        .route("/health", get(health::health));

    public
        .merge(protected)
        .layer(cors_layer(&ctx.settings))
        .with_state(ctx)
}

fn cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
