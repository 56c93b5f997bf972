//! Nearby hospital search.

use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::middleware::AuthUser;
use crate::api::{ApiContext, ApiError, Envelope};
use crate::audit::{self, actions};
use crate::integrations::maps::{self, GeoPoint, Hospital};

const DEFAULT_RADIUS_M: u32 = 5000;
const MIN_RADIUS_M: u32 = 100;
const MAX_RADIUS_M: u32 = 50_000;

/// The number to dial while on the way.
const EMERGENCY_NUMBER: &str = "911";

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub radius: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct NearbyResponse {
    pub hospitals: Vec<Hospital>,
    pub user_location: GeoPoint,
    pub search_radius_km: f64,
    pub total_found: usize,
}

#[derive(Debug, Serialize)]
pub struct EmergencyResponse {
    pub emergency_hospitals: Vec<Hospital>,
    pub emergency_number: &'static str,
    pub user_location: GeoPoint,
}

fn check_coordinates(latitude: f64, longitude: f64) -> Result<(), ApiError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ApiError::Validation("latitude out of range".into()));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ApiError::Validation("longitude out of range".into()));
    }
    Ok(())
}

pub async fn nearby(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Envelope<NearbyResponse>>, ApiError> {
    check_coordinates(query.latitude, query.longitude)?;
    let radius = query.radius.unwrap_or(DEFAULT_RADIUS_M);
    if !(MIN_RADIUS_M..=MAX_RADIUS_M).contains(&radius) {
        return Err(ApiError::Validation(format!(
            "radius must be between {MIN_RADIUS_M} and {MAX_RADIUS_M} meters"
        )));
    }

    let hospitals = maps::nearby_hospitals(
        &ctx.http,
        &ctx.settings,
        query.latitude,
        query.longitude,
        radius,
    )
    .await?;

    {
        let conn = ctx.db.lock().expect("db lock");
        audit::record(
            &conn,
            &user.id,
            actions::HOSPITAL_SEARCH,
            "hospital",
            None,
            Some(&serde_json::json!({
                "location": { "lat": query.latitude, "lng": query.longitude },
                "count": hospitals.len(),
            })),
        );
    }

    let total_found = hospitals.len();
    Ok(Json(Envelope::ok_with(
        NearbyResponse {
            hospitals,
            user_location: GeoPoint {
                lat: query.latitude,
                lng: query.longitude,
            },
            search_radius_km: f64::from(radius) / 1000.0,
            total_found,
        },
        format!("Found {total_found} hospitals nearby"),
    )))
}

#[derive(Debug, Deserialize)]
pub struct EmergencyQuery {
    pub latitude: f64,
    pub longitude: f64,
}

pub async fn emergency(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Query(query): Query<EmergencyQuery>,
) -> Result<Json<Envelope<EmergencyResponse>>, ApiError> {
    check_coordinates(query.latitude, query.longitude)?;

    let hospitals =
        maps::emergency_hospitals(&ctx.http, &ctx.settings, query.latitude, query.longitude)
            .await?;

    {
        let conn = ctx.db.lock().expect("db lock");
        audit::record(
            &conn,
            &user.id,
            actions::HOSPITAL_SEARCH,
            "hospital",
            None,
            Some(&serde_json::json!({
                "location": { "lat": query.latitude, "lng": query.longitude },
                "count": hospitals.len(),
                "emergency": true,
            })),
        );
    }

    Ok(Json(Envelope::ok_with(
        EmergencyResponse {
            emergency_hospitals: hospitals,
            emergency_number: EMERGENCY_NUMBER,
            user_location: GeoPoint {
                lat: query.latitude,
                lng: query.longitude,
            },
        },
        "Emergency hospitals found",
    )))
}
