//! Hospital lookup backed by the Google Places nearby search.

use serde::{Deserialize, Serialize};

use crate::api::ApiError;
use crate::config::Settings;

const PLACES_URL: &str = "https://maps.googleapis.com/maps/api/place/nearbysearch/json";
const MAX_RESULTS: usize = 10;

/// Fixed parameters of the emergency search: a wide radius and a short,
/// closest-first list.
const EMERGENCY_RADIUS_M: u32 = 10_000;
const EMERGENCY_MAX_RESULTS: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct Hospital {
    pub name: String,
    pub address: String,
    pub rating: Option<f64>,
    pub distance_km: f64,
    pub location: GeoPoint,
    pub is_open: Option<bool>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Deserialize)]
struct PlacesResponse {
    #[serde(default)]
    results: Vec<Place>,
}

#[derive(Deserialize)]
struct Place {
    name: Option<String>,
    vicinity: Option<String>,
    rating: Option<f64>,
    geometry: Geometry,
    opening_hours: Option<OpeningHours>,
}

#[derive(Deserialize)]
struct Geometry {
    location: GeoPoint,
}

#[derive(Deserialize)]
struct OpeningHours {
    open_now: Option<bool>,
}

/// Nearest hospitals around a point, closest first.
///
/// Without a configured key this returns two demo entries placed next to
/// the caller's coordinates. With a key, an upstream failure surfaces as
/// 503.
pub async fn nearby_hospitals(
    http: &reqwest::Client,
    settings: &Settings,
    lat: f64,
    lng: f64,
    radius_m: u32,
) -> Result<Vec<Hospital>, ApiError> {
    let Some(key) = settings.maps_api_key.as_deref() else {
        return Ok(demo_hospitals(lat, lng));
    };
    places_search(
        http,
        key,
        lat,
        lng,
        radius_m,
        ("type", "hospital"),
        MAX_RESULTS,
    )
    .await
}

/// Hospitals with round-the-clock emergency services within a fixed 10 km
/// radius, closest first. The same no-key demo fallback applies.
pub async fn emergency_hospitals(
    http: &reqwest::Client,
    settings: &Settings,
    lat: f64,
    lng: f64,
) -> Result<Vec<Hospital>, ApiError> {
    let Some(key) = settings.maps_api_key.as_deref() else {
        return Ok(demo_emergency_hospitals(lat, lng));
    };
    places_search(
        http,
        key,
        lat,
        lng,
        EMERGENCY_RADIUS_M,
        ("keyword", "emergency hospital"),
        EMERGENCY_MAX_RESULTS,
    )
    .await
}

async fn places_search(
    http: &reqwest::Client,
    key: &str,
    lat: f64,
    lng: f64,
    radius_m: u32,
    filter: (&str, &str),
    max_results: usize,
) -> Result<Vec<Hospital>, ApiError> {
    let response = http
        .get(PLACES_URL)
        .query(&[
            ("location", format!("{lat},{lng}")),
            ("radius", radius_m.to_string()),
            (filter.0, filter.1.to_string()),
            ("key", key.to_string()),
        ])
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|err| {
            tracing::error!(error = %err, "places request failed");
            ApiError::UpstreamUnavailable("hospital search")
        })?;

    let body: PlacesResponse = response.json().await.map_err(|err| {
        tracing::error!(error = %err, "places response unreadable");
        ApiError::UpstreamUnavailable("hospital search")
    })?;

    let mut hospitals: Vec<Hospital> = body
        .results
        .into_iter()
        .take(max_results)
        .map(|place| {
            let loc = place.geometry.location;
            Hospital {
                name: place.name.unwrap_or_else(|| "Unknown Hospital".into()),
                address: place.vicinity.unwrap_or_else(|| "N/A".into()),
                rating: place.rating,
                distance_km: haversine_km(lat, lng, loc.lat, loc.lng),
                location: loc,
                is_open: place.opening_hours.and_then(|h| h.open_now),
            }
        })
        .collect();

    hospitals.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    Ok(hospitals)
}

fn demo_hospitals(lat: f64, lng: f64) -> Vec<Hospital> {
    vec![
        Hospital {
            name: "City General Hospital".into(),
            address: "123 Main St".into(),
            rating: Some(4.5),
            distance_km: haversine_km(lat, lng, lat + 0.01, lng + 0.01),
            location: GeoPoint {
                lat: lat + 0.01,
                lng: lng + 0.01,
            },
            is_open: Some(true),
        },
        Hospital {
            name: "Community Medical Center".into(),
            address: "456 Oak Ave".into(),
            rating: Some(4.2),
            distance_km: haversine_km(lat, lng, lat - 0.01, lng - 0.01),
            location: GeoPoint {
                lat: lat - 0.01,
                lng: lng - 0.01,
            },
            is_open: Some(true),
        },
    ]
}

fn demo_emergency_hospitals(lat: f64, lng: f64) -> Vec<Hospital> {
    vec![Hospital {
        name: "City Emergency Hospital".into(),
        address: "789 Emergency Blvd".into(),
        rating: Some(4.7),
        distance_km: haversine_km(lat, lng, lat + 0.01, lng + 0.01),
        location: GeoPoint {
            lat: lat + 0.01,
            lng: lng + 0.01,
        },
        is_open: Some(true),
    }]
}

/// Great-circle distance in kilometers.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_matches_known_distance() {
        // Paris to London, roughly 344 km.
        let d = haversine_km(48.8566, 2.3522, 51.5074, -0.1278);
        assert!((d - 344.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn haversine_is_zero_for_same_point() {
        assert!(haversine_km(10.0, 20.0, 10.0, 20.0) < 1e-9);
    }

    #[tokio::test]
    async fn missing_key_serves_demo_data() {
        let http = reqwest::Client::new();
        let settings = Settings::for_tests();
        let hospitals = nearby_hospitals(&http, &settings, 40.0, -74.0, 5000)
            .await
            .unwrap();
        assert_eq!(hospitals.len(), 2);
        assert_eq!(hospitals[0].name, "City General Hospital");
        assert!(hospitals[0].distance_km > 0.0);
    }

    #[tokio::test]
    async fn missing_key_serves_emergency_demo_data() {
        let http = reqwest::Client::new();
        let settings = Settings::for_tests();
        let hospitals = emergency_hospitals(&http, &settings, 40.0, -74.0)
            .await
            .unwrap();
        assert_eq!(hospitals.len(), 1);
        assert_eq!(hospitals[0].name, "City Emergency Hospital");
        assert_eq!(hospitals[0].is_open, Some(true));
    }
}
