//! Signup, login, and token refresh.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use qrcode::render::svg;
use qrcode::QrCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{ApiContext, ApiError, Envelope};
use crate::audit::{self, actions};
use crate::auth::{self, TokenKind};
use crate::db::repository::{doctor as doctor_repo, patient as patient_repo, user as user_repo};
use crate::models::enums::Role;
use crate::models::{Doctor, Patient, User, UserView};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub phone: Option<String>,
    pub specialization: Option<String>,
    pub blood_group: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub user: UserView,
}

#[derive(Debug, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: &'static str,
}

pub async fn signup(
    State(ctx): State<ApiContext>,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Envelope<TokenPair>>), ApiError> {
    if body.name.trim().is_empty() {
        return Err(ApiError::Validation("name must not be empty".into()));
    }
    if !body.email.contains('@') {
        return Err(ApiError::Validation("invalid email address".into()));
    }
    check_password_policy(&body.password)?;

    let password_hash = auth::hash_password(&body.password)
        .map_err(|err| ApiError::Internal(err.to_string().into()))?;

    let conn = ctx.db.lock().expect("db lock");
    if user_repo::get_user_by_email(&conn, &body.email)?.is_some() {
        return Err(ApiError::Conflict("email already registered"));
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        name: body.name.trim().to_string(),
        email: body.email.clone(),
        password_hash,
        role: body.role,
        phone: body.phone.clone(),
        created_at: now,
        updated_at: now,
    };
    user_repo::insert_user(&conn, &user)?;

    match body.role {
        Role::Patient => {
            let emergency_token = auth::generate_opaque_token();
            let qr_svg = emergency_qr_svg(&ctx.settings.base_url, &emergency_token)?;
            let patient = Patient {
                id: Uuid::new_v4(),
                user_id: user.id,
                emergency_token,
                qr_svg,
                blood_group: body.blood_group.clone(),
                allergies: vec![],
                chronic_conditions: vec![],
                emergency_contact_name: None,
                emergency_contact_phone: None,
                date_of_birth: body.date_of_birth,
                gender: body.gender.clone(),
                address: None,
                medical_summary: None,
                doctor_id: None,
                created_at: now,
                updated_at: now,
            };
            patient_repo::insert_patient(&conn, &patient)?;
        }
        Role::Doctor => {
            let doctor = Doctor {
                id: Uuid::new_v4(),
                user_id: user.id,
                specialization: body.specialization.clone(),
                created_at: now,
            };
            doctor_repo::insert_doctor(&conn, &doctor)?;
        }
        Role::Admin => {}
    }

    audit::record(&conn, &user.id, actions::SIGNUP, "user", Some(&user.id), None);
    tracing::info!(user_id = %user.id, role = body.role.as_str(), "user signed up");

    let pair = issue_pair(&ctx, &user);
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok_with(pair, "account created")),
    ))
}

pub async fn login(
    State(ctx): State<ApiContext>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Envelope<TokenPair>>, ApiError> {
    let conn = ctx.db.lock().expect("db lock");
    let user = user_repo::get_user_by_email(&conn, &body.email)?
        .ok_or(ApiError::Unauthenticated("invalid credentials"))?;

    if !auth::verify_password(&body.password, &user.password_hash) {
        return Err(ApiError::Unauthenticated("invalid credentials"));
    }

    user_repo::touch_user(&conn, &user.id)?;
    audit::record(&conn, &user.id, actions::LOGIN, "user", Some(&user.id), None);
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(Envelope::ok_with(issue_pair(&ctx, &user), "logged in")))
}

pub async fn refresh(
    State(ctx): State<ApiContext>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<Envelope<AccessToken>>, ApiError> {
    let claims = ctx
        .codec
        .verify(&body.refresh_token)
        .map_err(|_| ApiError::Unauthenticated("invalid refresh token"))?;
    if claims.kind != TokenKind::Refresh {
        return Err(ApiError::Unauthenticated("refresh token required"));
    }

    let conn = ctx.db.lock().expect("db lock");
    let user = user_repo::get_user_by_id(&conn, &claims.sub)?
        .ok_or(ApiError::Unauthenticated("unknown user"))?;
    audit::record(
        &conn,
        &user.id,
        actions::TOKEN_REFRESH,
        "user",
        Some(&user.id),
        None,
    );

    let access_token = ctx
        .codec
        .issue_access(user.id, user.role, ctx.settings.access_token_minutes);
    Ok(Json(Envelope::ok(AccessToken {
        access_token,
        token_type: "bearer",
    })))
}

fn issue_pair(ctx: &ApiContext, user: &User) -> TokenPair {
    TokenPair {
        access_token: ctx
            .codec
            .issue_access(user.id, user.role, ctx.settings.access_token_minutes),
        refresh_token: ctx
            .codec
            .issue_refresh(user.id, user.role, ctx.settings.refresh_token_days),
        token_type: "bearer",
        user: UserView::from(user),
    }
}

/// At least 8 characters with an upper-case letter, a lower-case letter,
/// and a digit.
fn check_password_policy(password: &str) -> Result<(), ApiError> {
    let long_enough = password.chars().count() >= 8;
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if long_enough && has_upper && has_lower && has_digit {
        Ok(())
    } else {
        Err(ApiError::Validation(
            "password must be at least 8 characters with upper, lower and digit".into(),
        ))
    }
}

/// SVG QR code pointing at the public emergency URL for the token.
fn emergency_qr_svg(base_url: &str, token: &str) -> Result<String, ApiError> {
    let payload = format!("{}/emergency/{token}", base_url.trim_end_matches('/'));
    let code = QrCode::new(payload.as_bytes())
        .map_err(|err| ApiError::Internal(err.to_string().into()))?;
    Ok(code
        .render::<svg::Color>()
        .min_dimensions(200, 200)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_policy_enforced() {
        assert!(check_password_policy("Sup3rSecret").is_ok());
        assert!(check_password_policy("short1A").is_err());
        assert!(check_password_policy("alllowercase1").is_err());
        assert!(check_password_policy("ALLUPPERCASE1").is_err());
        assert!(check_password_policy("NoDigitsHere").is_err());
    }

    #[test]
    fn qr_svg_embeds_nothing_but_svg() {
        let svg = emergency_qr_svg("http://localhost:8000/", "tok123").unwrap();
        assert!(svg.starts_with("<?xml") || svg.starts_with("<svg"));
        assert!(svg.contains("svg"));
    }
}
