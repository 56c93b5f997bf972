//! Two-tier access control: a role gate, then an ownership gate.
//!
//! Handlers call `authorize` to restrict an operation to roles, and
//! `authorize_patient_access` before touching anything belonging to a
//! specific patient.

use rusqlite::Connection;

use crate::api::ApiError;
use crate::auth::{TokenCodec, TokenError, TokenKind};
use crate::db::repository::{appointment, doctor, user};
use crate::models::enums::Role;
use crate::models::{Patient, User};

/// Resolve a bearer token to its live user record.
pub fn authenticate(
    conn: &Connection,
    codec: &TokenCodec,
    token: &str,
) -> Result<User, ApiError> {
    let claims = codec.verify(token).map_err(|err| match err {
        TokenError::Expired => ApiError::Unauthenticated("token expired"),
        _ => ApiError::Unauthenticated("invalid token"),
    })?;
    if claims.kind != TokenKind::Access {
        return Err(ApiError::Unauthenticated("access token required"));
    }
    user::get_user_by_id(conn, &claims.sub)?
        .ok_or(ApiError::Unauthenticated("unknown user"))
}

/// Role gate.
pub fn authorize(user: &User, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/// Ownership gate for patient-scoped data.
///
/// Admins pass unconditionally. A patient passes only for their own
/// profile. A doctor passes when the patient is assigned to them or an
/// appointment links the two.
pub fn authorize_patient_access(
    conn: &Connection,
    user: &User,
    patient: &Patient,
) -> Result<(), ApiError> {
    match user.role {
        Role::Admin => Ok(()),
        Role::Patient => {
            if patient.user_id == user.id {
                Ok(())
            } else {
                Err(ApiError::Forbidden)
            }
        }
        Role::Doctor => {
            let doc = doctor::get_doctor_by_user_id(conn, &user.id)?
                .ok_or(ApiError::Forbidden)?;
            if patient.doctor_id == Some(doc.id)
                || appointment::doctor_patient_link_exists(conn, &doc.id, &patient.id)?
            {
                Ok(())
            } else {
                Err(ApiError::Forbidden)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::{doctor as doctor_repo, patient as patient_repo, user as user_repo};
    use crate::models::{Doctor, Patient};
    use chrono::Utc;
    use uuid::Uuid;

    fn seed_user(conn: &Connection, role: Role) -> User {
        let now = Utc::now();
        let u = User {
            id: Uuid::new_v4(),
            name: "T".into(),
            email: format!("{}@example.com", Uuid::new_v4()),
            password_hash: "h".into(),
            role,
            phone: None,
            created_at: now,
            updated_at: now,
        };
        user_repo::insert_user(conn, &u).unwrap();
        u
    }

    fn seed_patient(conn: &Connection, user_id: Uuid, doctor_id: Option<Uuid>) -> Patient {
        let now = Utc::now();
        let p = Patient {
            id: Uuid::new_v4(),
            user_id,
            emergency_token: Uuid::new_v4().to_string(),
            qr_svg: "<svg/>".into(),
            blood_group: None,
            allergies: vec![],
            chronic_conditions: vec![],
            emergency_contact_name: None,
            emergency_contact_phone: None,
            date_of_birth: None,
            gender: None,
            address: None,
            medical_summary: None,
            doctor_id,
            created_at: now,
            updated_at: now,
        };
        patient_repo::insert_patient(conn, &p).unwrap();
        p
    }

    #[test]
    fn role_gate_rejects_other_roles() {
        let conn = open_memory_database().unwrap();
        let patient_user = seed_user(&conn, Role::Patient);
        assert!(authorize(&patient_user, &[Role::Patient]).is_ok());
        assert!(matches!(
            authorize(&patient_user, &[Role::Doctor, Role::Admin]),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn patient_only_reaches_own_profile() {
        let conn = open_memory_database().unwrap();
        let me = seed_user(&conn, Role::Patient);
        let other = seed_user(&conn, Role::Patient);
        let mine = seed_patient(&conn, me.id, None);
        let theirs = seed_patient(&conn, other.id, None);

        assert!(authorize_patient_access(&conn, &me, &mine).is_ok());
        assert!(matches!(
            authorize_patient_access(&conn, &me, &theirs),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn doctor_needs_assignment_or_appointment() {
        let conn = open_memory_database().unwrap();
        let doc_user = seed_user(&conn, Role::Doctor);
        let doc = Doctor {
            id: Uuid::new_v4(),
            user_id: doc_user.id,
            specialization: None,
            created_at: Utc::now(),
        };
        doctor_repo::insert_doctor(&conn, &doc).unwrap();

        let assigned_owner = seed_user(&conn, Role::Patient);
        let stranger_owner = seed_user(&conn, Role::Patient);
        let assigned = seed_patient(&conn, assigned_owner.id, Some(doc.id));
        let stranger = seed_patient(&conn, stranger_owner.id, None);

        assert!(authorize_patient_access(&conn, &doc_user, &assigned).is_ok());
        assert!(matches!(
            authorize_patient_access(&conn, &doc_user, &stranger),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn admin_passes_everywhere() {
        let conn = open_memory_database().unwrap();
        let admin = seed_user(&conn, Role::Admin);
        let owner = seed_user(&conn, Role::Patient);
        let p = seed_patient(&conn, owner.id, None);
        assert!(authorize_patient_access(&conn, &admin, &p).is_ok());
    }

    #[test]
    fn refresh_token_does_not_authenticate() {
        let conn = open_memory_database().unwrap();
        let u = seed_user(&conn, Role::Patient);
        let codec = TokenCodec::new("test-secret-test-secret-test-secret-1234");
        let refresh = codec.issue_refresh(u.id, u.role, 7);
        assert!(matches!(
            authenticate(&conn, &codec, &refresh),
            Err(ApiError::Unauthenticated(_))
        ));
        let access = codec.issue_access(u.id, u.role, 30);
        assert_eq!(authenticate(&conn, &codec, &access).unwrap().id, u.id);
    }
}
