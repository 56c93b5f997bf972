use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::repository::{parse_date, parse_json_list, parse_ts, parse_uuid};
use crate::db::DatabaseError;
use crate::models::Patient;

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, user_id, emergency_token, qr_svg, blood_group, allergies,
         chronic_conditions, emergency_contact_name, emergency_contact_phone, date_of_birth,
         gender, address, medical_summary, doctor_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            patient.id.to_string(),
            patient.user_id.to_string(),
            patient.emergency_token,
            patient.qr_svg,
            patient.blood_group,
            serde_json::to_string(&patient.allergies).unwrap_or_else(|_| "[]".into()),
            serde_json::to_string(&patient.chronic_conditions).unwrap_or_else(|_| "[]".into()),
            patient.emergency_contact_name,
            patient.emergency_contact_phone,
            patient.date_of_birth.map(|d| d.to_string()),
            patient.gender,
            patient.address,
            patient.medical_summary,
            patient.doctor_id.map(|id| id.to_string()),
            patient.created_at.to_rfc3339(),
            patient.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Update the mutable profile fields. `emergency_token` and `qr_svg` are
/// deliberately absent from the statement: the token is immutable for the
/// life of the profile.
pub fn update_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE patients SET blood_group = ?1, allergies = ?2, chronic_conditions = ?3,
         emergency_contact_name = ?4, emergency_contact_phone = ?5, date_of_birth = ?6,
         gender = ?7, address = ?8, medical_summary = ?9, doctor_id = ?10, updated_at = ?11
         WHERE id = ?12",
        params![
            patient.blood_group,
            serde_json::to_string(&patient.allergies).unwrap_or_else(|_| "[]".into()),
            serde_json::to_string(&patient.chronic_conditions).unwrap_or_else(|_| "[]".into()),
            patient.emergency_contact_name,
            patient.emergency_contact_phone,
            patient.date_of_birth.map(|d| d.to_string()),
            patient.gender,
            patient.address,
            patient.medical_summary,
            patient.doctor_id.map(|id| id.to_string()),
            chrono::Utc::now().to_rfc3339(),
            patient.id.to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_patient_by_id(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    fetch_one(conn, "id = ?1", &id.to_string())
}

pub fn get_patient_by_user_id(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Option<Patient>, DatabaseError> {
    fetch_one(conn, "user_id = ?1", &user_id.to_string())
}

/// Exact token equality, served by the UNIQUE index. No normalization of
/// any kind is applied to the input.
pub fn get_patient_by_emergency_token(
    conn: &Connection,
    token: &str,
) -> Result<Option<Patient>, DatabaseError> {
    fetch_one(conn, "emergency_token = ?1", token)
}

fn fetch_one(
    conn: &Connection,
    predicate: &str,
    arg: &str,
) -> Result<Option<Patient>, DatabaseError> {
    let sql = format!(
        "SELECT id, user_id, emergency_token, qr_svg, blood_group, allergies, chronic_conditions,
         emergency_contact_name, emergency_contact_phone, date_of_birth, gender, address,
         medical_summary, doctor_id, created_at, updated_at
         FROM patients WHERE {predicate}"
    );
    let row = conn
        .query_row(&sql, params![arg], patient_row)
        .optional()?;
    row.map(patient_from_row).transpose()
}

struct PatientRow {
    id: String,
    user_id: String,
    emergency_token: String,
    qr_svg: String,
    blood_group: Option<String>,
    allergies: String,
    chronic_conditions: String,
    emergency_contact_name: Option<String>,
    emergency_contact_phone: Option<String>,
    date_of_birth: Option<String>,
    gender: Option<String>,
    address: Option<String>,
    medical_summary: Option<String>,
    doctor_id: Option<String>,
    created_at: String,
    updated_at: String,
}

fn patient_row(row: &rusqlite::Row<'_>) -> Result<PatientRow, rusqlite::Error> {
    Ok(PatientRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        emergency_token: row.get(2)?,
        qr_svg: row.get(3)?,
        blood_group: row.get(4)?,
        allergies: row.get(5)?,
        chronic_conditions: row.get(6)?,
        emergency_contact_name: row.get(7)?,
        emergency_contact_phone: row.get(8)?,
        date_of_birth: row.get(9)?,
        gender: row.get(10)?,
        address: row.get(11)?,
        medical_summary: row.get(12)?,
        doctor_id: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    Ok(Patient {
        id: parse_uuid(&row.id)?,
        user_id: parse_uuid(&row.user_id)?,
        emergency_token: row.emergency_token,
        qr_svg: row.qr_svg,
        blood_group: row.blood_group,
        allergies: parse_json_list(&row.allergies)?,
        chronic_conditions: parse_json_list(&row.chronic_conditions)?,
        emergency_contact_name: row.emergency_contact_name,
        emergency_contact_phone: row.emergency_contact_phone,
        date_of_birth: row.date_of_birth.as_deref().map(parse_date).transpose()?,
        gender: row.gender,
        address: row.address,
        medical_summary: row.medical_summary,
        doctor_id: row.doctor_id.as_deref().map(parse_uuid).transpose()?,
        created_at: parse_ts(&row.created_at)?,
        updated_at: parse_ts(&row.updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::user::insert_user;
    use crate::models::enums::Role;
    use crate::models::User;
    use chrono::Utc;

    fn seed_patient(conn: &Connection, token: &str) -> Patient {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: "Pat".into(),
            email: format!("{}@example.com", Uuid::new_v4()),
            password_hash: "h".into(),
            role: Role::Patient,
            phone: None,
            created_at: now,
            updated_at: now,
        };
        insert_user(conn, &user).unwrap();
        let patient = Patient {
            id: Uuid::new_v4(),
            user_id: user.id,
            emergency_token: token.into(),
            qr_svg: "<svg/>".into(),
            blood_group: Some("O+".into()),
            allergies: vec!["penicillin".into()],
            chronic_conditions: vec![],
            emergency_contact_name: None,
            emergency_contact_phone: None,
            date_of_birth: None,
            gender: None,
            address: None,
            medical_summary: None,
            doctor_id: None,
            created_at: now,
            updated_at: now,
        };
        insert_patient(conn, &patient).unwrap();
        patient
    }

    #[test]
    fn emergency_token_lookup_is_exact() {
        let conn = open_memory_database().unwrap();
        seed_patient(&conn, "AbCdEf123456789012345678901234567890");

        let hit = get_patient_by_emergency_token(&conn, "AbCdEf123456789012345678901234567890")
            .unwrap();
        assert!(hit.is_some());

        // Case-folded and prefix variants must not match.
        let folded = get_patient_by_emergency_token(&conn, "abcdef123456789012345678901234567890")
            .unwrap();
        assert!(folded.is_none());
        let prefix = get_patient_by_emergency_token(&conn, "AbCdEf").unwrap();
        assert!(prefix.is_none());
    }

    #[test]
    fn update_preserves_emergency_token() {
        let conn = open_memory_database().unwrap();
        let mut patient = seed_patient(&conn, "token-fixed-0123456789012345678901234");

        patient.blood_group = Some("AB-".into());
        patient.emergency_token = "attacker-controlled".into();
        update_patient(&conn, &patient).unwrap();

        let reloaded = get_patient_by_id(&conn, &patient.id).unwrap().unwrap();
        assert_eq!(reloaded.blood_group.as_deref(), Some("AB-"));
        assert_eq!(
            reloaded.emergency_token,
            "token-fixed-0123456789012345678901234"
        );
    }

    #[test]
    fn allergies_round_trip_as_list() {
        let conn = open_memory_database().unwrap();
        let patient = seed_patient(&conn, "tok-lists-012345678901234567890123456");
        let reloaded = get_patient_by_id(&conn, &patient.id).unwrap().unwrap();
        assert_eq!(reloaded.allergies, vec!["penicillin".to_string()]);
    }
}
