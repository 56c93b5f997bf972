use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role-specific extension record, one-to-one with a patient user.
///
/// `emergency_token` is issued once at signup and has no update path;
/// the UNIQUE index on the column backs the cross-profile uniqueness
/// invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub user_id: Uuid,
    pub emergency_token: String,
    pub qr_svg: String,
    pub blood_group: Option<String>,
    pub allergies: Vec<String>,
    pub chronic_conditions: Vec<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub medical_summary: Option<String>,
    pub doctor_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub specialization: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The fixed field subset exposed through the unauthenticated emergency
/// lookup. Allow-list by construction: fields added to `Patient` later do
/// not appear here unless explicitly copied in.
#[derive(Debug, Clone, Serialize)]
pub struct EmergencyView {
    pub name: String,
    pub blood_group: Option<String>,
    pub allergies: Vec<String>,
    pub chronic_conditions: Vec<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

impl EmergencyView {
    pub fn from_parts(patient_name: &str, patient: &Patient) -> Self {
        Self {
            name: patient_name.to_string(),
            blood_group: patient.blood_group.clone(),
            allergies: patient.allergies.clone(),
            chronic_conditions: patient.chronic_conditions.clone(),
            emergency_contact_name: patient.emergency_contact_name.clone(),
            emergency_contact_phone: patient.emergency_contact_phone.clone(),
            date_of_birth: patient.date_of_birth,
        }
    }
}
