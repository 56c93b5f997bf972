use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyMember {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub name: String,
    pub relationship: String,
    pub phone: Option<String>,
    pub is_emergency_contact: bool,
    pub created_at: DateTime<Utc>,
}
