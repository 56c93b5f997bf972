use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A data-sharing grant by a patient. Revocation is one-way: a revoked
/// consent stays on record with `granted = false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consent {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub consent_type: String,
    pub granted_to: String,
    pub purpose: Option<String>,
    pub granted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
