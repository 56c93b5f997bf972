use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabResult {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub test_name: String,
    pub result_value: String,
    pub unit: Option<String>,
    pub reference_range: Option<String>,
    pub test_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
