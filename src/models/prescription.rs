use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An uploaded prescription. `extracted_text` and `medications` come from
/// the external OCR/analysis service when one is configured; both degrade
/// to empty when it is not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_name: Option<String>,
    pub notes: Option<String>,
    pub extracted_text: Option<String>,
    pub medications: Vec<ExtractedMedication>,
    pub date_prescribed: Option<NaiveDate>,
    pub uploaded_at: DateTime<Utc>,
}

/// A medication line parsed out of a prescription document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedMedication {
    pub name: String,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
}
