use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::WearableStatus;

/// A stored wearable-provider link for one patient. The OAuth exchange
/// itself happens against the external provider; only the resulting
/// credentials and status live here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WearableConnection {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub provider: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub status: WearableStatus,
    pub connected_at: DateTime<Utc>,
    pub last_sync_at: Option<DateTime<Utc>>,
}
