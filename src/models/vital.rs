use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::VitalType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vital {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub vital_type: VitalType,
    pub value: f64,
    pub unit: String,
    pub recorded_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One row of the vitals dashboard: latest reading plus a coarse trend
/// over the recent window.
#[derive(Debug, Clone, Serialize)]
pub struct VitalSummary {
    pub vital_type: VitalType,
    pub latest_value: f64,
    pub unit: String,
    pub recorded_at: DateTime<Utc>,
    pub trend: Trend,
    pub reading_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

/// Compare the mean of the newer half of the series against the older half.
/// Values are expected newest-first. Fewer than four points is `Stable`.
pub fn trend_of(values: &[f64]) -> Trend {
    if values.len() < 4 {
        return Trend::Stable;
    }
    let mid = values.len() / 2;
    let recent: f64 = values[..mid].iter().sum::<f64>() / mid as f64;
    let older: f64 = values[mid..].iter().sum::<f64>() / (values.len() - mid) as f64;
    if older == 0.0 {
        return Trend::Stable;
    }
    let change = (recent - older) / older.abs();
    if change > 0.05 {
        Trend::Increasing
    } else if change < -0.05 {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_series_is_stable() {
        assert_eq!(trend_of(&[120.0, 118.0]), Trend::Stable);
    }

    #[test]
    fn rising_series_is_increasing() {
        // Newest-first: recent half well above older half.
        assert_eq!(trend_of(&[140.0, 138.0, 120.0, 118.0]), Trend::Increasing);
    }

    #[test]
    fn falling_series_is_decreasing() {
        assert_eq!(trend_of(&[100.0, 102.0, 120.0, 122.0]), Trend::Decreasing);
    }

    #[test]
    fn flat_series_is_stable() {
        assert_eq!(trend_of(&[100.0, 101.0, 100.0, 99.0]), Trend::Stable);
    }
}
