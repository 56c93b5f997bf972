use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate a closed enum with as_str + FromStr + serde wire names.
/// Unknown values fail with `DatabaseError::InvalidEnum`, which the API
/// boundary surfaces as a validation error.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Role {
    Admin => "admin",
    Doctor => "doctor",
    Patient => "patient",
});

str_enum!(MedicationFrequency {
    OnceDaily => "once_daily",
    TwiceDaily => "twice_daily",
    ThreeTimesDaily => "three_times_daily",
    FourTimesDaily => "four_times_daily",
    Every4Hours => "every_4_hours",
    Every6Hours => "every_6_hours",
    Every8Hours => "every_8_hours",
    Every12Hours => "every_12_hours",
    Weekly => "weekly",
    AsNeeded => "as_needed",
    Custom => "custom",
});

str_enum!(AppointmentStatus {
    Scheduled => "scheduled",
    Confirmed => "confirmed",
    Rescheduled => "rescheduled",
    Cancelled => "cancelled",
    Completed => "completed",
    NoShow => "no_show",
});

str_enum!(ConsultationType {
    InPerson => "in_person",
    VideoCall => "video_call",
    PhoneCall => "phone_call",
    FollowUp => "follow_up",
    Emergency => "emergency",
});

str_enum!(VitalType {
    HeartRate => "heart_rate",
    BloodPressureSystolic => "blood_pressure_systolic",
    BloodPressureDiastolic => "blood_pressure_diastolic",
    Temperature => "temperature",
    OxygenSaturation => "oxygen_saturation",
    RespiratoryRate => "respiratory_rate",
    BloodGlucose => "blood_glucose",
    Weight => "weight",
    Height => "height",
    Bmi => "bmi",
});

str_enum!(NotificationType {
    PrescriptionUploaded => "prescription_uploaded",
    PatientUpdated => "patient_updated",
    DoctorAssigned => "doctor_assigned",
    AppointmentReminder => "appointment_reminder",
    MedicationReminder => "medication_reminder",
    SystemAlert => "system_alert",
});

str_enum!(WearableStatus {
    Connected => "connected",
    Expired => "expired",
    Disconnected => "disconnected",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_round_trips() {
        for role in [Role::Admin, Role::Doctor, Role::Patient] {
            assert_eq!(Role::from_str(role.as_str()).unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(Role::from_str("superuser").is_err());
    }

    #[test]
    fn appointment_status_rejects_unknown() {
        assert!(AppointmentStatus::from_str("postponed").is_err());
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&MedicationFrequency::Every4Hours).unwrap();
        assert_eq!(json, "\"every_4_hours\"");
        let back: MedicationFrequency = serde_json::from_str(&json).unwrap();
        assert_eq!(back, MedicationFrequency::Every4Hours);
    }

    #[test]
    fn notification_type_wire_name() {
        assert_eq!(
            NotificationType::PrescriptionUploaded.as_str(),
            "prescription_uploaded"
        );
    }
}
