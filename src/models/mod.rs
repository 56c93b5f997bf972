pub mod appointment;
pub mod consent;
pub mod enums;
pub mod family;
pub mod insurance;
pub mod lab;
pub mod medication;
pub mod notification;
pub mod patient;
pub mod prescription;
pub mod user;
pub mod vital;
pub mod wearable;

pub use appointment::Appointment;
pub use consent::Consent;
pub use family::FamilyMember;
pub use insurance::InsurancePolicy;
pub use lab::LabResult;
pub use medication::Medication;
pub use notification::Notification;
pub use patient::{Doctor, EmergencyView, Patient};
pub use prescription::{ExtractedMedication, Prescription};
pub use user::{User, UserView};
pub use vital::{Vital, VitalSummary};
pub use wearable::WearableConnection;
