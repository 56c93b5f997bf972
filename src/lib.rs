//! Digital health card backend.
//!
//! Role-scoped medical records (patients, doctors, admins), QR-code
//! emergency access, and realtime notification fan-out over WebSockets,
//! backed by SQLite.

pub mod api;
pub mod audit;
pub mod auth;
pub mod authz;
pub mod config;
pub mod db;
pub mod integrations;
pub mod models;
pub mod registry;

pub use api::{ApiContext, ApiError, Envelope};
pub use config::Settings;
