//! Outbound integrations.
//!
//! Each integration degrades gracefully when its API key is absent:
//! hospital search serves demo data and the assistant answers with a
//! fixed notice. Missing keys never take the endpoint down.

pub mod assistant;
pub mod maps;
