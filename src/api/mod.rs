//! HTTP and WebSocket surface.

pub mod endpoints;
pub mod envelope;
pub mod error;
pub mod middleware;
pub mod router;
pub mod websocket;

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::auth::TokenCodec;
use crate::config::Settings;
use crate::registry::ConnectionRegistry;

pub use envelope::Envelope;
pub use error::ApiError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct ApiContext {
    pub db: Arc<Mutex<Connection>>,
    pub registry: Arc<ConnectionRegistry>,
    pub codec: Arc<TokenCodec>,
    pub settings: Arc<Settings>,
    pub http: reqwest::Client,
}

impl ApiContext {
    pub fn new(conn: Connection, settings: Settings) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            registry: Arc::new(ConnectionRegistry::new()),
            codec: Arc::new(TokenCodec::new(&settings.token_secret)),
            settings: Arc::new(settings),
            http: reqwest::Client::new(),
        }
    }

    /// In-memory context for tests.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        let conn = crate::db::open_memory_database().expect("test database");
        Self::new(conn, Settings::for_tests())
    }
}
