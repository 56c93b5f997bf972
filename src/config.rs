//! Environment-driven settings.
//!
//! Every knob has a development default; optional integration keys switch
//! the corresponding integration into fallback mode when absent.

use std::env;
use std::path::PathBuf;

pub const APP_NAME: &str = "Health Card";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Minimum accepted length for the token signing secret.
const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub base_url: String,
    pub database_path: PathBuf,
    pub token_secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
    pub cors_origins: Vec<String>,
    pub maps_api_key: Option<String>,
    pub ai_api_key: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("HEALTHCARD_TOKEN_SECRET must be at least {MIN_SECRET_LEN} characters")]
    WeakSecret,
    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn opt_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_i64(var: &'static str, default: i64) -> Result<i64, ConfigError> {
    match env::var(var) {
        Ok(v) => v
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value: v }),
        Err(_) => Ok(default),
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let token_secret = var_or(
            "HEALTHCARD_TOKEN_SECRET",
            "dev-only-secret-change-me-0123456789abcdef",
        );
        if token_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::WeakSecret);
        }

        let cors_origins = var_or(
            "HEALTHCARD_CORS_ORIGINS",
            "http://localhost:3000,http://localhost:5173",
        )
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

        Ok(Self {
            bind_addr: var_or("HEALTHCARD_BIND", "127.0.0.1:8000"),
            base_url: var_or("HEALTHCARD_BASE_URL", "http://localhost:8000"),
            database_path: PathBuf::from(var_or("HEALTHCARD_DB", "healthcard.db")),
            token_secret,
            access_token_minutes: parse_i64("HEALTHCARD_ACCESS_TOKEN_MINUTES", 30)?,
            refresh_token_days: parse_i64("HEALTHCARD_REFRESH_TOKEN_DAYS", 7)?,
            cors_origins,
            maps_api_key: opt_var("HEALTHCARD_MAPS_API_KEY"),
            ai_api_key: opt_var("HEALTHCARD_AI_API_KEY"),
        })
    }

    /// Settings for tests: in-memory database, no integration keys.
    pub fn for_tests() -> Self {
        Self {
            bind_addr: "127.0.0.1:0".into(),
            base_url: "http://localhost:8000".into(),
            database_path: PathBuf::from(":memory:"),
            token_secret: "test-secret-test-secret-test-secret-1234".into(),
            access_token_minutes: 30,
            refresh_token_days: 7,
            cors_origins: vec!["http://localhost:3000".into()],
            maps_api_key: None,
            ai_api_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_have_no_integration_keys() {
        let s = Settings::for_tests();
        assert!(s.maps_api_key.is_none());
        assert!(s.ai_api_key.is_none());
    }

    #[test]
    fn test_secret_meets_minimum_length() {
        let s = Settings::for_tests();
        assert!(s.token_secret.len() >= MIN_SECRET_LEN);
    }
}
