use chrono::{DateTime, Utc};
use serde::Serialize;

/// Uniform response body. Success and failure share the same shape so
/// clients can always read `status` and `message` first.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: &'static str,
    pub data: Option<T>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self::ok_with(data, "success")
    }

    pub fn ok_with(data: T, message: impl Into<String>) -> Self {
        Self {
            status: "success",
            data: Some(data),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            data: None,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_shape() {
        let body = serde_json::to_value(Envelope::ok(serde_json::json!({"n": 1}))).unwrap();
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["n"], 1);
        assert_eq!(body["message"], "success");
        assert!(body["timestamp"].is_string());
    }

    #[test]
    fn error_carries_no_data() {
        let body = serde_json::to_value(Envelope::<()>::error("nope")).unwrap();
        assert_eq!(body["status"], "error");
        assert!(body["data"].is_null());
        assert_eq!(body["message"], "nope");
    }
}
