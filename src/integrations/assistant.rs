//! Health assistant chat backed by a hosted language model.

use serde::Deserialize;
use serde_json::json;

use crate::config::Settings;
use crate::db::repository::chat::ChatMessage;

const GENERATE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent";

/// Context window for the prompt, in past exchanges.
const HISTORY_WINDOW: usize = 5;

pub const UNAVAILABLE_REPLY: &str =
    "AI chat is currently unavailable. Please try again later.";
const TROUBLE_REPLY: &str =
    "I'm having trouble processing your request. Please try rephrasing your question.";

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: String,
}

/// One assistant reply. Never fails the request: without a key the fixed
/// notice comes back, and an upstream error degrades to a retry prompt.
pub async fn chat_reply(
    http: &reqwest::Client,
    settings: &Settings,
    message: &str,
    history: &[ChatMessage],
) -> String {
    let Some(key) = settings.ai_api_key.as_deref() else {
        return UNAVAILABLE_REPLY.to_string();
    };

    let prompt = build_prompt(message, history);
    let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });

    let result = async {
        let response = http
            .post(GENERATE_URL)
            .query(&[("key", key)])
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        response.json::<GenerateResponse>().await
    }
    .await;

    match result {
        Ok(generated) => generated
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text.trim().to_string())
            .unwrap_or_else(|| TROUBLE_REPLY.to_string()),
        Err(err) => {
            tracing::error!(error = %err, "assistant request failed");
            TROUBLE_REPLY.to_string()
        }
    }
}

fn build_prompt(message: &str, history: &[ChatMessage]) -> String {
    let mut context = String::new();
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    for msg in &history[start..] {
        context.push_str(&format!(
            "User: {}\nAssistant: {}\n\n",
            msg.message, msg.response
        ));
    }

    format!(
        "You are a helpful health assistant. Provide accurate health information \
         while being empathetic.\n\
         Always remind users to consult healthcare professionals for medical advice.\n\
         Never diagnose conditions or prescribe treatments.\n\n\
         Previous conversation:\n{context}\n\
         User's question: {message}\n\n\
         Provide a helpful, concise response (max 200 words):"
    )
}

/// Keyword intent detection for the chat UI's quick actions.
pub fn detect_intent(message: &str) -> (&'static str, Vec<&'static str>) {
    let lower = message.to_lowercase();
    let contains_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if contains_any(&["medication", "medicine", "drug", "pill"]) {
        (
            "medication_inquiry",
            vec!["View my medications", "Add medication", "Set reminder"],
        )
    } else if contains_any(&["symptom", "pain", "fever", "sick"]) {
        (
            "symptom_check",
            vec!["Book appointment", "Track symptoms", "Emergency contacts"],
        )
    } else if contains_any(&["appointment", "doctor", "visit"]) {
        (
            "appointment_booking",
            vec!["Book appointment", "View appointments", "Find doctor"],
        )
    } else if contains_any(&["prescription", "rx"]) {
        (
            "prescription_inquiry",
            vec![
                "Upload prescription",
                "View prescriptions",
                "Analyze prescription",
            ],
        )
    } else {
        ("general_inquiry", vec![])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_returns_fixed_notice() {
        let http = reqwest::Client::new();
        let settings = Settings::for_tests();
        let reply = chat_reply(&http, &settings, "hello", &[]).await;
        assert_eq!(reply, UNAVAILABLE_REPLY);
    }

    #[test]
    fn intent_detection_matches_keywords() {
        assert_eq!(detect_intent("Which pill should I take?").0, "medication_inquiry");
        assert_eq!(detect_intent("I have a fever").0, "symptom_check");
        assert_eq!(detect_intent("book a doctor visit").0, "appointment_booking");
        assert_eq!(detect_intent("my new Rx").0, "prescription_inquiry");
        let (intent, suggestions) = detect_intent("what is the weather");
        assert_eq!(intent, "general_inquiry");
        assert!(suggestions.is_empty());
    }

    #[test]
    fn prompt_keeps_a_bounded_history_window() {
        let history: Vec<ChatMessage> = (0..8)
            .map(|i| ChatMessage {
                id: uuid::Uuid::new_v4(),
                patient_id: uuid::Uuid::new_v4(),
                session_id: "s".into(),
                message: format!("q{i}"),
                response: format!("a{i}"),
                created_at: chrono::Utc::now(),
            })
            .collect();
        let prompt = build_prompt("latest", &history);
        assert!(!prompt.contains("q2"));
        assert!(prompt.contains("q3"));
        assert!(prompt.contains("q7"));
        assert!(prompt.contains("latest"));
    }
}
