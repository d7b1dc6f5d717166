//! Classification oracle
//!
//! The oracle is an external service that labels a feature prompt and explains
//! a label in plain language. Labels are expected to be "Positive" or
//! "Negative" but are passed through verbatim.

use std::time::Duration;

use serde_json::{json, Value as JsonValue};

use crate::config::OracleConfig;
use crate::error::ScreenError;
use crate::types::CanonicalRow;

const CLASSIFY_MAX_TOKENS: u32 = 50;
const EXPLAIN_MAX_TOKENS: u32 = 150;

/// Capability boundary for the classification service
pub trait Oracle {
    /// Return a label for the prompt
    fn classify(&self, prompt: &str) -> Result<String, ScreenError>;

    /// Return a plain-language explanation of a label
    fn explain(&self, label: &str) -> Result<String, ScreenError>;
}

/// Prompt asking for a Positive/Negative verdict on a canonical row
pub fn detection_prompt(row: &CanonicalRow) -> String {
    let features = row
        .values()
        .iter()
        .map(|v| v.prompt_literal())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Based on these sleep apnea related answers [{}], is the user 'Positive' or 'Negative' for sleep apnea risk? Just answer 'Positive' or 'Negative'.",
        features
    )
}

/// Prompt asking what a label means
pub fn explanation_prompt(label: &str) -> String {
    format!(
        "Explain in simple terms what '{}' means in relation to sleep apnea.",
        label
    )
}

/// Oracle backed by an OpenAI-compatible chat-completions endpoint
pub struct ChatOracle {
    agent: ureq::Agent,
    config: OracleConfig,
}

impl ChatOracle {
    pub fn new(config: OracleConfig) -> Result<Self, ScreenError> {
        if config.api_key.trim().is_empty() {
            return Err(ScreenError::Config(
                "oracle API key is not set (OPENAI_API_KEY)".to_string(),
            ));
        }
        let timeout = Duration::from_millis(config.timeout_ms);
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .user_agent(concat!("sleep-screen/", env!("CARGO_PKG_VERSION")))
            .build();
        Ok(Self { agent, config })
    }

    fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ScreenError> {
        let payload = json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": max_tokens,
            "temperature": self.config.temperature,
        });

        let response = self
            .agent
            .post(&self.config.endpoint)
            .set("Content-Type", "application/json")
            .set("Authorization", &format!("Bearer {}", self.config.api_key))
            .set("Accept", "application/json")
            .send_json(payload)
            .map_err(oracle_error_from_ureq)?;

        let body: JsonValue = serde_json::from_reader(response.into_reader())
            .map_err(|e| ScreenError::Oracle(format!("invalid response body: {}", e)))?;
        extract_message_content(&body)
    }
}

impl Oracle for ChatOracle {
    fn classify(&self, prompt: &str) -> Result<String, ScreenError> {
        self.complete(prompt, CLASSIFY_MAX_TOKENS)
    }

    fn explain(&self, label: &str) -> Result<String, ScreenError> {
        self.complete(&explanation_prompt(label), EXPLAIN_MAX_TOKENS)
    }
}

fn oracle_error_from_ureq(err: ureq::Error) -> ScreenError {
    match err {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            ScreenError::Oracle(format!("HTTP {}: {}", code, body.trim()))
        }
        ureq::Error::Transport(transport) => ScreenError::Oracle(transport.to_string()),
    }
}

/// Pull `choices[0].message.content` out of a chat-completions response
fn extract_message_content(body: &JsonValue) -> Result<String, ScreenError> {
    body.pointer("/choices/0/message/content")
        .and_then(JsonValue::as_str)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| ScreenError::Oracle("response has no message content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InputMethod, Value};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_detection_prompt_lists_values() {
        let row = CanonicalRow::new(
            InputMethod::SampleData,
            "data.csv",
            None,
            vec![Value::Integer(1), Value::from("Male"), Value::Float(6.1), Value::Missing],
        );

        assert_eq!(
            detection_prompt(&row),
            "Based on these sleep apnea related answers [1, 'Male', 6.1, nan], is the user 'Positive' or 'Negative' for sleep apnea risk? Just answer 'Positive' or 'Negative'."
        );
    }

    #[test]
    fn test_explanation_prompt() {
        assert_eq!(
            explanation_prompt("Positive"),
            "Explain in simple terms what 'Positive' means in relation to sleep apnea."
        );
    }

    #[test]
    fn test_extract_message_content() {
        let body = json!({
            "choices": [{"message": {"role": "assistant", "content": "  Negative\n"}}]
        });
        assert_eq!(extract_message_content(&body).unwrap(), "Negative");

        let empty = json!({"choices": []});
        assert!(matches!(
            extract_message_content(&empty),
            Err(ScreenError::Oracle(_))
        ));
    }

    #[test]
    fn test_chat_oracle_requires_api_key() {
        let config = OracleConfig {
            api_key: String::new(),
            ..OracleConfig::default()
        };
        assert!(matches!(ChatOracle::new(config), Err(ScreenError::Config(_))));
    }
}
