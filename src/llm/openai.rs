use std::time::Duration;

use agent_core::{AgentError, PlanGenerator, PlanningContext};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::prompt::PromptBuilder;
use crate::config::LlmConfig;

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_keys: Vec<String>,
    pub model: String,
    pub api_base: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl From<&LlmConfig> for OpenAiConfig {
    fn from(config: &LlmConfig) -> Self {
        Self {
            api_keys: config.api_keys.clone(),
            model: config.model.clone(),
            api_base: config.api_base.clone(),
            temperature: config.temperature,
            timeout: Duration::from_millis(config.timeout_ms.max(1)),
        }
    }
}

/// Plan generator backed by an OpenAI-compatible chat completions endpoint.
///
/// Keys are tried in order; a 429 moves on to the next key. Rejected
/// credentials are terminal, every other failure is a retryable planning error.
pub struct OpenAiPlanGenerator {
    client: Client,
    prompt: PromptBuilder,
    config: OpenAiConfig,
}

impl OpenAiPlanGenerator {
    pub fn new(config: OpenAiConfig) -> Result<Self, AgentError> {
        if config.api_keys.is_empty() {
            return Err(AgentError::invalid_request(
                "missing OpenAI API key for planner (set llm.api_keys or OPENAI_API_KEY)",
            ));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| {
                AgentError::invalid_request(format!("failed to build HTTP client: {err}"))
            })?;
        Ok(Self {
            client,
            prompt: PromptBuilder::new(),
            config,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        )
    }

    fn request_body(&self, context: &PlanningContext) -> Value {
        json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": self.prompt.system_prompt()},
                {"role": "user", "content": self.prompt.build_user_prompt(context)},
            ],
        })
    }
}

#[async_trait]
impl PlanGenerator for OpenAiPlanGenerator {
    async fn generate_plan(&self, context: &PlanningContext) -> Result<Value, AgentError> {
        let url = self.endpoint();
        let body = self.request_body(context);
        let keys = self.config.api_keys.len();

        let mut last_error = None;
        for (index, key) in self.config.api_keys.iter().enumerate() {
            let response = match self.client.post(&url).bearer_auth(key).json(&body).send().await {
                Ok(resp) => resp,
                Err(err) => {
                    last_error = Some(AgentError::planning(format!("openai request failed: {err}")));
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                let err = classify_failure(status, &text);
                if status == StatusCode::TOO_MANY_REQUESTS && index + 1 < keys {
                    warn!(
                        target: "openai",
                        attempt = index + 1,
                        remaining = keys - index - 1,
                        "{}; switching API key",
                        err
                    );
                    last_error = Some(err);
                    continue;
                }
                return Err(err);
            }

            let reply: Value = response.json().await.map_err(|err| {
                AgentError::planning(format!("openai response invalid: {err}"))
            })?;
            debug!(
                target: "openai",
                iteration = context.iteration,
                usage = %reply["usage"],
                "plan request usage"
            );
            return message_content(&reply)
                .map(Value::String)
                .ok_or_else(|| AgentError::planning("openai response missing content"));
        }

        Err(last_error
            .unwrap_or_else(|| AgentError::planning("OpenAI request exhausted all API keys")))
    }
}

/// Map a non-success response onto the agent error taxonomy.
fn classify_failure(status: StatusCode, body: &str) -> AgentError {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().chars().take(200).collect());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AgentError::invalid_request(format!("openai rejected the API key ({status}): {detail}"))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            AgentError::planning(format!("openai rate limit exceeded: {detail}"))
        }
        _ => AgentError::planning(format!("openai returned {status}: {detail}")),
    }
}

/// Text of the first choice; content-part arrays are joined line by line.
fn message_content(reply: &Value) -> Option<String> {
    let content = &reply["choices"][0]["message"]["content"];
    let text = match content {
        Value::String(text) => text.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|part| part["text"].as_str())
            .collect::<Vec<_>>()
            .join("\n"),
        _ => return None,
    };
    (!text.trim().is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(keys: &[&str]) -> OpenAiConfig {
        OpenAiConfig {
            api_keys: keys.iter().map(|k| k.to_string()).collect(),
            model: "gpt-4o-mini".into(),
            api_base: "https://api.example.com/v1/".into(),
            temperature: 0.2,
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn requires_an_api_key() {
        assert!(matches!(
            OpenAiPlanGenerator::new(config(&[])),
            Err(AgentError::InvalidRequest(_))
        ));
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let generator = OpenAiPlanGenerator::new(config(&["sk-test"])).unwrap();
        assert_eq!(
            generator.endpoint(),
            "https://api.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn rejected_key_is_terminal_and_rate_limit_is_not() {
        let body = r#"{"error": {"message": "Incorrect API key provided"}}"#;
        let err = classify_failure(StatusCode::UNAUTHORIZED, body);
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("Incorrect API key provided"));

        let err = classify_failure(StatusCode::TOO_MANY_REQUESTS, "<html>busy</html>");
        assert!(err.is_retryable());
        assert!(err.to_string().contains("rate limit"));

        assert!(classify_failure(StatusCode::BAD_GATEWAY, "").is_retryable());
    }

    #[test]
    fn content_parts_are_joined() {
        let reply = json!({"choices": [{"message": {"content": [{"text": "{\"a\":"}, {"text": "1}"}]}}]});
        assert_eq!(message_content(&reply).as_deref(), Some("{\"a\":\n1}"));
        assert_eq!(message_content(&json!({"choices": []})), None);
    }
}
