//! Anthropic Claude provider implementation.

use serde::{Deserialize, Serialize};

use super::{CompletionRequest, LlmProvider, provider_error};
use crate::AiError;

/// Model used when `AI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Anthropic Claude API provider.
pub struct AnthropicProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Creates a new Anthropic provider.
    #[must_use]
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }
}

/// Anthropic API request body.
#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: String,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Anthropic API response body.
#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

/// Anthropic API error response.
#[derive(Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

#[derive(Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

/// Claude has no schema-constrained output, so the schema is appended
/// to the system prompt instead.
fn system_prompt(request: &CompletionRequest<'_>) -> String {
    match request.response_schema {
        Some(schema) => format!(
            "{}\n\nRespond with JSON only, no prose and no code fences, matching this schema:\n{schema}",
            request.system_prompt
        ),
        None => request.system_prompt.to_string(),
    }
}

#[async_trait::async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, AiError> {
        let body = AnthropicRequest {
            model: &self.model,
            max_tokens: 1024,
            system: system_prompt(request),
            messages: vec![AnthropicMessage {
                role: "user",
                content: request.prompt,
            }],
        };

        let resp = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(provider_error(status, &text, |body| {
                serde_json::from_str::<AnthropicError>(body)
                    .ok()
                    .map(|e| e.error.message)
            }));
        }

        let response: AnthropicResponse = serde_json::from_str(&text)?;

        let answer: String = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicContentBlock::Text { text } => Some(text),
                AnthropicContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        if answer.trim().is_empty() {
            return Err(AiError::EmptyResponse);
        }

        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_appended_to_system_prompt() {
        let schema = serde_json::json!({ "type": "ARRAY" });
        let request = CompletionRequest {
            system_prompt: "Be terse.",
            prompt: "hi",
            response_schema: Some(&schema),
        };
        let system = system_prompt(&request);
        assert!(system.starts_with("Be terse."));
        assert!(system.contains(r#"{"type":"ARRAY"}"#));

        let plain = CompletionRequest {
            response_schema: None,
            ..request
        };
        assert_eq!(system_prompt(&plain), "Be terse.");
    }

    #[test]
    fn response_skips_non_text_blocks() {
        let body = r#"{"content":[{"type":"thinking","thinking":"..."},{"type":"text","text":"[]"}]}"#;
        let response: AnthropicResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.content.len(), 2);
        assert!(matches!(
            &response.content[1],
            AnthropicContentBlock::Text { text } if text == "[]"
        ));
    }
}
