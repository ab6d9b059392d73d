//! `OpenAI` chat completions provider implementation.
//!
//! Also works against any `OpenAI`-compatible server (Ollama, vLLM,
//! llama.cpp, LM Studio) when a base URL is given.

use serde::{Deserialize, Serialize};

use super::{CompletionRequest, LlmProvider, provider_error};
use crate::AiError;

/// Model used when `AI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gpt-4o";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// `OpenAI` API provider.
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Creates a new `OpenAI` provider.
    ///
    /// `base_url` defaults to the public `OpenAI` endpoint. An empty
    /// `api_key` sends no `Authorization` header.
    #[must_use]
    pub fn new(api_key: String, model: String, base_url: Option<String>) -> Self {
        let base_url = base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        Self {
            api_key,
            model,
            base_url,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct OpenAiMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiError {
    error: OpenAiErrorDetail,
}

#[derive(Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

fn build_messages(request: &CompletionRequest<'_>) -> Vec<OpenAiMessage> {
    let system = match request.response_schema {
        Some(schema) => format!(
            "{}\n\nRespond with JSON only, matching this schema:\n{schema}",
            request.system_prompt
        ),
        None => request.system_prompt.to_string(),
    };

    vec![
        OpenAiMessage {
            role: "system",
            content: system,
        },
        OpenAiMessage {
            role: "user",
            content: request.prompt.to_string(),
        },
    ]
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, AiError> {
        let body = OpenAiRequest {
            model: &self.model,
            messages: build_messages(request),
            max_tokens: 1024,
        };

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Content-Type", "application/json")
            .json(&body);

        if !self.api_key.is_empty() {
            builder = builder.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let resp = builder.send().await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(provider_error(status, &text, |body| {
                serde_json::from_str::<OpenAiError>(body)
                    .ok()
                    .map(|e| e.error.message)
            }));
        }

        let response: OpenAiResponse = serde_json::from_str(&text)?;

        let answer = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

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
    fn base_url_trailing_slash_is_trimmed() {
        let provider = OpenAiProvider::new(
            String::new(),
            "llama3".to_string(),
            Some("http://localhost:11434/v1/".to_string()),
        );
        assert_eq!(provider.base_url, "http://localhost:11434/v1");

        let provider = OpenAiProvider::new("k".to_string(), "gpt-4o".to_string(), None);
        assert_eq!(provider.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn messages_put_schema_in_system_turn() {
        let schema = serde_json::json!({ "type": "ARRAY" });
        let request = CompletionRequest {
            system_prompt: "sys",
            prompt: "routes",
            response_schema: Some(&schema),
        };
        let messages = build_messages(&request);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("ARRAY"));
        assert_eq!(messages[1].content, "routes");
    }
}
