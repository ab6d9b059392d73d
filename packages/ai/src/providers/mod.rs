//! LLM provider abstraction and implementations.
//!
//! Supports Gemini, Anthropic, and `OpenAI` via a common trait. Every
//! provider answers a single-turn completion request with plain text;
//! callers that need structured output pass a JSON schema along and
//! parse the text themselves.

pub mod anthropic;
pub mod gemini;
pub mod openai;

use crate::AiError;

/// A single-turn completion request.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    /// System instructions.
    pub system_prompt: &'a str,
    /// The user prompt.
    pub prompt: &'a str,
    /// JSON schema the answer must follow, for providers that support
    /// constrained output.
    pub response_schema: Option<&'a serde_json::Value>,
}

/// Trait for LLM providers.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &'static str;

    /// Sends a completion request and returns the model's text answer.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the request fails, the provider returns an
    /// error status, or the answer contains no text.
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, AiError>;
}

/// Reads a credential through `var`.
///
/// Empty values and the literal `"undefined"` (left behind by some build
/// tools when a variable is not set) count as missing.
#[must_use]
pub fn credential(var: &dyn Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    var(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "undefined")
}

fn gemini_key(var: &dyn Fn(&str) -> Option<String>) -> Option<String> {
    credential(var, "GEMINI_API_KEY").or_else(|| credential(var, "API_KEY"))
}

fn missing_key(name: &str, remediation: &str) -> AiError {
    AiError::Config {
        message: format!("{name} environment variable not set"),
        remediation: remediation.to_string(),
    }
}

/// Creates an LLM provider based on environment variables.
///
/// If `AI_PROVIDER` is explicitly set, uses that provider. Otherwise
/// auto-detects from available credentials:
///
/// 1. `GEMINI_API_KEY` or `API_KEY` set -> Gemini
/// 2. `ANTHROPIC_API_KEY` set -> Anthropic Claude
/// 3. `OPENAI_API_KEY` set -> `OpenAI`
///
/// # Errors
///
/// Returns [`AiError::Config`] if no credentials are found or the
/// explicitly requested provider is not configured.
pub fn create_provider_from_env() -> Result<Box<dyn LlmProvider>, AiError> {
    create_provider(&|name| std::env::var(name).ok())
}

/// Same as [`create_provider_from_env`], reading variables through `var`.
///
/// # Errors
///
/// Returns [`AiError::Config`] naming the missing variable or the
/// unknown provider.
pub fn create_provider(
    var: &dyn Fn(&str) -> Option<String>,
) -> Result<Box<dyn LlmProvider>, AiError> {
    let provider = var("AI_PROVIDER")
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| detect_provider(var).to_string());
    let model = var("AI_MODEL");

    match provider.trim().to_lowercase().as_str() {
        "gemini" | "google" => {
            let api_key = gemini_key(var).ok_or_else(|| {
                missing_key(
                    "API_KEY",
                    "API Key not found. Please add API_KEY to your environment settings.",
                )
            })?;
            let model = model.unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string());
            Ok(Box::new(gemini::GeminiProvider::new(api_key, model)))
        }
        "anthropic" | "claude" => {
            let api_key = credential(var, "ANTHROPIC_API_KEY").ok_or_else(|| {
                missing_key(
                    "ANTHROPIC_API_KEY",
                    "Anthropic is selected but ANTHROPIC_API_KEY is not set. \
                     Please add it to your environment settings.",
                )
            })?;
            let model = model.unwrap_or_else(|| anthropic::DEFAULT_MODEL.to_string());
            Ok(Box::new(anthropic::AnthropicProvider::new(api_key, model)))
        }
        "openai" | "gpt" => {
            let base_url = var("AI_BASE_URL");
            // Local OpenAI-compatible servers usually run without a key.
            let api_key = match credential(var, "OPENAI_API_KEY") {
                Some(key) => key,
                None if base_url.is_some() => String::new(),
                None => {
                    return Err(missing_key(
                        "OPENAI_API_KEY",
                        "OpenAI is selected but OPENAI_API_KEY is not set. \
                         Please add it, or set AI_BASE_URL for a local server.",
                    ));
                }
            };
            let model = model.unwrap_or_else(|| openai::DEFAULT_MODEL.to_string());
            Ok(Box::new(openai::OpenAiProvider::new(api_key, model, base_url)))
        }
        other => Err(AiError::Config {
            message: format!(
                "Unknown AI provider: {other}. Use 'gemini', 'anthropic', or 'openai'."
            ),
            remediation: format!(
                "Unknown AI_PROVIDER \"{other}\". Set AI_PROVIDER to gemini, anthropic or openai."
            ),
        }),
    }
}

/// Auto-detects which provider to use based on available credentials.
///
/// Returns a provider name that matches the arms in [`create_provider`].
fn detect_provider(var: &dyn Fn(&str) -> Option<String>) -> &'static str {
    if gemini_key(var).is_some() {
        log::info!("Auto-detected AI provider: Gemini (API key found)");
        return "gemini";
    }

    if credential(var, "ANTHROPIC_API_KEY").is_some() {
        log::info!("Auto-detected AI provider: Anthropic (ANTHROPIC_API_KEY found)");
        return "anthropic";
    }

    if credential(var, "OPENAI_API_KEY").is_some() || var("AI_BASE_URL").is_some() {
        log::info!("Auto-detected AI provider: OpenAI-compatible");
        return "openai";
    }

    log::warn!(
        "No AI credentials detected. Set one of: API_KEY, GEMINI_API_KEY, \
         ANTHROPIC_API_KEY, or OPENAI_API_KEY. You can also set AI_PROVIDER explicitly."
    );

    // Fall back to gemini; will produce a clear error about the missing key
    "gemini"
}

/// Builds an [`AiError::Provider`] from a non-success response body,
/// keeping the raw body when it does not match the provider's error shape.
pub(crate) fn provider_error(
    status: reqwest::StatusCode,
    body: &str,
    extract: impl FnOnce(&str) -> Option<String>,
) -> AiError {
    AiError::Provider {
        status: Some(status.as_u16()),
        message: extract(body).unwrap_or_else(|| format!("HTTP {status}: {body}")),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn remediation(result: Result<Box<dyn LlmProvider>, AiError>) -> String {
        match result {
            Err(AiError::Config { remediation, .. }) => remediation,
            Err(e) => panic!("expected a configuration error, got {e}"),
            Ok(provider) => panic!("expected a configuration error, got {}", provider.name()),
        }
    }

    #[test]
    fn blank_and_undefined_credentials_are_missing() {
        let var = vars(&[("A", "  "), ("B", "undefined"), ("C", " key-123 ")]);
        assert_eq!(credential(&var, "A"), None);
        assert_eq!(credential(&var, "B"), None);
        assert_eq!(credential(&var, "C"), Some("key-123".to_string()));
        assert_eq!(credential(&var, "D"), None);
    }

    #[test]
    fn detects_provider_from_credentials() {
        assert_eq!(detect_provider(&vars(&[("API_KEY", "k")])), "gemini");
        assert_eq!(
            detect_provider(&vars(&[("API_KEY", "undefined"), ("ANTHROPIC_API_KEY", "k")])),
            "anthropic"
        );
        assert_eq!(
            detect_provider(&vars(&[("AI_BASE_URL", "http://localhost:11434/v1")])),
            "openai"
        );
        assert_eq!(detect_provider(&vars(&[])), "gemini");
    }

    #[test]
    fn creates_selected_provider() {
        let name = |pairs: &[(&str, &str)]| create_provider(&vars(pairs)).map(|p| p.name());

        assert_eq!(name(&[("GEMINI_API_KEY", "k")]).unwrap(), "gemini");
        assert_eq!(
            name(&[("AI_PROVIDER", "Claude"), ("ANTHROPIC_API_KEY", "k")]).unwrap(),
            "anthropic"
        );
        assert_eq!(
            name(&[
                ("AI_PROVIDER", "openai"),
                ("AI_BASE_URL", "http://localhost:11434/v1"),
            ])
            .unwrap(),
            "openai"
        );
    }

    #[test]
    fn missing_gemini_key_names_api_key() {
        let text = remediation(create_provider(&vars(&[("API_KEY", "undefined")])));
        assert_eq!(
            text,
            "API Key not found. Please add API_KEY to your environment settings."
        );
    }

    #[test]
    fn missing_key_names_selected_provider_variable() {
        let text = remediation(create_provider(&vars(&[("AI_PROVIDER", "anthropic")])));
        assert!(text.contains("ANTHROPIC_API_KEY"));
        assert!(!text.contains("add API_KEY"));

        let text = remediation(create_provider(&vars(&[("AI_PROVIDER", "openai")])));
        assert!(text.contains("OPENAI_API_KEY"));
        assert!(text.contains("AI_BASE_URL"));
    }

    #[test]
    fn unknown_provider_names_ai_provider() {
        let text = remediation(create_provider(&vars(&[
            ("AI_PROVIDER", "mistral"),
            ("API_KEY", "k"),
        ])));
        assert!(text.contains("AI_PROVIDER"));
        assert!(text.contains("mistral"));
        assert!(!text.contains("API Key not found"));
    }
}
