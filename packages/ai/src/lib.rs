#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Route safety analysis backed by an LLM provider.
//!
//! Supports Google Gemini, Anthropic Claude, and any `OpenAI`-compatible
//! server (set `AI_BASE_URL` for Ollama, vLLM, llama.cpp, LM Studio).
//! The [`analyzer::SafetyAnalyzer`] sends the candidate routes to the
//! model and gets back a score and short risk narrative per route id.
//! Failures are classified into an [`analyzer::AnalysisFailure`] and
//! [`analyzer::apply_analysis`] turns any outcome into fully-scored
//! routes, so callers never have to deal with a missing score.

pub mod analyzer;
pub mod providers;

use thiserror::Error;

/// Errors that can occur while talking to an LLM provider.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request to LLM provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider returned an error response.
    #[error("Provider error: {message}")]
    Provider {
        /// HTTP status code, when the provider returned one.
        status: Option<u16>,
        /// Description of what went wrong.
        message: String,
    },

    /// Provider answered but without any text.
    #[error("The AI returned an empty response.")]
    EmptyResponse,

    /// Provider did not answer before the deadline.
    #[error("No response from the AI within {secs}s")]
    Timeout {
        /// The configured deadline.
        secs: u64,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
        /// What the user should change to fix it.
        remediation: String,
    },
}
