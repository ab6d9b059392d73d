//! Route safety analysis.
//!
//! A [`SafetyAnalyzer`] takes the candidate routes and returns one
//! [`RouteAnalysis`] per route id it could score. The result is merged
//! back into the routes with [`apply_analysis`], which also applies the
//! default-value policy:
//!
//! | Outcome | Score | Narrative |
//! |---|---|---|
//! | route scored | clamped to 0-100 | truncated to 150 chars |
//! | route missing from the answer | 50 | "No specific risks detected..." |
//! | analyzer not configured | 50 | configuration remediation |
//! | leaked key, permission, rate limit, unavailable | 0 | failure-specific message |

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use safe_transit_route_models::{MAX_SAFETY_SCORE, TransitRoute};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::AiError;
use crate::providers::{CompletionRequest, LlmProvider, create_provider_from_env};

/// Score given to a route the analyzer could not speak to.
pub const DEFAULT_SCORE: u8 = 50;

/// Score given to every route when the analysis service fails.
pub const FAILURE_SCORE: u8 = 0;

/// Maximum narrative length, in characters.
pub const MAX_NARRATIVE_CHARS: usize = 150;

/// Narrative for routes the analyzer left out of its answer.
pub const NO_RISKS_MESSAGE: &str = "No specific risks detected for this segment.";

/// Remediation shown when no more specific advice is known.
pub const DEFAULT_REMEDIATION: &str =
    "API Key not found. Please add API_KEY to your environment settings.";

/// Deadline used when `ANALYSIS_TIMEOUT_SECS` is not set.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const SYSTEM_PROMPT: &str = "You are a pedestrian and transit safety analyst. \
You score candidate routes for how safe they are to travel, \
judging street lighting, crowd density, and crime history of each segment.";

/// Safety verdict for a single route, as returned by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteAnalysis {
    /// Id of the route this verdict is for.
    pub id: String,
    /// Score from 0 to 100, higher is safer. Not yet clamped.
    pub safety_score: f64,
    /// Short explanation of the score.
    pub risk_analysis: String,
}

/// Why an analysis produced no usable verdicts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisFailure {
    /// No credential, or an unknown provider was requested.
    #[error("analyzer is not configured: {message}")]
    Configuration {
        /// Details for the logs.
        message: String,
        /// What the user should change, shown in place of the narrative.
        remediation: String,
    },

    /// The provider reports the key as leaked and has disabled it.
    #[error("API key was reported as leaked")]
    LeakedKey,

    /// The key is valid but may not use the API.
    #[error("permission denied: {message}")]
    PermissionDenied {
        /// Details for the logs.
        message: String,
    },

    /// Quota exhausted or too many requests.
    #[error("rate limited: {message}")]
    RateLimited {
        /// Details for the logs.
        message: String,
    },

    /// Anything else: network errors, timeouts, empty or unreadable answers.
    #[error("analysis unavailable: {message}")]
    Unavailable {
        /// Details for the logs.
        message: String,
    },
}

impl AnalysisFailure {
    /// Classifies a provider error.
    #[must_use]
    pub fn classify(err: &AiError) -> Self {
        let message = err.to_string();

        let status = match err {
            AiError::Config {
                message,
                remediation,
            } => {
                return Self::Configuration {
                    message: message.clone(),
                    remediation: remediation.clone(),
                };
            }
            AiError::Provider { status, .. } => *status,
            AiError::Http(e) => e.status().map(|s| s.as_u16()),
            AiError::Json(_) | AiError::EmptyResponse | AiError::Timeout { .. } => {
                return Self::Unavailable { message };
            }
        };

        let lower = message.to_lowercase();

        if lower.contains("leaked") {
            Self::LeakedKey
        } else if matches!(status, Some(401 | 403))
            || message.contains("PERMISSION_DENIED")
            || message.contains("403")
        {
            Self::PermissionDenied { message }
        } else if status == Some(429)
            || lower.contains("quota")
            || message.contains("RESOURCE_EXHAUSTED")
            || message.contains("429")
        {
            Self::RateLimited { message }
        } else {
            Self::Unavailable { message }
        }
    }

    /// Score every route receives when the analysis fails this way.
    #[must_use]
    pub const fn fallback_score(&self) -> u8 {
        match self {
            Self::Configuration { .. } => DEFAULT_SCORE,
            Self::LeakedKey
            | Self::PermissionDenied { .. }
            | Self::RateLimited { .. }
            | Self::Unavailable { .. } => FAILURE_SCORE,
        }
    }

    /// Message shown to the user in place of a risk narrative.
    #[must_use]
    pub fn user_message(&self) -> Cow<'static, str> {
        Cow::Borrowed(match self {
            Self::Configuration { remediation, .. } => {
                return Cow::Owned(format!("Configuration Error: {remediation}"));
            }
            Self::LeakedKey => {
                "DEPLOYMENT ERROR: Your API key was reported as leaked. Generate a NEW key and update your environment variables."
            }
            Self::PermissionDenied { .. } => {
                "Access Denied: Please verify your API Key and ensure the API is enabled for your project."
            }
            Self::RateLimited { .. } => "Rate limit exceeded. Please try again in a moment.",
            Self::Unavailable { .. } => "Safety analysis service is temporarily unavailable.",
        })
    }

    /// Whether searching again later may succeed without changing config.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Unavailable { .. })
    }
}

/// Scores candidate routes for safety.
#[async_trait::async_trait]
pub trait SafetyAnalyzer: Send + Sync {
    /// Analyzes `routes` and returns verdicts keyed by route id.
    ///
    /// The answer may cover only some of the routes.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisFailure`] when no verdicts could be obtained.
    async fn analyze(&self, routes: &[TransitRoute]) -> Result<Vec<RouteAnalysis>, AnalysisFailure>;
}

/// [`SafetyAnalyzer`] that asks an LLM provider.
pub struct LlmSafetyAnalyzer {
    provider: Box<dyn LlmProvider>,
    timeout: Duration,
}

impl LlmSafetyAnalyzer {
    /// Creates an analyzer with the [`DEFAULT_TIMEOUT`].
    #[must_use]
    pub fn new(provider: Box<dyn LlmProvider>) -> Self {
        Self {
            provider,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets how long to wait for the provider.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn request(&self, routes: &[TransitRoute]) -> Result<Vec<RouteAnalysis>, AiError> {
        let prompt = build_prompt(routes)?;
        let schema = response_schema();
        let request = CompletionRequest {
            system_prompt: SYSTEM_PROMPT,
            prompt: &prompt,
            response_schema: Some(&schema),
        };

        let text = tokio::time::timeout(self.timeout, self.provider.complete(&request))
            .await
            .map_err(|_| AiError::Timeout {
                secs: self.timeout.as_secs(),
            })??;

        parse_response(&text)
    }
}

#[async_trait::async_trait]
impl SafetyAnalyzer for LlmSafetyAnalyzer {
    async fn analyze(&self, routes: &[TransitRoute]) -> Result<Vec<RouteAnalysis>, AnalysisFailure> {
        log::info!(
            "Requesting safety analysis of {} route(s) from {}",
            routes.len(),
            self.provider.name()
        );

        match self.request(routes).await {
            Ok(analyses) => {
                log::debug!("Received {} route verdict(s)", analyses.len());
                Ok(analyses)
            }
            Err(e) => {
                let failure = AnalysisFailure::classify(&e);
                log::error!("Safety analysis error from {}: {e}", self.provider.name());
                Err(failure)
            }
        }
    }
}

/// [`SafetyAnalyzer`] standing in when no provider could be configured.
///
/// Every analysis fails with [`AnalysisFailure::Configuration`], so
/// routes still come back scored with a remediation message.
pub struct UnconfiguredAnalyzer {
    message: String,
    remediation: String,
}

impl UnconfiguredAnalyzer {
    /// Creates an analyzer that reports `message` as the configuration
    /// problem.
    #[must_use]
    pub fn new(message: String) -> Self {
        Self {
            message,
            remediation: DEFAULT_REMEDIATION.to_string(),
        }
    }

    /// Replaces the advice shown to the user.
    #[must_use]
    pub fn with_remediation(mut self, remediation: String) -> Self {
        self.remediation = remediation;
        self
    }
}

#[async_trait::async_trait]
impl SafetyAnalyzer for UnconfiguredAnalyzer {
    async fn analyze(&self, _routes: &[TransitRoute]) -> Result<Vec<RouteAnalysis>, AnalysisFailure> {
        log::error!("CRITICAL: safety analyzer is not configured: {}", self.message);
        Err(AnalysisFailure::Configuration {
            message: self.message.clone(),
            remediation: self.remediation.clone(),
        })
    }
}

/// Builds the analyzer from environment variables.
///
/// Uses [`create_provider_from_env`] for the provider and
/// `ANALYSIS_TIMEOUT_SECS` for the deadline. A configuration problem does
/// not fail startup: it yields an [`UnconfiguredAnalyzer`].
#[must_use]
pub fn analyzer_from_env() -> Arc<dyn SafetyAnalyzer> {
    let timeout = std::env::var("ANALYSIS_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .map_or(DEFAULT_TIMEOUT, Duration::from_secs);

    match create_provider_from_env() {
        Ok(provider) => {
            log::info!(
                "Safety analysis via {} ({}s timeout)",
                provider.name(),
                timeout.as_secs()
            );
            Arc::new(LlmSafetyAnalyzer::new(provider).with_timeout(timeout))
        }
        Err(e) => {
            log::error!("CRITICAL: {e}");
            Arc::new(unconfigured(&e))
        }
    }
}

fn unconfigured(err: &AiError) -> UnconfiguredAnalyzer {
    let analyzer = UnconfiguredAnalyzer::new(err.to_string());
    match err {
        AiError::Config { remediation, .. } => analyzer.with_remediation(remediation.clone()),
        _ => analyzer,
    }
}

/// Builds the user prompt listing the routes as JSON.
///
/// # Errors
///
/// Returns [`AiError::Json`] if the routes cannot be serialized.
pub fn build_prompt(routes: &[TransitRoute]) -> Result<String, AiError> {
    let routes_json = serde_json::to_string(routes)?;

    Ok(format!(
        r#"Analyze these {count} potential transit routes for safety.
Evaluate each based on lighting levels, crowd density, and crime history.

Routes data: {routes_json}

Response Requirements:
- Return a valid JSON array.
- Each object must have: "id" (string), "safetyScore" (number, 0-100), and "riskAnalysis" (string, {MAX_NARRATIVE_CHARS} chars max).
- Higher scores mean SAFER routes."#,
        count = routes.len(),
    ))
}

/// JSON schema of the expected answer, in Gemini's schema dialect.
#[must_use]
pub fn response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "id": { "type": "STRING" },
                "safetyScore": { "type": "NUMBER" },
                "riskAnalysis": { "type": "STRING" }
            },
            "required": ["id", "safetyScore", "riskAnalysis"]
        }
    })
}

/// Parses the model's answer into verdicts.
///
/// Tolerates Markdown code fences and an object wrapping the array.
/// Entries that do not have the expected shape are skipped; their
/// routes fall back to the default score.
///
/// # Errors
///
/// Returns [`AiError::EmptyResponse`] for blank text and
/// [`AiError::Json`] when the text is not JSON at all or holds no array.
pub fn parse_response(text: &str) -> Result<Vec<RouteAnalysis>, AiError> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(AiError::EmptyResponse);
    }

    let value: serde_json::Value = serde_json::from_str(body)?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(map) => {
            let Some(items) = map.into_iter().find_map(|(_, v)| match v {
                serde_json::Value::Array(items) => Some(items),
                _ => None,
            }) else {
                return Err(AiError::Provider {
                    status: None,
                    message: "Analysis response holds no array of routes".to_string(),
                });
            };
            items
        }
        _ => {
            return Err(AiError::Provider {
                status: None,
                message: "Analysis response is not a JSON array".to_string(),
            });
        }
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<RouteAnalysis>(item) {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                log::warn!("Skipping malformed route verdict: {e}");
                None
            }
        })
        .collect())
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening fence line.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Clamps a raw model score into the 0-100 range.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn clamp_score(raw: f64) -> u8 {
    if raw.is_nan() {
        return DEFAULT_SCORE;
    }
    raw.clamp(0.0, f64::from(MAX_SAFETY_SCORE)).round() as u8
}

/// Truncates a narrative to [`MAX_NARRATIVE_CHARS`] characters.
#[must_use]
pub fn truncate_narrative(text: &str) -> String {
    text.trim().chars().take(MAX_NARRATIVE_CHARS).collect()
}

/// Merges an analysis outcome into `routes`, returning fully-scored
/// copies in input order.
///
/// Every returned route has both a score and a narrative, whatever the
/// outcome. When several verdicts share an id the first one wins.
#[must_use]
pub fn apply_analysis(
    routes: &[TransitRoute],
    outcome: &Result<Vec<RouteAnalysis>, AnalysisFailure>,
) -> Vec<TransitRoute> {
    routes
        .iter()
        .map(|route| {
            let (score, narrative) = match outcome {
                Ok(analyses) => analyses.iter().find(|a| a.id == route.id).map_or_else(
                    || (DEFAULT_SCORE, NO_RISKS_MESSAGE.to_string()),
                    |a| (clamp_score(a.safety_score), truncate_narrative(&a.risk_analysis)),
                ),
                Err(failure) => (failure.fallback_score(), failure.user_message().to_string()),
            };

            TransitRoute {
                safety_score: Some(score),
                risk_analysis: Some(narrative),
                ..route.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedProvider {
        answer: Result<String, fn() -> AiError>,
        delay: Duration,
    }

    impl ScriptedProvider {
        fn answering(text: &str) -> Self {
            Self {
                answer: Ok(text.to_string()),
                delay: Duration::ZERO,
            }
        }

        fn failing(err: fn() -> AiError) -> Self {
            Self {
                answer: Err(err),
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, AiError> {
            assert!(request.prompt.contains("Routes data:"));
            assert!(request.response_schema.is_some());
            tokio::time::sleep(self.delay).await;
            match &self.answer {
                Ok(text) => Ok(text.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    fn verdict(id: &str, score: f64, text: &str) -> RouteAnalysis {
        RouteAnalysis {
            id: id.to_string(),
            safety_score: score,
            risk_analysis: text.to_string(),
        }
    }

    fn provider_error(status: u16, message: &str) -> AiError {
        AiError::Provider {
            status: Some(status),
            message: message.to_string(),
        }
    }

    #[test]
    fn classify_failures() {
        assert!(matches!(
            AnalysisFailure::classify(&AiError::Config {
                message: "API_KEY environment variable not set".to_string(),
                remediation: DEFAULT_REMEDIATION.to_string(),
            }),
            AnalysisFailure::Configuration { .. }
        ));
        assert_eq!(
            AnalysisFailure::classify(&provider_error(
                400,
                "Your API key was reported as leaked. Please use another API key."
            )),
            AnalysisFailure::LeakedKey
        );
        assert!(matches!(
            AnalysisFailure::classify(&provider_error(403, "PERMISSION_DENIED: nope")),
            AnalysisFailure::PermissionDenied { .. }
        ));
        assert!(matches!(
            AnalysisFailure::classify(&provider_error(401, "invalid x-api-key")),
            AnalysisFailure::PermissionDenied { .. }
        ));
        assert!(matches!(
            AnalysisFailure::classify(&provider_error(429, "slow down")),
            AnalysisFailure::RateLimited { .. }
        ));
        assert!(matches!(
            AnalysisFailure::classify(&AiError::Provider {
                status: None,
                message: "You exceeded your current quota".to_string()
            }),
            AnalysisFailure::RateLimited { .. }
        ));
        assert!(matches!(
            AnalysisFailure::classify(&provider_error(503, "overloaded")),
            AnalysisFailure::Unavailable { .. }
        ));
        assert!(matches!(
            AnalysisFailure::classify(&AiError::EmptyResponse),
            AnalysisFailure::Unavailable { .. }
        ));
    }

    #[test]
    fn failure_policy() {
        let config = AnalysisFailure::Configuration {
            message: String::new(),
            remediation: DEFAULT_REMEDIATION.to_string(),
        };
        assert_eq!(config.fallback_score(), DEFAULT_SCORE);
        assert!(!config.is_transient());
        assert!(config.user_message().starts_with("Configuration Error"));

        let rate = AnalysisFailure::RateLimited {
            message: String::new(),
        };
        assert_eq!(rate.fallback_score(), FAILURE_SCORE);
        assert!(rate.is_transient());
        assert!(!AnalysisFailure::LeakedKey.is_transient());
    }

    #[test]
    fn apply_analysis_scores_every_route() {
        let routes = safe_transit_catalog::routes();
        let outcome = Ok(vec![
            verdict("route-1", 70.0, "Dark alley at the start."),
            verdict("route-2", 90.0, "Busy and well lit."),
            verdict("route-3", 55.0, "Empty residential stretch."),
        ]);

        let scored = apply_analysis(&routes, &outcome);
        let scores: Vec<_> = scored.iter().map(|r| r.safety_score).collect();
        assert_eq!(scores, vec![Some(70), Some(90), Some(55)]);
        assert_eq!(scored[1].risk_analysis.as_deref(), Some("Busy and well lit."));
        assert_eq!(scored[0].segments, routes[0].segments);
    }

    #[test]
    fn apply_analysis_defaults_missing_and_unknown_ids() {
        let routes = safe_transit_catalog::routes();
        let outcome = Ok(vec![
            verdict("route-2", 88.0, "Fine."),
            verdict("route-9", 10.0, "Not a real route."),
        ]);

        let scored = apply_analysis(&routes, &outcome);
        assert_eq!(scored.len(), 3);
        assert_eq!(scored[0].safety_score, Some(DEFAULT_SCORE));
        assert_eq!(scored[0].risk_analysis.as_deref(), Some(NO_RISKS_MESSAGE));
        assert_eq!(scored[1].safety_score, Some(88));
        assert_eq!(scored[2].safety_score, Some(DEFAULT_SCORE));
    }

    #[test]
    fn apply_analysis_first_duplicate_wins_and_clamps() {
        let routes = safe_transit_catalog::routes();
        let long = "x".repeat(400);
        let outcome = Ok(vec![
            verdict("route-1", 140.0, &long),
            verdict("route-1", 20.0, "second"),
            verdict("route-2", -5.0, "negative"),
            verdict("route-3", 72.6, "rounded"),
        ]);

        let scored = apply_analysis(&routes, &outcome);
        assert_eq!(scored[0].safety_score, Some(100));
        assert_eq!(
            scored[0].risk_analysis.as_ref().map(|s| s.chars().count()),
            Some(MAX_NARRATIVE_CHARS)
        );
        assert_eq!(scored[1].safety_score, Some(0));
        assert_eq!(scored[2].safety_score, Some(73));
    }

    #[test]
    fn apply_analysis_failure_uses_failure_message() {
        let routes = safe_transit_catalog::routes();
        let outcome = Err(AnalysisFailure::PermissionDenied {
            message: "403".to_string(),
        });

        let scored = apply_analysis(&routes, &outcome);
        assert!(scored.iter().all(|r| r.safety_score == Some(FAILURE_SCORE)));
        assert!(
            scored
                .iter()
                .all(|r| r.risk_analysis.as_deref().is_some_and(|s| s.starts_with("Access Denied")))
        );
    }

    #[test]
    fn parse_response_variants() {
        let plain = r#"[{"id":"route-1","safetyScore":61,"riskAnalysis":"ok"}]"#;
        assert_eq!(parse_response(plain).unwrap(), vec![verdict("route-1", 61.0, "ok")]);

        let fenced = format!("```json\n{plain}\n```");
        assert_eq!(parse_response(&fenced).unwrap().len(), 1);

        let wrapped = format!(r#"{{"routes": {plain}}}"#);
        assert_eq!(parse_response(&wrapped).unwrap().len(), 1);

        let partial = r#"[{"id":"route-1","safetyScore":61,"riskAnalysis":"ok"},{"id":"route-2"}]"#;
        assert_eq!(parse_response(partial).unwrap().len(), 1);

        assert!(matches!(parse_response("  "), Err(AiError::EmptyResponse)));
        assert!(matches!(parse_response("not json"), Err(AiError::Json(_))));
        assert!(parse_response("42").is_err());
    }

    #[test]
    fn prompt_lists_routes_and_requirements() {
        let prompt = build_prompt(&safe_transit_catalog::routes()).unwrap();
        assert!(prompt.starts_with("Analyze these 3 potential transit routes"));
        assert!(prompt.contains(r#""lightingLevel":"low""#));
        assert!(prompt.contains("150 chars max"));
    }

    #[tokio::test]
    async fn llm_analyzer_parses_answer() {
        let analyzer = LlmSafetyAnalyzer::new(Box::new(ScriptedProvider::answering(
            r#"[{"id":"route-2","safetyScore":90,"riskAnalysis":"Busy."}]"#,
        )));
        let result = analyzer
            .analyze(&safe_transit_catalog::routes())
            .await
            .unwrap();
        assert_eq!(result, vec![verdict("route-2", 90.0, "Busy.")]);
    }

    #[tokio::test]
    async fn llm_analyzer_classifies_provider_errors() {
        let analyzer = LlmSafetyAnalyzer::new(Box::new(ScriptedProvider::failing(|| {
            AiError::Provider {
                status: Some(429),
                message: "Resource has been exhausted".to_string(),
            }
        })));
        let result = analyzer.analyze(&safe_transit_catalog::routes()).await;
        assert!(matches!(result, Err(AnalysisFailure::RateLimited { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn llm_analyzer_times_out() {
        let provider = ScriptedProvider {
            delay: Duration::from_secs(120),
            ..ScriptedProvider::answering("[]")
        };
        let analyzer =
            LlmSafetyAnalyzer::new(Box::new(provider)).with_timeout(Duration::from_secs(5));
        let result = analyzer.analyze(&safe_transit_catalog::routes()).await;
        assert!(matches!(result, Err(AnalysisFailure::Unavailable { .. })));
    }

    #[tokio::test]
    async fn unconfigured_analyzer_reports_configuration() {
        let analyzer = UnconfiguredAnalyzer::new("no key".to_string());
        let outcome = analyzer.analyze(&safe_transit_catalog::routes()).await;
        assert!(matches!(
            outcome,
            Err(AnalysisFailure::Configuration { ref message, .. }) if message == "no key"
        ));
        let scored = apply_analysis(&safe_transit_catalog::routes(), &outcome);
        assert!(scored.iter().all(|r| r.safety_score == Some(DEFAULT_SCORE)));
        assert_eq!(
            scored[0].risk_analysis.as_deref(),
            Some("Configuration Error: API Key not found. Please add API_KEY to your environment settings.")
        );
    }

    #[tokio::test]
    async fn unknown_provider_narrative_points_at_ai_provider() {
        let var = |name: &str| (name == "AI_PROVIDER").then(|| "mistral".to_string());
        let Err(err) = crate::providers::create_provider(&var) else {
            panic!("mistral is not a known provider");
        };

        let outcome = unconfigured(&err)
            .analyze(&safe_transit_catalog::routes())
            .await;
        let scored = apply_analysis(&safe_transit_catalog::routes(), &outcome);

        for route in &scored {
            assert_eq!(route.safety_score, Some(DEFAULT_SCORE));
            let narrative = route.risk_analysis.as_deref().unwrap_or_default();
            assert!(narrative.starts_with("Configuration Error: Unknown AI_PROVIDER"));
            assert!(narrative.contains("mistral"));
            assert!(!narrative.contains("add API_KEY"));
        }
    }

    #[tokio::test]
    async fn missing_provider_key_narrative_names_that_key() {
        let var = |name: &str| (name == "AI_PROVIDER").then(|| "anthropic".to_string());
        let Err(err) = crate::providers::create_provider(&var) else {
            panic!("anthropic has no key");
        };

        let outcome = unconfigured(&err)
            .analyze(&safe_transit_catalog::routes())
            .await;
        let Err(failure) = outcome else {
            panic!("unconfigured analysis must fail");
        };
        assert!(failure.user_message().contains("ANTHROPIC_API_KEY"));
        assert!(!failure.user_message().contains("add API_KEY"));
    }
}
