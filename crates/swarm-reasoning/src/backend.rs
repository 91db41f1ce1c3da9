//! Reasoning backend abstraction and implementations.
//!
//! Enum-based dispatch over the supported backends, avoiding the
//! dyn-compatibility issues with async trait methods. Concrete
//! implementations exist for OpenAI-compatible APIs and the Anthropic
//! Messages API, plus a `Disabled` backend for keyless runs and tests.
//!
//! The substrate does not care which model answers -- it sends a system and
//! a user prompt and expects text (usually JSON) plus a token count for the
//! credit ledger.

use std::time::Duration;

use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::ReasoningError;

/// Default per-call deadline for the reasoning backend.
pub const REASONING_DEADLINE: Duration = Duration::from_secs(30);

/// Retries after the first failed attempt.
const MAX_RETRIES: u32 = 2;

/// Linear backoff unit between retries.
const BACKOFF_STEP: Duration = Duration::from_millis(500);

/// A reply from the reasoning backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
    /// The response text (empty when the backend was exhausted or disabled).
    pub content: String,
    /// Tokens charged for the call (zero when no call was made).
    pub tokens_used: u64,
}

/// Per-call options.
#[derive(Debug, Clone, Copy)]
pub struct ReasonOptions {
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
    /// Request the cheaper model variant, when one is configured.
    pub cheap: bool,
}

impl Default for ReasonOptions {
    fn default() -> Self {
        Self {
            max_tokens: 1_024,
            temperature: 0.7,
            cheap: false,
        }
    }
}

/// Configuration for a single reasoning backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base API URL (e.g. `https://api.openai.com/v1`).
    pub api_url: String,
    /// API key for authentication.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Cheaper model for the low-compute credit tier, if any.
    pub cheap_model: Option<String>,
}

/// A reasoning backend that can process a prompt and return a reply.
///
/// Uses enum dispatch instead of trait objects because async methods are
/// not dyn-compatible.
pub enum ReasoningBackend {
    /// OpenAI-compatible chat completions API.
    OpenAi(OpenAiBackend),
    /// Anthropic Messages API.
    Anthropic(AnthropicBackend),
    /// No backend configured: every call fails fast and the caller
    /// degrades to light behavior.
    Disabled,
}

impl ReasoningBackend {
    /// Build a backend from a provider name and config.
    ///
    /// Recognized providers: `openai`, `deepseek`, `ollama` (all
    /// OpenAI-compatible), `anthropic`, `claude`. Anything else is an error.
    pub fn from_provider(provider: &str, config: BackendConfig) -> Result<Self, ReasoningError> {
        match provider.to_lowercase().as_str() {
            "openai" | "deepseek" | "ollama" => Ok(Self::OpenAi(OpenAiBackend::new(config))),
            "anthropic" | "claude" => Ok(Self::Anthropic(AnthropicBackend::new(config))),
            other => Err(ReasoningError::Config(format!(
                "unknown reasoning provider: {other}"
            ))),
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::OpenAi(_) => "openai-compatible",
            Self::Anthropic(_) => "anthropic",
            Self::Disabled => "disabled",
        }
    }

    /// Whether a real backend is configured.
    pub const fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }

    /// Send one prompt, without retry.
    async fn complete_once(
        &self,
        system: &str,
        user: &str,
        opts: ReasonOptions,
    ) -> Result<Reply, ReasoningError> {
        match self {
            Self::OpenAi(backend) => backend.complete(system, user, opts).await,
            Self::Anthropic(backend) => backend.complete(system, user, opts).await,
            Self::Disabled => Err(ReasoningError::Backend(String::from(
                "reasoning backend disabled",
            ))),
        }
    }

    /// Send a prompt with deadline, retry, and degrade-to-empty semantics.
    ///
    /// Each attempt gets its own 30 s deadline; up to two retries follow
    /// with linear backoff. On exhaustion the reply is empty with zero
    /// tokens -- the caller downgrades confidence instead of failing the
    /// tick.
    pub async fn reason(&self, system: &str, user: &str, opts: ReasonOptions) -> Reply {
        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                tokio::time::sleep(BACKOFF_STEP.saturating_mul(attempt)).await;
            }
            match timeout(REASONING_DEADLINE, self.complete_once(system, user, opts)).await {
                Ok(Ok(reply)) => {
                    debug!(
                        backend = self.name(),
                        attempt,
                        tokens = reply.tokens_used,
                        "reasoning call succeeded"
                    );
                    return reply;
                }
                Ok(Err(e)) => {
                    warn!(backend = self.name(), attempt, error = %e, "reasoning call failed");
                }
                Err(_) => {
                    warn!(backend = self.name(), attempt, "reasoning call timed out");
                }
            }
        }
        Reply::default()
    }
}

/// Estimate token usage from text length when the provider reports none.
fn estimate_tokens(system: &str, user: &str, content: &str) -> u64 {
    let chars = system.len().saturating_add(user.len()).saturating_add(content.len());
    u64::try_from(chars / 4).unwrap_or(0).max(1)
}

// ---------------------------------------------------------------------------
// OpenAI-compatible backend
// ---------------------------------------------------------------------------

/// Backend for OpenAI-compatible chat completions APIs.
///
/// Works with `OpenAI`, `DeepSeek`, and Ollama endpoints. Sends requests to
/// `{api_url}/chat/completions`.
pub struct OpenAiBackend {
    client: reqwest::Client,
    config: BackendConfig,
}

impl OpenAiBackend {
    /// Create a new `OpenAI`-compatible backend.
    pub fn new(config: BackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn complete(
        &self,
        system: &str,
        user: &str,
        opts: ReasonOptions,
    ) -> Result<Reply, ReasoningError> {
        let url = format!("{}/chat/completions", self.config.api_url);
        let model = pick_model(&self.config, opts.cheap);

        let body = serde_json::json!({
            "model": model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user}
            ],
            "temperature": opts.temperature,
            "max_tokens": opts.max_tokens,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ReasoningError::Backend(format!("OpenAI request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unable to read error body"));
            return Err(ReasoningError::Backend(format!(
                "OpenAI returned {status}: {error_body}"
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| ReasoningError::Parse(format!("OpenAI response parse failed: {e}")))?;

        let content = extract_openai_content(&json)?;
        let tokens = json
            .get("usage")
            .and_then(|u| u.get("total_tokens"))
            .and_then(Value::as_u64)
            .unwrap_or_else(|| estimate_tokens(system, user, &content));
        Ok(Reply {
            content,
            tokens_used: tokens,
        })
    }
}

/// Extract the text content from an `OpenAI` chat completions response.
fn extract_openai_content(json: &Value) -> Result<String, ReasoningError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            ReasoningError::Parse(String::from(
                "OpenAI response missing choices[0].message.content",
            ))
        })
}

// ---------------------------------------------------------------------------
// Anthropic Messages API backend
// ---------------------------------------------------------------------------

/// Backend for the Anthropic Messages API.
///
/// Anthropic differs from `OpenAI`: the `x-api-key` header replaces the
/// bearer token, system is a top-level field, and the content lives at
/// `content[0].text`.
pub struct AnthropicBackend {
    client: reqwest::Client,
    config: BackendConfig,
}

impl AnthropicBackend {
    /// Create a new Anthropic Messages API backend.
    pub fn new(config: BackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn complete(
        &self,
        system: &str,
        user: &str,
        opts: ReasonOptions,
    ) -> Result<Reply, ReasoningError> {
        let url = format!("{}/messages", self.config.api_url);
        let model = pick_model(&self.config, opts.cheap);

        let body = serde_json::json!({
            "model": model,
            "max_tokens": opts.max_tokens,
            "system": system,
            "messages": [
                {"role": "user", "content": user}
            ]
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ReasoningError::Backend(format!("Anthropic request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unable to read error body"));
            return Err(ReasoningError::Backend(format!(
                "Anthropic returned {status}: {error_body}"
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| ReasoningError::Parse(format!("Anthropic response parse failed: {e}")))?;

        let content = extract_anthropic_content(&json)?;
        let tokens = anthropic_usage(&json)
            .unwrap_or_else(|| estimate_tokens(system, user, &content));
        Ok(Reply {
            content,
            tokens_used: tokens,
        })
    }
}

/// Extract the text content from an Anthropic Messages API response.
fn extract_anthropic_content(json: &Value) -> Result<String, ReasoningError> {
    json.get("content")
        .and_then(|c| c.get(0))
        .and_then(|b| b.get("text"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            ReasoningError::Parse(String::from("Anthropic response missing content[0].text"))
        })
}

/// Sum input and output tokens from an Anthropic usage block.
fn anthropic_usage(json: &Value) -> Option<u64> {
    let usage = json.get("usage")?;
    let input = usage.get("input_tokens").and_then(Value::as_u64)?;
    let output = usage.get("output_tokens").and_then(Value::as_u64)?;
    Some(input.saturating_add(output))
}

/// Pick the configured model, honoring the cheap-variant request.
fn pick_model(config: &BackendConfig, cheap: bool) -> &str {
    if cheap {
        config.cheap_model.as_deref().unwrap_or(&config.model)
    } else {
        &config.model
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> BackendConfig {
        BackendConfig {
            api_url: String::from("https://api.example.test/v1"),
            api_key: String::from("test"),
            model: String::from("big-model"),
            cheap_model: Some(String::from("small-model")),
        }
    }

    #[test]
    fn provider_dispatch() {
        let openai = ReasoningBackend::from_provider("openai", config()).unwrap();
        assert_eq!(openai.name(), "openai-compatible");
        let anthropic = ReasoningBackend::from_provider("Claude", config()).unwrap();
        assert_eq!(anthropic.name(), "anthropic");
        assert!(ReasoningBackend::from_provider("quantum", config()).is_err());
    }

    #[test]
    fn extract_openai_content_valid() {
        let json = serde_json::json!({
            "choices": [{
                "message": {"content": "{\"conclusion\": \"flares correlate\"}"}
            }],
            "usage": {"total_tokens": 321}
        });
        let content = extract_openai_content(&json);
        assert!(content.unwrap_or_default().contains("flares"));
        assert_eq!(
            json.get("usage").and_then(|u| u.get("total_tokens")).and_then(Value::as_u64),
            Some(321)
        );
    }

    #[test]
    fn extract_openai_content_missing_choices() {
        let json = serde_json::json!({"error": "rate_limit"});
        assert!(extract_openai_content(&json).is_err());
    }

    #[test]
    fn extract_anthropic_content_and_usage() {
        let json = serde_json::json!({
            "content": [{"type": "text", "text": "{\"verdict\": \"promising\"}"}],
            "usage": {"input_tokens": 100, "output_tokens": 40}
        });
        assert!(extract_anthropic_content(&json).unwrap_or_default().contains("promising"));
        assert_eq!(anthropic_usage(&json), Some(140));
    }

    #[test]
    fn extract_anthropic_content_missing() {
        let json = serde_json::json!({"content": []});
        assert!(extract_anthropic_content(&json).is_err());
    }

    #[test]
    fn cheap_model_selection() {
        let c = config();
        assert_eq!(pick_model(&c, false), "big-model");
        assert_eq!(pick_model(&c, true), "small-model");
        let no_cheap = BackendConfig {
            cheap_model: None,
            ..config()
        };
        assert_eq!(pick_model(&no_cheap, true), "big-model");
    }

    #[test]
    fn token_estimate_floor() {
        assert_eq!(estimate_tokens("", "", ""), 1);
        assert_eq!(estimate_tokens("aaaa", "bbbb", "cccc"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_backend_degrades_to_empty() {
        let backend = ReasoningBackend::Disabled;
        let reply = backend
            .reason("system", "user", ReasonOptions::default())
            .await;
        assert!(reply.content.is_empty());
        assert_eq!(reply.tokens_used, 0);
    }
}
