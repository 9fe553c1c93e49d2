//! Model Client and Provider Abstraction Layer
//!
//! This module provides a common interface for the AI model providers used by
//! the extraction pipeline (OpenAI, Anthropic). The `ChatProvider` trait
//! defines the contract both providers implement; routing between them is a
//! closed decision made by `ProviderKind::for_model`, with an explicit
//! `Unrecognized` variant instead of a string-prefix fallthrough.

use async_trait::async_trait;
use serde::Serialize;

pub mod anthropic;
pub mod client;
pub mod openai;

pub use client::ModelClient;

/// Result type for provider operations
pub type Result<T> = std::result::Result<T, LlmError>;

/// Fixed sampling temperature for all extraction calls.
/// Deterministic-leaning for consistency; not configurable per call.
pub(crate) const SAMPLING_TEMPERATURE: f64 = 0.1;

/// Errors that can occur during provider operations
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Token usage reported by a provider for one call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt (input)
    pub prompt_tokens: u32,

    /// Tokens produced in the completion (output)
    pub completion_tokens: u32,
}

impl TokenUsage {
    /// Total tokens for the call
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// One chat request against a provider
#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    /// Concrete (alias-resolved) model name
    pub model: &'a str,

    /// User prompt
    pub prompt: &'a str,

    /// Optional system prompt
    pub system_prompt: Option<&'a str>,

    /// Token ceiling for the completion
    pub max_tokens: u32,
}

/// Raw completion from a provider, before cost accounting
#[derive(Debug, Clone)]
pub struct Completion {
    /// Response text
    pub content: String,

    /// Token usage reported by the provider
    pub usage: TokenUsage,
}

/// Which provider a model name belongs to
///
/// Closed dispatch: every model name maps to exactly one variant, and callers
/// must handle `Unrecognized` explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// OpenAI chat models (`gpt-*`, `o1-*`)
    OpenAi,

    /// Anthropic models (`claude-*`)
    Anthropic,

    /// Model name matched no known provider
    Unrecognized,
}

impl ProviderKind {
    /// Classify a model name by its prefix.
    pub fn for_model(model: &str) -> Self {
        if model.starts_with("gpt-") || model.starts_with("o1-") {
            ProviderKind::OpenAi
        } else if model.starts_with("claude-") {
            ProviderKind::Anthropic
        } else {
            ProviderKind::Unrecognized
        }
    }
}

/// Contract implemented by every concrete provider
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Returns the name of the provider (e.g., "openai", "anthropic")
    fn name(&self) -> &str;

    /// Resolve a "-latest" alias to a concrete model name.
    ///
    /// Unknown aliases pass through unchanged; resolution happens before the
    /// HTTP call and the resolved name is what gets reported back.
    fn resolve_alias(&self, model: &str) -> String;

    /// Price per (input, output) token in USD for the given model.
    /// Unknown models get the provider's conservative fallback price.
    fn price_per_token(&self, model: &str) -> (f64, f64);

    /// Generate a completion for the request
    ///
    /// # Errors
    ///
    /// Returns `LlmError::ProviderUnavailable` without any network attempt if
    /// the provider's credential is missing.
    async fn complete(&self, request: &ChatRequest<'_>) -> Result<Completion>;

    /// Estimate the monetary cost of a call from its token usage
    fn estimate_cost(&self, model: &str, usage: TokenUsage) -> f64 {
        let (input_price, output_price) = self.price_per_token(model);
        usage.prompt_tokens as f64 * input_price + usage.completion_tokens as f64 * output_price
    }
}

/// Response from one model call
///
/// Immutable, one per call. The call surface is total: failures are reported
/// as `success = false` with an error string, never as a panic or `Err`.
#[derive(Debug, Clone, Serialize)]
pub struct ModelResponse {
    /// Response text (empty on failure)
    pub content: String,

    /// Total tokens used (zero on failure)
    pub tokens_used: u32,

    /// Estimated monetary cost in USD (zero on failure)
    pub cost: f64,

    /// Resolved model name
    pub model: String,

    /// Whether the call succeeded
    pub success: bool,

    /// Error description when `success` is false
    pub error: Option<String>,
}

impl ModelResponse {
    /// Build a failure response with zero tokens and cost.
    pub(crate) fn failure(model: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            tokens_used: 0,
            cost: 0.0,
            model: model.into(),
            success: false,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_openai_prefixes() {
        assert_eq!(ProviderKind::for_model("gpt-4o-mini"), ProviderKind::OpenAi);
        assert_eq!(ProviderKind::for_model("o1-preview"), ProviderKind::OpenAi);
    }

    #[test]
    fn test_provider_kind_anthropic_prefix() {
        assert_eq!(
            ProviderKind::for_model("claude-3-haiku-20240307"),
            ProviderKind::Anthropic
        );
    }

    #[test]
    fn test_provider_kind_unrecognized() {
        assert_eq!(
            ProviderKind::for_model("llama3.1:8b"),
            ProviderKind::Unrecognized
        );
        assert_eq!(ProviderKind::for_model(""), ProviderKind::Unrecognized);
    }

    #[test]
    fn test_token_usage_total() {
        let usage = TokenUsage {
            prompt_tokens: 120,
            completion_tokens: 30,
        };
        assert_eq!(usage.total(), 150);
    }

    #[test]
    fn test_failure_response_shape() {
        let response = ModelResponse::failure("gpt-4o", "boom");
        assert!(!response.success);
        assert_eq!(response.tokens_used, 0);
        assert_eq!(response.cost, 0.0);
        assert_eq!(response.error.as_deref(), Some("boom"));
        assert!(response.content.is_empty());
    }
}
