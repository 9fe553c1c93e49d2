//! Model Client
//!
//! The provider-agnostic call surface used by the extraction pipeline.
//! `ModelClient::call` is total: routing failures, missing credentials, and
//! provider errors all come back as a `ModelResponse` with `success = false`,
//! never as an `Err` or a panic.

use super::anthropic::AnthropicProvider;
use super::openai::OpenAiProvider;
use super::{ChatProvider, ChatRequest, ModelResponse, ProviderKind};
use crate::config::LlmConfig;

/// Provider-agnostic model client
pub struct ModelClient {
    openai: OpenAiProvider,
    anthropic: AnthropicProvider,
}

impl ModelClient {
    /// Create a client from config, reading credentials from the environment.
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            openai: OpenAiProvider::new(config.openai.clone()),
            anthropic: AnthropicProvider::new(config.anthropic.clone()),
        }
    }

    /// Create a client from already-constructed providers (used in tests and
    /// anywhere credentials shouldn't come from the process environment).
    pub fn with_providers(openai: OpenAiProvider, anthropic: AnthropicProvider) -> Self {
        Self { openai, anthropic }
    }

    /// Per-provider credential availability, as (openai, anthropic).
    pub fn availability(&self) -> (bool, bool) {
        (self.openai.is_available(), self.anthropic.is_available())
    }

    /// Call the provider owning `model`.
    ///
    /// Routing is a closed decision on the model-name prefix; unrecognized
    /// names yield a failure response with zero cost. "-latest" aliases are
    /// resolved to concrete names before the call, and the resolved name is
    /// what the response reports.
    pub async fn call(
        &self,
        model: &str,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: u32,
    ) -> ModelResponse {
        let provider: &dyn ChatProvider = match ProviderKind::for_model(model) {
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Anthropic => &self.anthropic,
            ProviderKind::Unrecognized => {
                return ModelResponse::failure(model, format!("unknown model: {}", model));
            }
        };

        let resolved = provider.resolve_alias(model);
        let request = ChatRequest {
            model: &resolved,
            prompt,
            system_prompt,
            max_tokens,
        };

        match provider.complete(&request).await {
            Ok(completion) => ModelResponse {
                cost: provider.estimate_cost(&resolved, completion.usage),
                tokens_used: completion.usage.total(),
                content: completion.content,
                model: resolved,
                success: true,
                error: None,
            },
            Err(e) => {
                tracing::warn!("{} call failed for {}: {}", provider.name(), resolved, e);
                ModelResponse::failure(resolved, e.to_string())
            }
        }
    }
}
