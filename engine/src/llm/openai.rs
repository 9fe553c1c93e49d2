use super::{ChatProvider, ChatRequest, Completion, LlmError, TokenUsage, SAMPLING_TEMPERATURE};
use crate::config::OpenAiConfig;
use async_trait::async_trait;
use serde_json::json;

/// Environment variable holding the OpenAI API key
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";

/// "-latest" alias table, resolved before any HTTP call
const ALIASES: &[(&str, &str)] = &[
    ("gpt-4o-latest", "gpt-4o"),
    ("gpt-4o-mini-latest", "gpt-4o-mini"),
];

/// USD per (input, output) token. Approximate pricing, November 2024.
const PRICING: &[(&str, (f64, f64))] = &[
    ("gpt-4o-mini", (0.15 / 1_000_000.0, 0.60 / 1_000_000.0)),
    ("gpt-4o", (2.50 / 1_000_000.0, 10.00 / 1_000_000.0)),
];

/// Conservative fallback price for models missing from the table
const FALLBACK_PRICE: (f64, f64) = (1.0 / 1_000_000.0, 3.0 / 1_000_000.0);

pub struct OpenAiProvider {
    config: OpenAiConfig,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Create a provider reading the API key from the environment.
    pub fn new(config: OpenAiConfig) -> Self {
        Self::with_api_key(config, std::env::var(OPENAI_API_KEY_VAR).ok())
    }

    /// Create a provider with an explicit key (or none).
    pub fn with_api_key(config: OpenAiConfig, api_key: Option<String>) -> Self {
        Self {
            config,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Whether a credential is configured
    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn resolve_alias(&self, model: &str) -> String {
        if model.ends_with("-latest") {
            for (alias, concrete) in ALIASES {
                if model == *alias {
                    return (*concrete).to_string();
                }
            }
        }
        model.to_string()
    }

    fn price_per_token(&self, model: &str) -> (f64, f64) {
        PRICING
            .iter()
            .find(|(name, _)| *name == model)
            .map(|(_, price)| *price)
            .unwrap_or(FALLBACK_PRICE)
    }

    async fn complete(&self, request: &ChatRequest<'_>) -> super::Result<Completion> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            LlmError::ProviderUnavailable(format!("{} not set", OPENAI_API_KEY_VAR))
        })?;

        let url = format!("{}/chat/completions", self.config.base_url);

        let mut api_messages = Vec::new();
        if let Some(system) = request.system_prompt {
            api_messages.push(json!({ "role": "system", "content": system }));
        }
        api_messages.push(json!({ "role": "user", "content": request.prompt }));

        let payload = json!({
            "model": request.model,
            "messages": api_messages,
            "max_tokens": request.max_tokens,
            "temperature": SAMPLING_TEMPERATURE,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(LlmError::AuthenticationFailed(text));
            } else if status.as_u16() == 429 {
                return Err(LlmError::RateLimitExceeded);
            } else {
                return Err(LlmError::InvalidRequest(text));
            }
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        let choice = data
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .ok_or_else(|| LlmError::ParseError("No choices in response".to_string()))?;

        let content = choice
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| LlmError::ParseError("Empty content".to_string()))?;

        let usage = TokenUsage {
            prompt_tokens: data
                .pointer("/usage/prompt_tokens")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32,
            completion_tokens: data
                .pointer("/usage/completion_tokens")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32,
        };

        Ok(Completion {
            content: content.to_string(),
            usage,
        })
    }
}
