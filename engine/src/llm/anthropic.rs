use super::{ChatProvider, ChatRequest, Completion, LlmError, TokenUsage, SAMPLING_TEMPERATURE};
use crate::config::AnthropicConfig;
use async_trait::async_trait;
use serde_json::json;

/// Environment variable holding the Anthropic API key
pub const ANTHROPIC_API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// "-latest" alias table, resolved before any HTTP call
const ALIASES: &[(&str, &str)] = &[
    ("claude-3-5-sonnet-latest", "claude-3-5-sonnet-20240620"),
    ("claude-3-haiku-latest", "claude-3-haiku-20240307"),
];

/// USD per (input, output) token. Approximate pricing, November 2024.
const PRICING: &[(&str, (f64, f64))] = &[
    (
        "claude-3-haiku-20240307",
        (0.25 / 1_000_000.0, 1.25 / 1_000_000.0),
    ),
    (
        "claude-3-5-sonnet-20240620",
        (3.00 / 1_000_000.0, 15.00 / 1_000_000.0),
    ),
];

/// Conservative fallback price for models missing from the table
const FALLBACK_PRICE: (f64, f64) = (3.0 / 1_000_000.0, 15.0 / 1_000_000.0);

pub struct AnthropicProvider {
    config: AnthropicConfig,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Create a provider reading the API key from the environment.
    pub fn new(config: AnthropicConfig) -> Self {
        Self::with_api_key(config, std::env::var(ANTHROPIC_API_KEY_VAR).ok())
    }

    /// Create a provider with an explicit key (or none).
    pub fn with_api_key(config: AnthropicConfig, api_key: Option<String>) -> Self {
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
impl ChatProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
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
            LlmError::ProviderUnavailable(format!("{} not set", ANTHROPIC_API_KEY_VAR))
        })?;

        let url = format!("{}/messages", self.config.base_url);

        let payload = json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "temperature": SAMPLING_TEMPERATURE,
            "system": request.system_prompt.unwrap_or(""),
            "messages": [{ "role": "user", "content": request.prompt }],
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
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

        let content_arr = data
            .get("content")
            .and_then(|c| c.as_array())
            .ok_or_else(|| LlmError::ParseError("No content array in response".to_string()))?;

        let mut full_content = String::new();
        for item in content_arr {
            if let Some(text) = item.get("text").and_then(|t| t.as_str()) {
                full_content.push_str(text);
            }
        }

        let usage = TokenUsage {
            prompt_tokens: data
                .pointer("/usage/input_tokens")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32,
            completion_tokens: data
                .pointer("/usage/output_tokens")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32,
        };

        Ok(Completion {
            content: full_content,
            usage,
        })
    }
}
