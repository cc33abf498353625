//! Narrative generation over OpenAI-compatible chat completion endpoints.
//!
//! The generator is the crate's only unbounded external call. It carries a
//! client-level timeout and no retry loop; callers decide whether a failure
//! is absorbed into a synthesized message or propagated.

use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

/// One wire message for a chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy)]
pub struct GenerationOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate(
        &self,
        messages: &[PromptMessage],
        opts: &GenerationOptions,
    ) -> Result<String>;
}

// OpenAI-compatible API implementation (Groq, OpenAI, local gateways)
pub struct OpenAiChatGenerator {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

impl OpenAiChatGenerator {
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        timeout_ms: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()
            .context("Failed to build reqwest client with timeout")?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }
}

#[async_trait]
impl NarrativeGenerator for OpenAiChatGenerator {
    async fn generate(
        &self,
        messages: &[PromptMessage],
        opts: &GenerationOptions,
    ) -> Result<String> {
        debug!(
            "Requesting chat completion (model={}, messages={})",
            self.model,
            messages.len()
        );

        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens: opts.max_tokens,
            temperature: opts.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send request to chat completions API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Chat completions API error {}: {}", status, error_text);
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to parse chat completions response")?;

        result
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .context("No choices returned from chat completions API")
    }
}

// Deterministic, local FakeGenerator for testing/dev (no network)
pub struct FakeGenerator;

#[async_trait]
impl NarrativeGenerator for FakeGenerator {
    async fn generate(
        &self,
        messages: &[PromptMessage],
        _opts: &GenerationOptions,
    ) -> Result<String> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == PromptRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or("");
        Ok(format!("Deterministic reply to: {}", last_user))
    }
}

/// Factory: pick a generator from configuration.
///
/// An explicit provider ("openai" or "fake") is respected; anything else
/// auto-detects by API key presence. Without a key the deterministic fake
/// is used unless strict mode demands a real endpoint.
pub fn create_generator(config: &Config) -> Result<Arc<dyn NarrativeGenerator>> {
    let is_placeholder = |s: &str| {
        let t = s.trim();
        t.is_empty()
            || t.contains("${")
            || t.eq_ignore_ascii_case("your-api-key-here")
            || t.eq_ignore_ascii_case("changeme")
    };
    let api_key = config
        .runtime
        .api_key
        .as_deref()
        .filter(|k| !is_placeholder(k));

    match config.narrative.provider.as_str() {
        "openai" => {
            let key = api_key.ok_or_else(|| {
                anyhow::anyhow!("narrative.provider is \"openai\" but no API key is set")
            })?;
            info!(
                "Using OpenAI-compatible narrative endpoint (model={})",
                config.narrative.model
            );
            return Ok(Arc::new(OpenAiChatGenerator::new(
                key.to_string(),
                config.narrative.base_url.clone(),
                config.narrative.model.clone(),
                config.narrative.request_timeout_ms,
            )?));
        }
        "fake" => {
            info!("Using FakeGenerator (deterministic)");
            return Ok(Arc::new(FakeGenerator));
        }
        _ => {
            // Auto-detect by key presence
            if let Some(key) = api_key {
                info!(
                    "Using OpenAI-compatible narrative endpoint (model={})",
                    config.narrative.model
                );
                return Ok(Arc::new(OpenAiChatGenerator::new(
                    key.to_string(),
                    config.narrative.base_url.clone(),
                    config.narrative.model.clone(),
                    config.narrative.request_timeout_ms,
                )?));
            }
        }
    }

    if config.runtime.narrative_strict {
        anyhow::bail!(
            "No narrative API key configured; set REQCOVER_API_KEY (or GROQ_API_KEY/OPENAI_API_KEY), or set narrative.provider = \"fake\"."
        );
    }

    info!("Using FakeGenerator (deterministic); no API key configured");
    Ok(Arc::new(FakeGenerator))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> GenerationOptions {
        GenerationOptions {
            max_tokens: 100,
            temperature: 0.7,
        }
    }

    #[tokio::test]
    async fn fake_generator_is_deterministic() {
        let generator = FakeGenerator;
        let messages = vec![PromptMessage {
            role: PromptRole::User,
            content: "what is missing?".to_string(),
        }];
        let a = generator.generate(&messages, &opts()).await.unwrap();
        let b = generator.generate(&messages, &opts()).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn fake_generator_replies_to_the_last_user_message() {
        let generator = FakeGenerator;
        let messages = vec![
            PromptMessage {
                role: PromptRole::System,
                content: "system".to_string(),
            },
            PromptMessage {
                role: PromptRole::User,
                content: "first".to_string(),
            },
            PromptMessage {
                role: PromptRole::Assistant,
                content: "reply".to_string(),
            },
            PromptMessage {
                role: PromptRole::User,
                content: "second".to_string(),
            },
        ];
        let reply = generator.generate(&messages, &opts()).await.unwrap();
        assert!(reply.contains("second"));
        assert!(!reply.contains("first"));
    }

    #[test]
    fn prompt_roles_serialize_lowercase() {
        let message = PromptMessage {
            role: PromptRole::System,
            content: "hi".to_string(),
        };
        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains("\"role\":\"system\""));
    }

    #[tokio::test]
    async fn factory_falls_back_to_fake_without_key() {
        let config = Config::default();
        assert!(config.runtime.api_key.is_none());
        let generator = create_generator(&config).unwrap();
        // The fake replies without any network access.
        let messages = vec![PromptMessage {
            role: PromptRole::User,
            content: "ping".to_string(),
        }];
        let reply = generator.generate(&messages, &opts()).await.unwrap();
        assert!(reply.contains("ping"));
    }

    #[test]
    fn factory_strict_mode_requires_a_key() {
        let mut config = Config::default();
        config.runtime.narrative_strict = true;
        assert!(create_generator(&config).is_err());
    }

    #[test]
    fn factory_explicit_openai_requires_a_key() {
        let mut config = Config::default();
        config.narrative.provider = "openai".to_string();
        assert!(create_generator(&config).is_err());
    }

    #[test]
    fn factory_explicit_openai_uses_the_configured_key() {
        let mut config = Config::default();
        config.narrative.provider = "openai".to_string();
        config.runtime.api_key = Some("sk-test".to_string());
        assert!(create_generator(&config).is_ok());
    }

    #[test]
    fn factory_treats_placeholder_keys_as_absent() {
        let mut config = Config::default();
        config.runtime.api_key = Some("your-api-key-here".to_string());
        config.runtime.narrative_strict = true;
        assert!(create_generator(&config).is_err());
    }
}
