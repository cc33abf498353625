use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure loaded from reqcover.toml and environment variables
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub narrative: NarrativeConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// Coverage analysis tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisConfig {
    /// Cosine similarity at or above which a requirement counts as covered
    pub similarity_threshold: f64,
    /// Whether plain-prose documents are split on sentence boundaries
    pub sentence_segmentation: bool,
}

/// Narrative generation (chat/feedback) endpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NarrativeConfig {
    /// "openai", "fake", or "auto" (pick by API key presence)
    pub provider: String,
    /// Base URL of an OpenAI-compatible chat completions API
    pub base_url: String,
    pub model: String,
    pub max_feedback_tokens: u32,
    pub max_chat_tokens: u32,
    pub temperature: f32,
    pub request_timeout_ms: u64,
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub api_key: Option<String>,
    pub narrative_strict: bool,
    pub log_level: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.3,
            sentence_segmentation: true,
        }
    }
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            provider: "auto".to_string(),
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "meta-llama/llama-4-scout-17b-16e-instruct".to_string(),
            max_feedback_tokens: 1000,
            max_chat_tokens: 500,
            temperature: 0.7,
            request_timeout_ms: 30_000,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            narrative_strict: false,
            log_level: "reqcover=info".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            narrative: NarrativeConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load runtime configuration from environment variables
    pub fn load_from_env() -> Self {
        Self {
            api_key: std::env::var("REQCOVER_API_KEY")
                .or_else(|_| std::env::var("GROQ_API_KEY"))
                .or_else(|_| std::env::var("OPENAI_API_KEY"))
                .ok()
                .filter(|k| !k.trim().is_empty()),
            narrative_strict: std::env::var("REQCOVER_NARRATIVE_STRICT")
                .ok()
                .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true")),
            log_level: std::env::var("REQCOVER_LOG")
                .or_else(|_| std::env::var("RUST_LOG"))
                .unwrap_or_else(|_| "reqcover=info".to_string()),
        }
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables
    /// Uses REQCOVER_CONFIG environment variable or defaults to "reqcover.toml"
    pub fn load() -> anyhow::Result<Self> {
        // Load environment variables with smart fallbacks:
        // 1) REQCOVER_ENV_FILE if set
        // 2) ./.env
        // 3) ../.env (repo root when running from crate dir)
        if let Ok(env_path) = std::env::var("REQCOVER_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::from_path(".env");
            let core_present = std::env::var("REQCOVER_API_KEY").is_ok()
                || std::env::var("GROQ_API_KEY").is_ok()
                || std::env::var("OPENAI_API_KEY").is_ok();
            if !core_present {
                let _ = dotenvy::from_path("../.env");
            }
        }

        let config_path =
            std::env::var("REQCOVER_CONFIG").unwrap_or_else(|_| "reqcover.toml".to_string());
        Self::load_from_path(Path::new(&config_path))
    }

    /// Load configuration from a specific TOML file, then apply env overrides
    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let mut config: Config = if let Ok(content) = std::fs::read_to_string(path) {
            toml::from_str(&content)?
        } else {
            tracing::warn!("Config file {} not found, using defaults", path.display());
            Self::default()
        };

        // Apply env overrides (env-first)
        if let Some(threshold) = std::env::var("REQCOVER_THRESHOLD")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
        {
            config.analysis.similarity_threshold = threshold;
            tracing::debug!("REQCOVER_THRESHOLD env override applied");
        }
        if let Ok(provider) = std::env::var("REQCOVER_NARRATIVE_PROVIDER") {
            config.narrative.provider = provider;
            tracing::debug!("REQCOVER_NARRATIVE_PROVIDER env override applied");
        }
        if let Ok(model) = std::env::var("REQCOVER_NARRATIVE_MODEL") {
            config.narrative.model = model;
        }
        if let Ok(base_url) = std::env::var("REQCOVER_NARRATIVE_BASE_URL") {
            config.narrative.base_url = base_url;
        }
        if let Some(timeout) = std::env::var("REQCOVER_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.narrative.request_timeout_ms = timeout;
        }

        // Load runtime configuration from environment variables
        config.runtime = RuntimeConfig::load_from_env();

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.analysis.similarity_threshold) {
            anyhow::bail!(
                "similarity_threshold must be between 0.0 and 1.0, got {}",
                self.analysis.similarity_threshold
            );
        }
        if !(0.0..=2.0).contains(&self.narrative.temperature) {
            anyhow::bail!(
                "narrative temperature must be between 0.0 and 2.0, got {}",
                self.narrative.temperature
            );
        }
        if self.narrative.max_feedback_tokens == 0 || self.narrative.max_chat_tokens == 0 {
            anyhow::bail!("narrative token budgets must be greater than zero");
        }
        if self.narrative.request_timeout_ms == 0 {
            anyhow::bail!("narrative request_timeout_ms must be greater than zero");
        }
        if self.narrative.base_url.trim().is_empty() {
            anyhow::bail!("narrative base_url must not be empty");
        }
        Ok(())
    }
}
