//! Orchestration facade tying parsing, analysis, conversations and
//! narrative generation together.
//!
//! `CoverageService` is explicitly constructed and owned by the host;
//! there are no globals. Collaborator failures (generator errors,
//! timeouts) are absorbed into synthesized messages so a turn or a
//! feedback request never loses the structured result.

use crate::analysis::{self, AnalysisReport};
use crate::config::Config;
use crate::conversations::{ConversationStore, ConversationSummary, Message, Role};
use crate::error::{CoverageError, Result};
use crate::narrative::{
    create_generator, GenerationOptions, NarrativeGenerator, PromptMessage, PromptRole,
};
use crate::parser;
use crate::prompts;
use crate::segmenter::{SentenceSegmenter, UnicodeSegmenter};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

/// Prior messages included in each chat turn.
const HISTORY_WINDOW: usize = 10;

/// Analysis report plus generated prose feedback.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackReport {
    pub analysis: AnalysisReport,
    pub feedback: String,
}

/// Result of one conversational turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub response: String,
    pub message_count: usize,
}

#[derive(Clone)]
pub struct CoverageService {
    config: Arc<Config>,
    store: Arc<ConversationStore>,
    generator: Arc<dyn NarrativeGenerator>,
    segmenter: Option<Arc<dyn SentenceSegmenter>>,
}

impl CoverageService {
    /// Build a service from configuration, selecting the narrative
    /// generator via the factory.
    pub fn new(config: Config) -> Result<Self> {
        let generator = create_generator(&config).map_err(|e| CoverageError::Config {
            message: e.to_string(),
        })?;
        Ok(Self::with_generator(config, generator))
    }

    /// Build a service around an injected generator.
    pub fn with_generator(config: Config, generator: Arc<dyn NarrativeGenerator>) -> Self {
        let segmenter: Option<Arc<dyn SentenceSegmenter>> =
            if config.analysis.sentence_segmentation {
                Some(Arc::new(UnicodeSegmenter))
            } else {
                None
            };
        Self {
            config: Arc::new(config),
            store: Arc::new(ConversationStore::new()),
            generator,
            segmenter,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Split a raw document into statements.
    pub fn parse_document(&self, raw: &str) -> Vec<String> {
        parser::parse_document(raw, self.segmenter.as_deref())
    }

    /// Parse both documents and run coverage analysis. `threshold` of
    /// `None` falls back to the configured similarity threshold.
    ///
    /// Stateless between calls; concurrent invocations never interfere.
    pub fn analyze(
        &self,
        requirements_raw: &str,
        design_raw: &str,
        threshold: Option<f64>,
    ) -> Result<AnalysisReport> {
        let threshold = threshold.unwrap_or(self.config.analysis.similarity_threshold);
        let requirements = self.parse_document(requirements_raw);
        let design = self.parse_document(design_raw);
        analysis::analyze(&requirements, &design, threshold)
    }

    /// Run coverage analysis, then ask the generator for prose feedback
    /// on the report. Analysis failures propagate; generator failures
    /// are absorbed into the feedback string so the structured report
    /// is never lost.
    pub async fn analyze_with_feedback(
        &self,
        requirements_raw: &str,
        design_raw: &str,
        threshold: Option<f64>,
    ) -> Result<FeedbackReport> {
        let threshold = threshold.unwrap_or(self.config.analysis.similarity_threshold);
        let requirements = self.parse_document(requirements_raw);
        let design = self.parse_document(design_raw);
        let analysis = analysis::analyze(&requirements, &design, threshold)?;

        let prompt = prompts::build_feedback_prompt(&analysis, &requirements, &design);
        let messages = vec![
            PromptMessage {
                role: PromptRole::System,
                content: prompts::FEEDBACK_SYSTEM_PROMPT.to_string(),
            },
            PromptMessage {
                role: PromptRole::User,
                content: prompt,
            },
        ];
        let opts = GenerationOptions {
            max_tokens: self.config.narrative.max_feedback_tokens,
            temperature: self.config.narrative.temperature,
        };
        let feedback = match self.call_generator(&messages, &opts).await {
            Ok(text) => text,
            Err(err) => {
                warn!("Feedback generation failed: {err}");
                format!("Error generating feedback: {err}")
            }
        };

        Ok(FeedbackReport { analysis, feedback })
    }

    /// Create a conversation, optionally pinning an analysis context to it.
    pub async fn start_conversation(&self, context: Option<serde_json::Value>) -> Uuid {
        self.store.create(context).await
    }

    /// Run one conversational turn: record the user message, generate a
    /// reply over the recent window, record and return it.
    ///
    /// Unknown ids are rejected. Generator errors and timeouts are
    /// absorbed: the synthesized error text becomes the assistant
    /// message and the turn still succeeds.
    pub async fn send_message(&self, id: Uuid, user_text: &str) -> Result<TurnOutcome> {
        let turn = self.store.begin_turn(id, user_text, HISTORY_WINDOW).await?;
        let messages = prompts::build_chat_messages(&turn.prior, user_text, turn.context.as_ref());
        let opts = GenerationOptions {
            max_tokens: self.config.narrative.max_chat_tokens,
            temperature: self.config.narrative.temperature,
        };

        // No conversation lock is held while the generator runs.
        let response = match self.call_generator(&messages, &opts).await {
            Ok(text) => text,
            Err(err) => {
                warn!("Chat generation failed: {err}");
                format!("Error generating response: {err}")
            }
        };

        let message_count = self.store.append(id, Role::Assistant, response.clone()).await?;
        Ok(TurnOutcome {
            response,
            message_count,
        })
    }

    /// Full message history for a conversation; empty for unknown ids.
    pub async fn get_history(&self, id: Uuid) -> Vec<Message> {
        self.store.history(id).await
    }

    pub async fn list_conversations(&self) -> Vec<ConversationSummary> {
        self.store.summaries().await
    }

    /// Bound a generator call with the configured timeout. The reqwest
    /// client carries its own timeout; this outer bound also covers
    /// generators that never touch HTTP.
    async fn call_generator(
        &self,
        messages: &[PromptMessage],
        opts: &GenerationOptions,
    ) -> anyhow::Result<String> {
        let timeout = Duration::from_millis(self.config.narrative.request_timeout_ms);
        match tokio::time::timeout(timeout, self.generator.generate(messages, opts)).await {
            Ok(result) => result,
            Err(_) => anyhow::bail!(
                "narrative generation timed out after {}ms",
                self.config.narrative.request_timeout_ms
            ),
        }
    }
}
