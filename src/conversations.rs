//! In-memory conversation arena.
//!
//! One locked map owns the conversations; each conversation serializes its
//! own mutations behind a per-cell mutex, so unrelated conversations never
//! contend. The outer map lock is only ever held for lookup or insert,
//! never across an await on a cell lock or an external call.

use crate::error::{CoverageError, Result};
use crate::prompts::WELCOME_MESSAGE;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a conversation log. Logs are append-only; messages are
/// never edited, reordered, or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Snapshot taken at the start of a turn: the windowed history preceding
/// the just-appended user message, plus the attached analysis context.
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub prior: Vec<Message>,
    pub context: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub conversation_id: Uuid,
    pub message_count: usize,
    pub created_at: Option<DateTime<Utc>>,
    pub last_message: Option<DateTime<Utc>>,
}

struct ConversationCell {
    /// Attached at creation, immutable afterwards.
    context: Option<serde_json::Value>,
    messages: Mutex<Vec<Message>>,
}

/// Conversations live for the process lifetime only; nothing is persisted.
pub struct ConversationStore {
    conversations: RwLock<HashMap<Uuid, Arc<ConversationCell>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
        }
    }

    /// Create a conversation, optionally attaching an analysis context.
    /// The welcome message is seeded before the id becomes visible, so a
    /// conversation always opens with exactly one assistant message.
    pub async fn create(&self, context: Option<serde_json::Value>) -> Uuid {
        let id = Uuid::new_v4();
        let cell = Arc::new(ConversationCell {
            context,
            messages: Mutex::new(vec![Message {
                role: Role::Assistant,
                content: WELCOME_MESSAGE.to_string(),
                timestamp: Utc::now(),
            }]),
        });
        self.conversations.write().await.insert(id, cell);
        debug!("created conversation {}", id);
        id
    }

    async fn lookup(&self, id: &Uuid) -> Option<Arc<ConversationCell>> {
        self.conversations.read().await.get(id).cloned()
    }

    async fn cell(&self, id: &Uuid) -> Result<Arc<ConversationCell>> {
        self.lookup(id)
            .await
            .ok_or_else(|| CoverageError::InvalidConversation { id: id.to_string() })
    }

    /// Append a message and return the new message count. Unknown ids fail
    /// with `InvalidConversation`.
    pub async fn append(&self, id: Uuid, role: Role, content: String) -> Result<usize> {
        let cell = self.cell(&id).await?;
        let mut messages = cell.messages.lock().await;
        messages.push(Message {
            role,
            content,
            timestamp: Utc::now(),
        });
        Ok(messages.len())
    }

    /// Atomically append the user message and snapshot the last `window`
    /// messages that preceded it, plus the attached context. A single lock
    /// acquisition keeps "preceding" well-defined under concurrent turns.
    pub async fn begin_turn(
        &self,
        id: Uuid,
        user_text: &str,
        window: usize,
    ) -> Result<TurnContext> {
        let cell = self.cell(&id).await?;
        let mut messages = cell.messages.lock().await;
        let start = messages.len().saturating_sub(window);
        let prior = messages[start..].to_vec();
        messages.push(Message {
            role: Role::User,
            content: user_text.to_string(),
            timestamp: Utc::now(),
        });
        Ok(TurnContext {
            prior,
            context: cell.context.clone(),
        })
    }

    /// Full message log. Unknown ids read as empty rather than failing;
    /// distinguishing the two is the caller's concern.
    pub async fn history(&self, id: Uuid) -> Vec<Message> {
        let cell = self.lookup(&id).await;
        match cell {
            Some(cell) => cell.messages.lock().await.clone(),
            None => Vec::new(),
        }
    }

    /// Per-conversation counts and timestamps, in no particular order.
    pub async fn summaries(&self) -> Vec<ConversationSummary> {
        let cells: Vec<(Uuid, Arc<ConversationCell>)> = self
            .conversations
            .read()
            .await
            .iter()
            .map(|(id, cell)| (*id, Arc::clone(cell)))
            .collect();

        let mut summaries = Vec::with_capacity(cells.len());
        for (id, cell) in cells {
            let messages = cell.messages.lock().await;
            summaries.push(ConversationSummary {
                conversation_id: id,
                message_count: messages.len(),
                created_at: messages.first().map(|m| m.timestamp),
                last_message: messages.last().map(|m| m.timestamp),
            });
        }
        summaries
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}
