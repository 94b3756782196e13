use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use lifeguide_assistant::Assistant;
use lifeguide_db::{SharedStorage, StoreError};
use lifeguide_types::models::{AiResponse, Message, Mode, NewConversation, NewMessage, Role};

/// Messages of history handed to the assistant.
pub const CONTEXT_WINDOW: usize = 10;
/// Characters of the first message used as a conversation title.
pub const TITLE_MAX_CHARS: usize = 50;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("{0}")]
    Invalid(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct ChatReply {
    pub response: AiResponse,
    pub conversation_id: Uuid,
}

/// Persisting chat pipeline: conversation lookup, history, generation.
#[derive(Clone)]
pub struct ChatRelay {
    store: SharedStorage,
    assistant: Arc<Assistant>,
}

impl ChatRelay {
    pub fn new(store: SharedStorage, assistant: Arc<Assistant>) -> Self {
        Self { store, assistant }
    }

    pub fn store(&self) -> &SharedStorage {
        &self.store
    }

    /// Store the user's message, answer it with recent history as context
    /// and store the answer. An unknown `conversation_id` starts a new
    /// conversation.
    pub async fn handle(
        &self,
        user_id: &str,
        message: &str,
        mode: Mode,
        conversation_id: Option<Uuid>,
    ) -> Result<ChatReply, RelayError> {
        if message.trim().is_empty() {
            return Err(RelayError::Invalid("Message cannot be empty".into()));
        }

        let existing = match conversation_id {
            Some(id) => self.store.get_conversation(id)?,
            None => None,
        };
        let conversation_id = match existing {
            Some(conversation) => conversation.id,
            None => {
                let conversation = self.store.create_conversation(NewConversation {
                    user_id: user_id.to_string(),
                    title: conversation_title(message),
                    mode,
                })?;
                info!("{} started {} conversation {}", user_id, mode, conversation.id);
                conversation.id
            }
        };

        self.store.create_message(NewMessage {
            conversation_id,
            role: Role::User,
            content: message.to_string(),
            metadata: None,
        })?;

        let history = self.store.get_messages_by_conversation(conversation_id)?;
        let context = build_context(&history);
        debug!("Answering in {} mode with {} context lines", mode, context.len());

        let response = self.assistant.respond(mode, message, &context).await;

        self.store.create_message(NewMessage {
            conversation_id,
            role: Role::Assistant,
            content: response.content.clone(),
            metadata: Some(response.metadata.clone()),
        })?;

        Ok(ChatReply {
            response,
            conversation_id,
        })
    }
}

/// First 50 characters, with `...` when truncated.
pub fn conversation_title(message: &str) -> String {
    let mut chars = message.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// `role: content` lines for the last `CONTEXT_WINDOW` messages.
pub fn build_context(messages: &[Message]) -> Vec<String> {
    let start = messages.len().saturating_sub(CONTEXT_WINDOW);
    messages[start..]
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect()
}
