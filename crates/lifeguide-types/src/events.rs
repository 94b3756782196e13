use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ResponseMetadata;

/// Envelopes sent FROM client TO server over `/ws`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientEnvelope {
    /// Send a chat message to the assistant. `mode` and `conversationId`
    /// are kept raw so that unknown values degrade instead of failing.
    Chat {
        message: String,
        #[serde(default)]
        mode: Option<String>,
        #[serde(default)]
        conversation_id: Option<String>,
    },

    /// Bind the connection to a user id
    Auth { user_id: String },

    /// Any other `type`; ignored by the gateway.
    #[serde(other)]
    Unknown,
}

/// Envelopes sent FROM server TO client over `/ws`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerEnvelope {
    /// Sent once right after the upgrade
    Connected { message: String },

    /// Assistant answer to a `chat` envelope
    ChatResponse {
        content: String,
        metadata: ResponseMetadata,
        conversation_id: Option<Uuid>,
    },

    Error { message: String },
}

impl ServerEnvelope {
    pub fn connected() -> Self {
        Self::Connected {
            message: "WebSocket connection established".into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
