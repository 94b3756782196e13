pub mod memory;
pub mod migrations;
pub mod sqlite;

use std::path::Path;
use std::sync::Arc;

use lifeguide_types::models::{
    AiReport, Conversation, Message, NewConversation, NewMessage, NewReport, NewUser,
    ProfileUpdate, User, UserProfile,
};
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemStorage;
pub use sqlite::SqliteStorage;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Persistence for users, conversations, messages, profiles and reports.
///
/// Records are never deleted. Implementations must return messages oldest
/// first (ties in insertion order) and reports newest first.
pub trait Storage: Send + Sync {
    // -- Users --
    fn get_user(&self, id: Uuid) -> Result<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    fn create_user(&self, user: NewUser) -> Result<User>;

    // -- Conversations --
    fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>>;
    fn get_conversations_by_user(&self, user_id: &str) -> Result<Vec<Conversation>>;
    fn create_conversation(&self, conversation: NewConversation) -> Result<Conversation>;

    // -- Messages --
    fn get_messages_by_conversation(&self, conversation_id: Uuid) -> Result<Vec<Message>>;
    fn create_message(&self, message: NewMessage) -> Result<Message>;

    // -- Profiles --
    fn get_user_profile(&self, user_id: &str) -> Result<Option<UserProfile>>;
    fn upsert_user_profile(&self, user_id: &str, update: ProfileUpdate) -> Result<UserProfile>;

    // -- Reports --
    fn get_reports_by_user(&self, user_id: &str) -> Result<Vec<AiReport>>;
    fn create_report(&self, user_id: &str, report: NewReport) -> Result<AiReport>;
}

pub type SharedStorage = Arc<dyn Storage>;

/// Open the configured backend: SQLite when a path is given, memory otherwise.
pub fn open(path: Option<&Path>) -> Result<SharedStorage> {
    match path {
        Some(path) => Ok(Arc::new(SqliteStorage::open(path)?)),
        None => {
            tracing::info!("Using in-memory storage; data is lost on restart");
            Ok(Arc::new(MemStorage::new()))
        }
    }
}

/// Apply a partial update on top of an existing profile.
pub(crate) fn merge_profile(profile: &mut UserProfile, update: ProfileUpdate) {
    if let Some(career) = update.career_data {
        profile.career_data = Some(career);
    }
    if let Some(health) = update.health_data {
        profile.health_data = Some(health);
    }
    if let Some(prefs) = update.preferences {
        profile.preferences = Some(prefs);
    }
    profile.updated_at = chrono::Utc::now();
}
