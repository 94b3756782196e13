use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use lifeguide_types::models::{
    AiReport, Conversation, Message, NewConversation, NewMessage, NewReport, NewUser,
    ProfileUpdate, User, UserProfile,
};

use crate::{Result, Storage, StoreError, merge_profile};

/// Process-local store. Everything is lost when the server stops.
#[derive(Default)]
pub struct MemStorage {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    /// Insertion order doubles as listing order.
    conversations: Vec<Conversation>,
    /// conversation_id -> messages in insertion order
    messages: HashMap<Uuid, Vec<Message>>,
    /// user_id -> profile
    profiles: HashMap<String, UserProfile>,
    reports: Vec<AiReport>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl Storage for MemStorage {
    fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.tables()?.users.get(&id).cloned())
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.tables()?.users.values().find(|u| u.email == email).cloned())
    }

    fn create_user(&self, new: NewUser) -> Result<User> {
        let mut tables = self.tables()?;
        if tables.users.values().any(|u| u.email == new.email) {
            return Err(StoreError::Conflict(format!("email {} already registered", new.email)));
        }
        if tables.users.values().any(|u| u.username == new.username) {
            return Err(StoreError::Conflict(format!("username {} already taken", new.username)));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password: new.password_hash,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>> {
        Ok(self.tables()?.conversations.iter().find(|c| c.id == id).cloned())
    }

    fn get_conversations_by_user(&self, user_id: &str) -> Result<Vec<Conversation>> {
        Ok(self
            .tables()?
            .conversations
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    fn create_conversation(&self, new: NewConversation) -> Result<Conversation> {
        let conversation = Conversation {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            title: new.title,
            mode: new.mode,
            created_at: Utc::now(),
        };
        self.tables()?.conversations.push(conversation.clone());
        Ok(conversation)
    }

    fn get_messages_by_conversation(&self, conversation_id: Uuid) -> Result<Vec<Message>> {
        let mut messages = self
            .tables()?
            .messages
            .get(&conversation_id)
            .cloned()
            .unwrap_or_default();
        // Stable: equal timestamps keep insertion order
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    fn create_message(&self, new: NewMessage) -> Result<Message> {
        let message = Message {
            id: Uuid::new_v4(),
            conversation_id: new.conversation_id,
            role: new.role,
            content: new.content,
            metadata: new.metadata,
            created_at: Utc::now(),
        };
        self.tables()?
            .messages
            .entry(message.conversation_id)
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    fn get_user_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        Ok(self.tables()?.profiles.get(user_id).cloned())
    }

    fn upsert_user_profile(&self, user_id: &str, update: ProfileUpdate) -> Result<UserProfile> {
        let mut tables = self.tables()?;
        if let Some(existing) = tables.profiles.get_mut(user_id) {
            merge_profile(existing, update);
            return Ok(existing.clone());
        }

        let now = Utc::now();
        let profile = UserProfile {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            career_data: update.career_data,
            health_data: update.health_data,
            preferences: update.preferences,
            created_at: now,
            updated_at: now,
        };
        tables.profiles.insert(user_id.to_string(), profile.clone());
        Ok(profile)
    }

    fn get_reports_by_user(&self, user_id: &str) -> Result<Vec<AiReport>> {
        let mut reports: Vec<AiReport> = self
            .tables()?
            .reports
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    fn create_report(&self, user_id: &str, new: NewReport) -> Result<AiReport> {
        let report = AiReport {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            report_type: new.report_type,
            title: new.title,
            content: new.content,
            created_at: Utc::now(),
        };
        self.tables()?.reports.push(report.clone());
        Ok(report)
    }
}
