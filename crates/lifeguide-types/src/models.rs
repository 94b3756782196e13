use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Assistant persona that handles a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Career,
    Health,
    #[default]
    Dual,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Career => "career",
            Self::Health => "health",
            Self::Dual => "dual",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "career" => Some(Self::Career),
            "health" => Some(Self::Health),
            "dual" => Some(Self::Dual),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    #[default]
    Low,
    Medium,
    High,
    Emergency,
}

impl Urgency {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "emergency" => Some(Self::Emergency),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Career,
    Health,
    Combined,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Career => "career",
            Self::Health => "health",
            Self::Combined => "combined",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "career" => Some(Self::Career),
            "health" => Some(Self::Health),
            "combined" => Some(Self::Combined),
            _ => None,
        }
    }

    /// "Career", "Health", "Combined"
    pub fn label(&self) -> &'static str {
        match self {
            Self::Career => "Career",
            Self::Health => "Health",
            Self::Combined => "Combined",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string. Never sent to clients.
    #[serde(skip_serializing, default)]
    pub password: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    /// Free-form: anonymous WebSocket sessions use `demo-user-<clientId>`.
    pub user_id: String,
    pub title: String,
    pub mode: Mode,
    pub created_at: DateTime<Utc>,
}

/// Extra data attached to every assistant answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub mode: Mode,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    #[serde(default)]
    pub urgency: Urgency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiResponse {
    pub content: String,
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub user_id: String,
    pub career_data: Option<serde_json::Value>,
    pub health_data: Option<serde_json::Value>,
    pub preferences: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiReport {
    pub id: Uuid,
    pub user_id: String,
    #[serde(rename = "type")]
    pub report_type: ReportType,
    pub title: String,
    pub content: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

// -- Insert records --

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewConversation {
    pub user_id: String,
    pub title: String,
    pub mode: Mode,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_id: Uuid,
    pub role: Role,
    pub content: String,
    pub metadata: Option<ResponseMetadata>,
}

/// Partial profile update. `None` fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub career_data: Option<serde_json::Value>,
    pub health_data: Option<serde_json::Value>,
    pub preferences: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub report_type: ReportType,
    pub title: String,
    pub content: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_password_is_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            username: "ada".into(),
            email: "ada@example.com".into(),
            password: "$argon2id$hash".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["username"], "ada");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn report_type_serializes_under_type_key() {
        let report = AiReport {
            id: Uuid::new_v4(),
            user_id: "u1".into(),
            report_type: ReportType::Combined,
            title: "Combined Analysis Report".into(),
            content: serde_json::json!({ "summary": "ok" }),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["type"], "combined");
        assert_eq!(json["userId"], "u1");
    }

    #[test]
    fn metadata_omits_missing_suggestions() {
        let meta = ResponseMetadata {
            mode: Mode::Health,
            confidence: 0.0,
            suggestions: None,
            urgency: Urgency::Low,
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json, serde_json::json!({ "mode": "health", "confidence": 0.0, "urgency": "low" }));
    }

    #[test]
    fn mode_parse_matches_wire_names() {
        for mode in [Mode::Career, Mode::Health, Mode::Dual] {
            assert_eq!(Mode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(Mode::parse("finance"), None);
    }
}
