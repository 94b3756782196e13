use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use tracing::info;
use uuid::Uuid;

use lifeguide_types::models::{
    AiReport, Conversation, Message, Mode, NewConversation, NewMessage, NewReport, NewUser,
    ProfileUpdate, ReportType, Role, User, UserProfile,
};

use crate::{Result, Storage, StoreError, merge_profile, migrations};

/// SQLite-backed store. One connection behind a mutex; callers on the async
/// runtime should keep calls short.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        f(&conn)
    }
}

// -- Raw rows --

struct UserRow {
    id: String,
    username: String,
    email: String,
    password: String,
    created_at: String,
}

struct ConversationRow {
    id: String,
    user_id: String,
    title: String,
    mode: String,
    created_at: String,
}

struct MessageRow {
    id: String,
    conversation_id: String,
    role: String,
    content: String,
    metadata: Option<String>,
    created_at: String,
}

struct ProfileRow {
    id: String,
    user_id: String,
    career_data: Option<String>,
    health_data: Option<String>,
    preferences: Option<String>,
    created_at: String,
    updated_at: String,
}

struct ReportRow {
    id: String,
    user_id: String,
    report_type: String,
    title: String,
    content: String,
    created_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(Self {
            id: parse_uuid(&row.id)?,
            username: row.username,
            email: row.email,
            password: row.password,
            created_at: parse_ts(&row.created_at)?,
        })
    }
}

impl TryFrom<ConversationRow> for Conversation {
    type Error = StoreError;

    fn try_from(row: ConversationRow) -> Result<Self> {
        Ok(Self {
            id: parse_uuid(&row.id)?,
            user_id: row.user_id,
            title: row.title,
            mode: Mode::parse(&row.mode)
                .ok_or_else(|| StoreError::Corrupt(format!("mode '{}'", row.mode)))?,
            created_at: parse_ts(&row.created_at)?,
        })
    }
}

impl TryFrom<MessageRow> for Message {
    type Error = StoreError;

    fn try_from(row: MessageRow) -> Result<Self> {
        let metadata = row
            .metadata
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| StoreError::Corrupt(format!("metadata on message '{}': {}", row.id, e)))?;

        Ok(Self {
            id: parse_uuid(&row.id)?,
            conversation_id: parse_uuid(&row.conversation_id)?,
            role: Role::parse(&row.role)
                .ok_or_else(|| StoreError::Corrupt(format!("role '{}'", row.role)))?,
            content: row.content,
            metadata,
            created_at: parse_ts(&row.created_at)?,
        })
    }
}

impl TryFrom<ProfileRow> for UserProfile {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> Result<Self> {
        Ok(Self {
            id: parse_uuid(&row.id)?,
            user_id: row.user_id,
            career_data: parse_json_opt(row.career_data.as_deref())?,
            health_data: parse_json_opt(row.health_data.as_deref())?,
            preferences: parse_json_opt(row.preferences.as_deref())?,
            created_at: parse_ts(&row.created_at)?,
            updated_at: parse_ts(&row.updated_at)?,
        })
    }
}

impl TryFrom<ReportRow> for AiReport {
    type Error = StoreError;

    fn try_from(row: ReportRow) -> Result<Self> {
        Ok(Self {
            id: parse_uuid(&row.id)?,
            user_id: row.user_id,
            report_type: ReportType::parse(&row.report_type)
                .ok_or_else(|| StoreError::Corrupt(format!("report type '{}'", row.report_type)))?,
            title: row.title,
            content: serde_json::from_str(&row.content)
                .map_err(|e| StoreError::Corrupt(format!("content on report '{}': {}", row.id, e)))?,
            created_at: parse_ts(&row.created_at)?,
        })
    }
}

impl Storage for SqliteStorage {
    // -- Users --

    fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        self.with_conn(|conn| query_user(conn, "id", &id.to_string()))
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    fn create_user(&self, new: NewUser) -> Result<User> {
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password: new.password_hash,
            created_at: Utc::now(),
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![user.id.to_string(), user.username, user.email, user.password, ts(&user.created_at)],
            )
            .map_err(|e| match e.sqlite_error_code() {
                Some(ErrorCode::ConstraintViolation) => {
                    StoreError::Conflict(format!("user {} / {} already exists", user.username, user.email))
                }
                _ => StoreError::Sqlite(e),
            })?;
            Ok(())
        })?;

        Ok(user)
    }

    // -- Conversations --

    fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, user_id, title, mode, created_at FROM conversations WHERE id = ?1",
                [id.to_string()],
                conversation_row,
            )
            .optional()?
            .map(Conversation::try_from)
            .transpose()
        })
    }

    fn get_conversations_by_user(&self, user_id: &str) -> Result<Vec<Conversation>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, title, mode, created_at FROM conversations
                 WHERE user_id = ?1
                 ORDER BY rowid ASC",
            )?;
            let rows = stmt
                .query_map([user_id], conversation_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().map(Conversation::try_from).collect()
        })
    }

    fn create_conversation(&self, new: NewConversation) -> Result<Conversation> {
        let conversation = Conversation {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            title: new.title,
            mode: new.mode,
            created_at: Utc::now(),
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO conversations (id, user_id, title, mode, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    conversation.id.to_string(),
                    conversation.user_id,
                    conversation.title,
                    conversation.mode.as_str(),
                    ts(&conversation.created_at)
                ],
            )?;
            Ok(())
        })?;

        Ok(conversation)
    }

    // -- Messages --

    fn get_messages_by_conversation(&self, conversation_id: Uuid) -> Result<Vec<Message>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, conversation_id, role, content, metadata, created_at FROM messages
                 WHERE conversation_id = ?1
                 ORDER BY created_at ASC, rowid ASC",
            )?;
            let rows = stmt
                .query_map([conversation_id.to_string()], |row| {
                    Ok(MessageRow {
                        id: row.get(0)?,
                        conversation_id: row.get(1)?,
                        role: row.get(2)?,
                        content: row.get(3)?,
                        metadata: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().map(Message::try_from).collect()
        })
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
        let metadata = message
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StoreError::Corrupt(format!("unserializable metadata: {}", e)))?;

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, conversation_id, role, content, metadata, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    message.id.to_string(),
                    message.conversation_id.to_string(),
                    message.role.as_str(),
                    message.content,
                    metadata,
                    ts(&message.created_at)
                ],
            )?;
            Ok(())
        })?;

        Ok(message)
    }

    // -- Profiles --

    fn get_user_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        self.with_conn(|conn| query_profile(conn, user_id))
    }

    fn upsert_user_profile(&self, user_id: &str, update: ProfileUpdate) -> Result<UserProfile> {
        self.with_conn(|conn| {
            let profile = match query_profile(conn, user_id)? {
                Some(mut existing) => {
                    merge_profile(&mut existing, update);
                    existing
                }
                None => {
                    let now = Utc::now();
                    UserProfile {
                        id: Uuid::new_v4(),
                        user_id: user_id.to_string(),
                        career_data: update.career_data,
                        health_data: update.health_data,
                        preferences: update.preferences,
                        created_at: now,
                        updated_at: now,
                    }
                }
            };

            conn.execute(
                "INSERT INTO user_profiles (id, user_id, career_data, health_data, preferences, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(user_id) DO UPDATE SET
                    career_data = excluded.career_data,
                    health_data = excluded.health_data,
                    preferences = excluded.preferences,
                    updated_at = excluded.updated_at",
                params![
                    profile.id.to_string(),
                    profile.user_id,
                    profile.career_data.as_ref().map(|v| v.to_string()),
                    profile.health_data.as_ref().map(|v| v.to_string()),
                    profile.preferences.as_ref().map(|v| v.to_string()),
                    ts(&profile.created_at),
                    ts(&profile.updated_at)
                ],
            )?;

            Ok(profile)
        })
    }

    // -- Reports --

    fn get_reports_by_user(&self, user_id: &str) -> Result<Vec<AiReport>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, type, title, content, created_at FROM ai_reports
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(ReportRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        report_type: row.get(2)?,
                        title: row.get(3)?,
                        content: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().map(AiReport::try_from).collect()
        })
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

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO ai_reports (id, user_id, type, title, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    report.id.to_string(),
                    report.user_id,
                    report.report_type.as_str(),
                    report.title,
                    report.content.to_string(),
                    ts(&report.created_at)
                ],
            )?;
            Ok(())
        })?;

        Ok(report)
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<User>> {
    // `column` is always one of our own literals, never user input
    let sql = format!("SELECT id, username, email, password, created_at FROM users WHERE {column} = ?1");
    conn.query_row(&sql, [value], |row| {
        Ok(UserRow {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password: row.get(3)?,
            created_at: row.get(4)?,
        })
    })
    .optional()?
    .map(User::try_from)
    .transpose()
}

fn query_profile(conn: &Connection, user_id: &str) -> Result<Option<UserProfile>> {
    conn.query_row(
        "SELECT id, user_id, career_data, health_data, preferences, created_at, updated_at
         FROM user_profiles WHERE user_id = ?1",
        [user_id],
        |row| {
            Ok(ProfileRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                career_data: row.get(2)?,
                health_data: row.get(3)?,
                preferences: row.get(4)?,
                created_at: row.get(5)?,
                updated_at: row.get(6)?,
            })
        },
    )
    .optional()?
    .map(UserProfile::try_from)
    .transpose()
}

fn conversation_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConversationRow> {
    Ok(ConversationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        mode: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Fixed-width RFC 3339 so lexical order matches chronological order.
fn ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("timestamp '{}': {}", s, e)))
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    s.parse()
        .map_err(|e| StoreError::Corrupt(format!("id '{}': {}", s, e)))
}

fn parse_json_opt(s: Option<&str>) -> Result<Option<serde_json::Value>> {
    s.map(serde_json::from_str)
        .transpose()
        .map_err(|e| StoreError::Corrupt(format!("json column: {}", e)))
}
