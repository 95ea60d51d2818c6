//! Message storage seam consumed by the context builder and the session
//! coordinator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Role of a persisted chat message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }

    /// Parse a role name. Blank input is treated as `user`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "user" => Some(ChatRole::User),
            "assistant" => Some(ChatRole::Assistant),
            "system" => Some(ChatRole::System),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single persisted message in a topic
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: u64,
    pub topic_id: u64,
    pub role: ChatRole,
    pub content: String,
    /// Milliseconds since the Unix epoch
    pub created_at: i64,
    pub updated_at: i64,
}

impl ChatMessage {
    pub fn new(id: u64, topic_id: u64, role: ChatRole, content: impl Into<String>) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id,
            topic_id,
            role,
            content: content.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Append-only view of a topic's message history.
///
/// Implementations must make an appended message visible to `list_recent`
/// as soon as `append_message` returns.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append a message to the end of a topic.
    async fn append_message(
        &self,
        topic_id: u64,
        role: ChatRole,
        content: &str,
    ) -> Result<ChatMessage>;

    /// The last `limit` messages of a topic, oldest first.
    async fn list_recent(&self, topic_id: u64, limit: usize) -> Result<Vec<ChatMessage>>;
}
