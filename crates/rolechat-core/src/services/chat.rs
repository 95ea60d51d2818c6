//! Topic and message operations with ownership checks.

use std::sync::Arc;

use async_trait::async_trait;
use rolechat_traits::{MessageStore, StoreError, StoreResult};
use thiserror::Error;

use crate::models::{ChatMessage, ChatRole, Topic, derive_title};
use crate::storage::Storage;

pub const DEFAULT_TOPIC_LIMIT: usize = 50;
pub const MAX_TOPIC_LIMIT: usize = 100;
pub const DEFAULT_MESSAGE_LIMIT: usize = 100;
pub const MAX_MESSAGE_LIMIT: usize = 200;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("topic not found")]
    TopicNotFound(u64),

    #[error("forbidden")]
    Forbidden,

    #[error("content required")]
    EmptyContent,

    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Result of appending a message through the service.
#[derive(Debug, Clone)]
pub struct AddedMessage {
    pub topic: Topic,
    pub message: ChatMessage,
    pub new_topic: bool,
}

/// Chat topics and messages over the typed storage.
///
/// redb calls are synchronous, so every operation runs on the blocking pool.
#[derive(Clone)]
pub struct ChatService {
    storage: Arc<Storage>,
}

impl ChatService {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, ChatError>
    where
        T: Send + 'static,
        F: FnOnce(&Storage) -> Result<T, ChatError> + Send + 'static,
    {
        let storage = self.storage.clone();
        tokio::task::spawn_blocking(move || f(&storage))
            .await
            .map_err(|e| ChatError::Storage(anyhow::anyhow!("storage task failed: {}", e)))?
    }

    /// Look up a topic that must exist and belong to `user_id`.
    pub async fn owned_topic(&self, user_id: u64, topic_id: u64) -> Result<Topic, ChatError> {
        self.blocking(move |storage| owned_topic(storage, user_id, topic_id))
            .await
    }

    /// Append a message, creating the topic when `topic_id == 0`.
    ///
    /// A new topic is titled from `content` and committed together with the
    /// message, so a failed append never leaves an empty topic behind.
    pub async fn add_message(
        &self,
        user_id: u64,
        topic_id: u64,
        role: ChatRole,
        content: &str,
    ) -> Result<AddedMessage, ChatError> {
        if content.trim().is_empty() {
            return Err(ChatError::EmptyContent);
        }
        let content = content.to_string();
        self.blocking(move |storage| {
            if topic_id == 0 {
                let title = derive_title(&content);
                let (topic, message) = storage
                    .messages
                    .append_to_new_topic(user_id, &title, role, &content)?;
                tracing::debug!(topic_id = topic.id, user_id, "Created topic");
                return Ok(AddedMessage {
                    topic,
                    message,
                    new_topic: true,
                });
            }
            owned_topic(storage, user_id, topic_id)?;
            let (topic, message) = append_blocking(storage, topic_id, role, &content)?;
            Ok(AddedMessage {
                topic,
                message,
                new_topic: false,
            })
        })
        .await
    }

    /// A user's topics, most recently updated first.
    pub async fn list_topics(&self, user_id: u64, limit: Option<usize>) -> Result<Vec<Topic>, ChatError> {
        let limit = clamp_limit(limit, DEFAULT_TOPIC_LIMIT, MAX_TOPIC_LIMIT);
        self.blocking(move |storage| Ok(storage.topics.list_by_user(user_id, limit)?))
            .await
    }

    /// Messages of an owned topic, oldest first.
    pub async fn list_messages(
        &self,
        user_id: u64,
        topic_id: u64,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        let limit = clamp_limit(limit, DEFAULT_MESSAGE_LIMIT, MAX_MESSAGE_LIMIT);
        self.blocking(move |storage| {
            owned_topic(storage, user_id, topic_id)?;
            Ok(storage.messages.list(topic_id, limit, offset)?)
        })
        .await
    }
}

fn clamp_limit(limit: Option<usize>, default: usize, max: usize) -> usize {
    match limit {
        Some(0) | None => default,
        Some(n) => n.min(max),
    }
}

fn owned_topic(storage: &Storage, user_id: u64, topic_id: u64) -> Result<Topic, ChatError> {
    let topic = storage
        .topics
        .get(topic_id)?
        .ok_or(ChatError::TopicNotFound(topic_id))?;
    if !topic.is_owned_by(user_id) {
        return Err(ChatError::Forbidden);
    }
    Ok(topic)
}

fn append_blocking(
    storage: &Storage,
    topic_id: u64,
    role: ChatRole,
    content: &str,
) -> Result<(Topic, ChatMessage), ChatError> {
    storage
        .messages
        .append(topic_id, role, content)?
        .ok_or(ChatError::TopicNotFound(topic_id))
}

#[async_trait]
impl MessageStore for ChatService {
    async fn append_message(
        &self,
        topic_id: u64,
        role: ChatRole,
        content: &str,
    ) -> StoreResult<ChatMessage> {
        if content.is_empty() {
            return Err(StoreError::EmptyContent);
        }
        let content = content.to_string();
        self.blocking(move |storage| {
            append_blocking(storage, topic_id, role, &content).map(|(_, message)| message)
        })
        .await
            .map_err(StoreError::from)
    }

    async fn list_recent(&self, topic_id: u64, limit: usize) -> StoreResult<Vec<ChatMessage>> {
        self.blocking(move |storage| Ok(storage.messages.recent(topic_id, limit)?))
            .await
            .map_err(StoreError::from)
    }
}

impl From<ChatError> for StoreError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::TopicNotFound(id) => StoreError::TopicNotFound(id),
            ChatError::EmptyContent => StoreError::EmptyContent,
            ChatError::Storage(e) => StoreError::Other(e),
            other => StoreError::Other(anyhow::anyhow!(other.to_string())),
        }
    }
}
