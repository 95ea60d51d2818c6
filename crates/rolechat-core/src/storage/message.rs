//! Typed message storage wrapper.

use crate::models::{ChatMessage, ChatRole, Topic};
use anyhow::Result;
use rolechat_storage::AppendedRaw;

/// Typed message storage wrapper around rolechat_storage::MessageStorage.
#[derive(Debug, Clone)]
pub struct MessageStorage {
    inner: rolechat_storage::MessageStorage,
}

impl MessageStorage {
    pub fn new(inner: rolechat_storage::MessageStorage) -> Self {
        Self { inner }
    }

    /// Append a message and bump the topic's `updated_at` in one commit.
    ///
    /// Returns `None` if the topic does not exist.
    pub fn append(&self, topic_id: u64, role: ChatRole, content: &str) -> Result<Option<(Topic, ChatMessage)>> {
        let appended = self.inner.append_with(
            topic_id,
            |bytes| {
                let mut topic: Topic = serde_json::from_slice(bytes)?;
                topic.touch();
                Ok(serde_json::to_vec(&topic)?)
            },
            |id| {
                let message = ChatMessage::new(id, topic_id, role, content);
                Ok(serde_json::to_vec(&message)?)
            },
        )?;
        appended.map(decode).transpose()
    }

    /// Create a topic together with its first message.
    pub fn append_to_new_topic(
        &self,
        user_id: u64,
        title: &str,
        role: ChatRole,
        content: &str,
    ) -> Result<(Topic, ChatMessage)> {
        let appended = self.inner.append_to_new_topic(
            |topic_id| Ok(serde_json::to_vec(&Topic::new(topic_id, user_id, title))?),
            |topic_id, id| {
                let message = ChatMessage::new(id, topic_id, role, content);
                Ok(serde_json::to_vec(&message)?)
            },
        )?;
        decode(appended)
    }

    /// Messages of a topic in ascending id order, after skipping `offset`.
    pub fn list(&self, topic_id: u64, limit: usize, offset: usize) -> Result<Vec<ChatMessage>> {
        self.inner
            .list_raw(topic_id, offset.saturating_add(limit))?
            .into_iter()
            .skip(offset)
            .map(|(_, bytes)| serde_json::from_slice(&bytes).map_err(anyhow::Error::from))
            .collect()
    }

    /// The newest `limit` messages of a topic, oldest first.
    pub fn recent(&self, topic_id: u64, limit: usize) -> Result<Vec<ChatMessage>> {
        self.inner
            .tail_raw(topic_id, limit)?
            .into_iter()
            .map(|(_, bytes)| serde_json::from_slice(&bytes).map_err(anyhow::Error::from))
            .collect()
    }
}

fn decode(appended: AppendedRaw) -> Result<(Topic, ChatMessage)> {
    Ok((
        serde_json::from_slice(&appended.topic)?,
        serde_json::from_slice(&appended.message)?,
    ))
}
