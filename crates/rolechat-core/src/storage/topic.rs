//! Typed topic storage wrapper.
//!
//! Topics are written by [`super::MessageStorage`] together with a message.

use crate::models::Topic;
use anyhow::Result;

/// Typed topic storage wrapper around rolechat_storage::TopicStorage.
#[derive(Debug, Clone)]
pub struct TopicStorage {
    inner: rolechat_storage::TopicStorage,
}

impl TopicStorage {
    pub fn new(inner: rolechat_storage::TopicStorage) -> Self {
        Self { inner }
    }

    /// Get a topic by ID.
    pub fn get(&self, id: u64) -> Result<Option<Topic>> {
        match self.inner.get_raw(id)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// List a user's topics, most recently updated first.
    pub fn list_by_user(&self, user_id: u64, limit: usize) -> Result<Vec<Topic>> {
        let mut topics = Vec::new();
        for (_, bytes) in self.inner.list_raw()? {
            let topic: Topic = serde_json::from_slice(&bytes)?;
            if topic.is_owned_by(user_id) {
                topics.push(topic);
            }
        }

        topics.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        topics.truncate(limit);
        Ok(topics)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::ChatRole;
    use crate::storage::Storage;
    use tempfile::tempdir;

    #[test]
    fn test_get_and_list_by_user() {
        let temp_dir = tempdir().unwrap();
        let storage = Storage::new(temp_dir.path().join("test.db")).unwrap();

        let (first, _) = storage
            .messages
            .append_to_new_topic(1, "first", ChatRole::User, "a")
            .unwrap();
        let (second, _) = storage
            .messages
            .append_to_new_topic(1, "second", ChatRole::User, "b")
            .unwrap();
        storage
            .messages
            .append_to_new_topic(2, "other user", ChatRole::User, "c")
            .unwrap();

        assert_eq!(storage.topics.get(first.id).unwrap().unwrap().title, "first");
        assert!(storage.topics.get(99).unwrap().is_none());

        // Same-millisecond timestamps fall back to newest id first.
        let listed = storage.topics.list_by_user(1, 50).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);

        assert_eq!(storage.topics.list_by_user(1, 1).unwrap().len(), 1);
    }
}
