//! RoleChat Storage - Low-level storage abstraction layer
//!
//! This crate provides the persistence layer for RoleChat, using redb as the
//! embedded database. It exposes byte-level APIs; typed wrappers live in
//! rolechat-core.
//!
//! # Tables
//!
//! - `topics` - Conversation topics keyed by topic id
//! - `messages` - Messages keyed by `(topic_id, message_id)`
//! - `sequences` - Monotonic id counters

pub mod message;
pub mod paths;
pub mod sequence;
pub mod topic;

use anyhow::Result;
use redb::Database;
use std::path::Path;
use std::sync::Arc;

pub use message::{AppendedRaw, MessageStorage};
pub use topic::TopicStorage;

/// Central storage manager that initializes all storage subsystems
pub struct Storage {
    pub topics: TopicStorage,
    pub messages: MessageStorage,
}

impl Storage {
    /// Create a new storage instance at the given path.
    ///
    /// This will create the database file if it doesn't exist and initialize
    /// all required tables.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = Arc::new(Database::create(path)?);
        tracing::debug!(path = %path.display(), "Opened database");

        sequence::init(&db)?;
        let topics = TopicStorage::new(db.clone())?;
        let messages = MessageStorage::new(db)?;

        Ok(Self { topics, messages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_storage_reopens_with_data() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("rolechat.db");

        {
            let storage = Storage::new(&db_path).unwrap();
            let appended = storage
                .messages
                .append_to_new_topic(|id| Ok(id.to_be_bytes().to_vec()), |_, _| Ok(b"hi".to_vec()))
                .unwrap();
            assert_eq!(appended.topic_id, 1);
        }

        let storage = Storage::new(&db_path).unwrap();
        assert_eq!(storage.topics.get_raw(1).unwrap().unwrap(), 1u64.to_be_bytes());
        assert_eq!(storage.messages.list_raw(1, 10).unwrap().len(), 1);
        let appended = storage
            .messages
            .append_to_new_topic(|_| Ok(Vec::new()), |_, _| Ok(Vec::new()))
            .unwrap();
        assert_eq!((appended.topic_id, appended.message_id), (2, 2));
    }
}
