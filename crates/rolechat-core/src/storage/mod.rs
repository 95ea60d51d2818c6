//! Storage layer with typed wrappers around rolechat-storage.
//!
//! Converts between the chat models and the byte-level tables using JSON.

pub mod message;
pub mod topic;

use anyhow::Result;
use std::path::Path;

pub use message::MessageStorage;
pub use topic::TopicStorage;

/// Typed access to every chat table.
pub struct Storage {
    pub topics: TopicStorage,
    pub messages: MessageStorage,
}

impl Storage {
    /// Open (or create) the database at the given path.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let inner = rolechat_storage::Storage::new(path)?;
        Ok(Self {
            topics: TopicStorage::new(inner.topics),
            messages: MessageStorage::new(inner.messages),
        })
    }
}
