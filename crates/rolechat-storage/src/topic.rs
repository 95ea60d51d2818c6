//! Topic storage - byte-level API for conversation topics.
//!
//! Topics are only written together with a message, see
//! [`crate::MessageStorage`].

use anyhow::Result;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

pub(crate) const TOPICS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("topics");
pub(crate) const TOPIC_SEQUENCE: &str = "topics";

/// Low-level topic storage with byte-level API
#[derive(Debug, Clone)]
pub struct TopicStorage {
    db: Arc<Database>,
}

impl TopicStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(TOPICS_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Get raw topic data by ID
    pub fn get_raw(&self, id: u64) -> Result<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TOPICS_TABLE)?;

        if let Some(data) = table.get(id)? {
            Ok(Some(data.value().to_vec()))
        } else {
            Ok(None)
        }
    }

    /// List all raw topic data in id order
    pub fn list_raw(&self) -> Result<Vec<(u64, Vec<u8>)>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TOPICS_TABLE)?;

        let mut topics = Vec::new();
        for item in table.iter()? {
            let (key, value) = item?;
            topics.push((key.value(), value.value().to_vec()));
        }

        Ok(topics)
    }
}
