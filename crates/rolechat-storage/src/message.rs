//! Message storage - byte-level API for topic messages.
//!
//! Messages are keyed by `(topic_id, message_id)` so a topic's messages are
//! a contiguous, id-ordered range. Every append also rewrites the owning
//! topic record in the same write transaction.

use anyhow::Result;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

use crate::sequence;
use crate::topic::{TOPIC_SEQUENCE, TOPICS_TABLE};

const MESSAGES_TABLE: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("messages");
const MESSAGE_SEQUENCE: &str = "messages";

/// Topic and message bytes as committed by one append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendedRaw {
    pub topic_id: u64,
    pub topic: Vec<u8>,
    pub message_id: u64,
    pub message: Vec<u8>,
}

/// Low-level message storage with byte-level API
#[derive(Debug, Clone)]
pub struct MessageStorage {
    db: Arc<Database>,
}

impl MessageStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(MESSAGES_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Append a message to an existing topic.
    ///
    /// `touch` receives the stored topic bytes and returns their replacement,
    /// `build` receives the allocated message id. Both writes commit together;
    /// if either closure fails nothing is written. Returns `None` when the
    /// topic does not exist.
    pub fn append_with<T, B>(&self, topic_id: u64, touch: T, build: B) -> Result<Option<AppendedRaw>>
    where
        T: FnOnce(&[u8]) -> Result<Vec<u8>>,
        B: FnOnce(u64) -> Result<Vec<u8>>,
    {
        let write_txn = self.db.begin_write()?;
        let appended = {
            let mut topics = write_txn.open_table(TOPICS_TABLE)?;
            let current = match topics.get(topic_id)? {
                Some(data) => data.value().to_vec(),
                None => return Ok(None),
            };
            let topic = touch(&current)?;
            topics.insert(topic_id, topic.as_slice())?;

            let message_id = sequence::next_id(&write_txn, MESSAGE_SEQUENCE)?;
            let message = build(message_id)?;
            let mut messages = write_txn.open_table(MESSAGES_TABLE)?;
            messages.insert((topic_id, message_id), message.as_slice())?;

            AppendedRaw {
                topic_id,
                topic,
                message_id,
                message,
            }
        };
        write_txn.commit()?;
        Ok(Some(appended))
    }

    /// Create a topic and store its first message in one transaction.
    ///
    /// `create` receives the new topic id, `build` receives the topic id and
    /// the message id.
    pub fn append_to_new_topic<C, B>(&self, create: C, build: B) -> Result<AppendedRaw>
    where
        C: FnOnce(u64) -> Result<Vec<u8>>,
        B: FnOnce(u64, u64) -> Result<Vec<u8>>,
    {
        let write_txn = self.db.begin_write()?;
        let appended = {
            let topic_id = sequence::next_id(&write_txn, TOPIC_SEQUENCE)?;
            let topic = create(topic_id)?;
            let mut topics = write_txn.open_table(TOPICS_TABLE)?;
            topics.insert(topic_id, topic.as_slice())?;

            let message_id = sequence::next_id(&write_txn, MESSAGE_SEQUENCE)?;
            let message = build(topic_id, message_id)?;
            let mut messages = write_txn.open_table(MESSAGES_TABLE)?;
            messages.insert((topic_id, message_id), message.as_slice())?;

            AppendedRaw {
                topic_id,
                topic,
                message_id,
                message,
            }
        };
        write_txn.commit()?;
        Ok(appended)
    }

    /// First `limit` messages of a topic in ascending id order.
    pub fn list_raw(&self, topic_id: u64, limit: usize) -> Result<Vec<(u64, Vec<u8>)>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MESSAGES_TABLE)?;

        let mut messages = Vec::new();
        for item in table.range((topic_id, 0)..=(topic_id, u64::MAX))?.take(limit) {
            let (key, value) = item?;
            messages.push((key.value().1, value.value().to_vec()));
        }

        Ok(messages)
    }

    /// Last `limit` messages of a topic, returned in ascending id order.
    pub fn tail_raw(&self, topic_id: u64, limit: usize) -> Result<Vec<(u64, Vec<u8>)>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MESSAGES_TABLE)?;

        let mut messages = Vec::new();
        for item in table
            .range((topic_id, 0)..=(topic_id, u64::MAX))?
            .rev()
            .take(limit)
        {
            let (key, value) = item?;
            messages.push((key.value().1, value.value().to_vec()));
        }
        messages.reverse();

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TopicStorage;
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, TopicStorage, MessageStorage) {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(Database::create(db_path).unwrap());
        sequence::init(&db).unwrap();
        let topics = TopicStorage::new(db.clone()).unwrap();
        let messages = MessageStorage::new(db).unwrap();
        (temp_dir, topics, messages)
    }

    fn new_topic(storage: &MessageStorage, text: &str) -> AppendedRaw {
        storage
            .append_to_new_topic(|_| Ok(b"t0".to_vec()), |_, _| Ok(text.as_bytes().to_vec()))
            .unwrap()
    }

    fn append(storage: &MessageStorage, topic_id: u64, text: &str) -> u64 {
        storage
            .append_with(
                topic_id,
                |current| Ok([current, b"+".as_slice()].concat()),
                |_| Ok(text.as_bytes().to_vec()),
            )
            .unwrap()
            .unwrap()
            .message_id
    }

    #[test]
    fn test_ids_are_global_and_ranges_per_topic() {
        let (_dir, _topics, storage) = setup();
        let first = new_topic(&storage, "a");
        let second = new_topic(&storage, "x");
        assert_eq!((first.topic_id, first.message_id), (1, 1));
        assert_eq!((second.topic_id, second.message_id), (2, 2));
        assert_eq!(append(&storage, 1, "b"), 3);

        let topic_one = storage.list_raw(1, 100).unwrap();
        assert_eq!(topic_one, vec![(1, b"a".to_vec()), (3, b"b".to_vec())]);
        assert_eq!(storage.list_raw(2, 100).unwrap(), vec![(2, b"x".to_vec())]);
    }

    #[test]
    fn test_append_rewrites_topic_in_same_commit() {
        let (_dir, topics, storage) = setup();
        let created = new_topic(&storage, "m1");
        assert_eq!(topics.get_raw(created.topic_id).unwrap().unwrap(), b"t0");

        let appended = storage
            .append_with(created.topic_id, |current| Ok([current, b"+".as_slice()].concat()), |_| {
                Ok(b"m2".to_vec())
            })
            .unwrap()
            .unwrap();
        assert_eq!(appended.topic, b"t0+");
        assert_eq!(topics.get_raw(created.topic_id).unwrap().unwrap(), b"t0+");
    }

    #[test]
    fn test_append_to_missing_topic_writes_nothing() {
        let (_dir, topics, storage) = setup();
        let result = storage
            .append_with(7, |current| Ok(current.to_vec()), |_| Ok(b"m".to_vec()))
            .unwrap();
        assert!(result.is_none());
        assert!(topics.get_raw(7).unwrap().is_none());
        assert!(storage.list_raw(7, 10).unwrap().is_empty());
    }

    #[test]
    fn test_failed_build_leaves_topic_untouched() {
        let (_dir, topics, storage) = setup();
        let created = new_topic(&storage, "m1");

        let result = storage.append_with(
            created.topic_id,
            |_| Ok(b"touched".to_vec()),
            |_| Err(anyhow::anyhow!("encode failed")),
        );
        assert!(result.is_err());
        assert_eq!(topics.get_raw(created.topic_id).unwrap().unwrap(), b"t0");
        assert_eq!(storage.list_raw(created.topic_id, 10).unwrap().len(), 1);
    }

    #[test]
    fn test_failed_first_message_creates_no_topic() {
        let (_dir, topics, storage) = setup();
        let result = storage.append_to_new_topic(
            |_| Ok(b"t".to_vec()),
            |_, _| Err(anyhow::anyhow!("encode failed")),
        );
        assert!(result.is_err());
        assert!(topics.list_raw().unwrap().is_empty());
    }

    #[test]
    fn test_tail_returns_newest_in_ascending_order() {
        let (_dir, _topics, storage) = setup();
        let topic_id = new_topic(&storage, "m1").topic_id;
        for text in ["m2", "m3", "m4"] {
            append(&storage, topic_id, text);
        }

        let tail = storage.tail_raw(topic_id, 2).unwrap();
        let texts: Vec<Vec<u8>> = tail.into_iter().map(|(_, data)| data).collect();
        assert_eq!(texts, vec![b"m3".to_vec(), b"m4".to_vec()]);

        assert_eq!(storage.tail_raw(topic_id, 10).unwrap().len(), 4);
        assert!(storage.tail_raw(topic_id + 1, 10).unwrap().is_empty());
    }

    #[test]
    fn test_list_respects_limit() {
        let (_dir, _topics, storage) = setup();
        let topic_id = new_topic(&storage, "m1").topic_id;
        for text in ["m2", "m3"] {
            append(&storage, topic_id, text);
        }
        assert_eq!(storage.list_raw(topic_id, 2).unwrap().len(), 2);
    }
}
