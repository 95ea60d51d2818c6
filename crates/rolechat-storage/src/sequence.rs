//! Monotonic id counters shared by the entity tables.

use anyhow::Result;
use redb::{Database, ReadableTable, TableDefinition, WriteTransaction};

const SEQUENCES_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequences");

pub(crate) fn init(db: &Database) -> Result<()> {
    let write_txn = db.begin_write()?;
    write_txn.open_table(SEQUENCES_TABLE)?;
    write_txn.commit()?;
    Ok(())
}

/// Allocate the next id for `name` inside an open write transaction.
///
/// Ids start at 1 and are never reused, even if the caller's transaction
/// later writes other tables and commits them together.
pub(crate) fn next_id(txn: &WriteTransaction, name: &str) -> Result<u64> {
    let mut table = txn.open_table(SEQUENCES_TABLE)?;
    let current = table.get(name)?.map(|v| v.value()).unwrap_or(0);
    let next = current + 1;
    table.insert(name, next)?;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_counters_are_independent() {
        let temp_dir = tempdir().unwrap();
        let db = Database::create(temp_dir.path().join("test.db")).unwrap();
        init(&db).unwrap();

        let txn = db.begin_write().unwrap();
        assert_eq!(next_id(&txn, "topics").unwrap(), 1);
        assert_eq!(next_id(&txn, "topics").unwrap(), 2);
        assert_eq!(next_id(&txn, "messages").unwrap(), 1);
        txn.commit().unwrap();

        let txn = db.begin_write().unwrap();
        assert_eq!(next_id(&txn, "topics").unwrap(), 3);
    }
}
