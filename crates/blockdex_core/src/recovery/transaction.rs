//! The single batch that publishes a recovered index.

use crate::error::CoreResult;
use crate::metadata::schema::{put_block_location, put_tail_cursor};
use crate::metadata::{MetadataStore, WriteBatch};
use crate::scan::Replay;
use crate::types::TailCursor;
use tracing::debug;

/// Every index entry from a replay plus the tail cursor, staged as one batch.
///
/// Consumed by [`commit`](Self::commit); nothing is visible in the store
/// before that call succeeds.
#[derive(Debug)]
pub struct RecoveryTransaction {
    batch: WriteBatch,
    records: u64,
    tail: TailCursor,
}

impl RecoveryTransaction {
    /// Stages `replay` for commit.
    #[must_use]
    pub fn new(replay: Replay) -> Self {
        let mut batch = WriteBatch::new();
        for entry in &replay.entries {
            put_block_location(&mut batch, &entry.hash, entry.location);
        }
        put_tail_cursor(&mut batch, replay.tail);

        Self {
            batch,
            records: replay.count(),
            tail: replay.tail,
        }
    }

    /// Number of index entries staged.
    #[must_use]
    pub fn records(&self) -> u64 {
        self.records
    }

    /// The staged tail cursor.
    #[must_use]
    pub fn tail(&self) -> TailCursor {
        self.tail
    }

    /// Commits the staged batch and returns the number of index entries written.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Commit`](crate::CoreError::Commit) if the store
    /// could not persist the batch. The store is unchanged in that case.
    pub fn commit(self, store: &mut MetadataStore) -> CoreResult<u64> {
        debug!(records = self.records, tail = %self.tail, "committing recovered index");
        store.commit(self.batch)?;
        Ok(self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetadataConfig;
    use crate::metadata::schema::{block_location, indexed_blocks, tail_cursor};
    use crate::scan::IndexEntry;
    use crate::types::Location;
    use blockdex_codec::BlockHash;
    use tempfile::tempdir;

    fn replay() -> Replay {
        Replay {
            entries: vec![
                IndexEntry {
                    hash: BlockHash::from_bytes([1; 32]),
                    location: Location::new(0, 0, 50),
                },
                IndexEntry {
                    hash: BlockHash::from_bytes([2; 32]),
                    location: Location::new(0, 50, 80),
                },
                IndexEntry {
                    hash: BlockHash::from_bytes([3; 32]),
                    location: Location::new(1, 0, 30),
                },
            ],
            tail: TailCursor::new(1, 30),
        }
    }

    #[test]
    fn commit_publishes_entries_and_tail() {
        let dir = tempdir().unwrap();
        let mut store = MetadataStore::open(dir.path(), &MetadataConfig::default()).unwrap();

        let txn = RecoveryTransaction::new(replay());
        assert_eq!(txn.records(), 3);
        assert_eq!(txn.tail(), TailCursor::new(1, 30));
        assert_eq!(txn.commit(&mut store).unwrap(), 3);

        assert_eq!(store.len(), 4);
        assert_eq!(indexed_blocks(&store).unwrap().len(), 3);
        assert_eq!(
            block_location(&store, &BlockHash::from_bytes([2; 32])).unwrap(),
            Some(Location::new(0, 50, 80))
        );
        assert_eq!(tail_cursor(&store).unwrap(), Some(TailCursor::new(1, 30)));
    }

    #[test]
    fn empty_replay_still_records_tail() {
        let dir = tempdir().unwrap();
        let mut store = MetadataStore::open(dir.path(), &MetadataConfig::default()).unwrap();

        assert_eq!(
            RecoveryTransaction::new(Replay::default())
                .commit(&mut store)
                .unwrap(),
            0
        );
        assert_eq!(tail_cursor(&store).unwrap(), Some(TailCursor::new(0, 0)));
    }
}
