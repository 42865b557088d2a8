//! Full forward replay of every segment.

use crate::config::RecoveryConfig;
use crate::error::{CoreError, CoreResult};
use crate::scan::cursor::{ScanPosition, Step};
use crate::segment::{RecordReader, SegmentStore};
use crate::types::{Location, TailCursor};
use blockdex_codec::BlockHash;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// One rebuilt index record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Block identity.
    pub hash: BlockHash,
    /// Where the block is stored.
    pub location: Location,
}

/// Everything a replay recovered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Replay {
    /// One entry per decoded record, in scan order.
    pub entries: Vec<IndexEntry>,
    /// First unwritten byte: the end of the last record, or `0:0` if there were none.
    pub tail: TailCursor,
}

impl Replay {
    /// Number of records decoded.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.entries.len() as u64
    }
}

/// Drives [`ScanPosition::step`] from the start of segment 0 to the end of data.
pub struct Replayer<'a, S: ?Sized> {
    reader: RecordReader<'a, S>,
    progress_interval: u64,
    cancel: Option<&'a AtomicBool>,
}

impl<'a, S: SegmentStore + ?Sized> Replayer<'a, S> {
    /// Creates a replayer over `store`.
    #[must_use]
    pub fn new(store: &'a S, config: &RecoveryConfig) -> Self {
        Self {
            reader: RecordReader::new(store, config.network, config.max_block_payload),
            progress_interval: config.progress_interval,
            cancel: None,
        }
    }

    /// Checks `flag` before every record and stops with [`CoreError::Cancelled`] once it is set.
    #[must_use]
    pub fn with_cancellation(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Scans every segment and returns the rebuilt index.
    ///
    /// Nothing is returned on failure: the first error aborts the scan and
    /// the entries gathered so far are dropped.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Decode`] for a corrupt record
    /// - [`CoreError::DuplicateIdentity`] if a block hash appears twice
    /// - [`CoreError::Cancelled`] if the cancellation flag was raised
    pub fn replay(&self) -> CoreResult<Replay> {
        let mut replay = Replay::default();
        let mut seen: HashMap<BlockHash, Location> = HashMap::new();
        let mut position = ScanPosition::start();

        loop {
            if self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                info!(records = replay.count(), at = %position, "replay cancelled");
                return Err(CoreError::Cancelled);
            }

            let (next, record) = match position.step(&self.reader)? {
                Step::Record { next, record } => (next, record),
                Step::Done => break,
            };

            if let Some(&first) = seen.get(&record.hash) {
                return Err(CoreError::DuplicateIdentity {
                    hash: record.hash,
                    first,
                    second: record.location,
                });
            }
            seen.insert(record.hash, record.location);

            debug!(hash = %record.hash, location = %record.location, "indexed block");
            replay.tail = record.location.end();
            replay.entries.push(IndexEntry {
                hash: record.hash,
                location: record.location,
            });

            if self.progress_interval > 0 && replay.count() % self.progress_interval == 0 {
                info!(records = replay.count(), segment = next.segment, "replay progress");
            }

            position = next;
        }

        info!(records = replay.count(), tail = %replay.tail, "replay complete");
        Ok(replay)
    }
}
