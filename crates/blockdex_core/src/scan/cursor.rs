//! Scan positions and the single-record step.

use crate::error::{CoreError, CoreResult};
use crate::segment::{DecodedRecord, RecordReader, SegmentStore};
use std::fmt;
use tracing::info;

/// Where the next record will be read.
///
/// A position is a value: stepping returns a new position and never
/// mutates the old one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPosition {
    /// Segment index.
    pub segment: u32,
    /// Byte offset within the segment.
    pub offset: u64,
    /// Segment length, once resolved. `None` until the scan enters the segment.
    pub length: Option<u64>,
}

/// Outcome of one [`ScanPosition::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A record was decoded; scanning continues at `next`.
    Record {
        /// Position after the record.
        next: ScanPosition,
        /// The decoded record, with its full location.
        record: DecodedRecord,
    },
    /// No further segment exists.
    Done,
}

impl ScanPosition {
    /// The canonical starting position: segment 0, offset 0, length unknown.
    #[must_use]
    pub const fn start() -> Self {
        Self {
            segment: 0,
            offset: 0,
            length: None,
        }
    }

    /// Returns the start of the following segment.
    fn next_segment(self) -> CoreResult<Self> {
        let segment = self.segment.checked_add(1).ok_or_else(|| {
            CoreError::decode(self.segment, self.offset, "segment index overflow")
        })?;
        Ok(Self {
            segment,
            offset: 0,
            length: None,
        })
    }

    /// Reads the record at this position and computes the position after it.
    ///
    /// An unknown length is resolved through the store's locator; a missing
    /// segment ends the scan. A position sitting exactly at the end of its
    /// segment (including an empty segment) rolls over to the next segment
    /// before anything is read.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Decode`] if the record cannot be decoded or its
    /// span runs past the end of the segment. Locator I/O failures are
    /// propagated unchanged.
    pub fn step<S: SegmentStore + ?Sized>(self, reader: &RecordReader<'_, S>) -> CoreResult<Step> {
        let mut position = self;

        let length = loop {
            let length = match position.length {
                Some(length) => length,
                None => match reader.store().locate(position.segment)? {
                    Some(length) => {
                        info!(segment = position.segment, length, "entering segment");
                        length
                    }
                    None => return Ok(Step::Done),
                },
            };

            if position.offset < length {
                position.length = Some(length);
                break length;
            }
            if position.offset > length {
                return Err(CoreError::decode(
                    position.segment,
                    position.offset,
                    format!("scan offset is past the segment length {length}"),
                ));
            }
            position = position.next_segment()?;
        };

        let (record, span) = reader.read(position.segment, position.offset)?;

        let new_offset = position.offset + span;
        if new_offset > length {
            return Err(CoreError::decode(
                position.segment,
                position.offset,
                format!("record span {span} overruns segment length {length}"),
            ));
        }

        let next = if new_offset == length {
            position.next_segment()?
        } else {
            Self {
                offset: new_offset,
                ..position
            }
        };

        Ok(Step::Record { next, record })
    }
}

impl Default for ScanPosition {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for ScanPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.length {
            Some(length) => write!(f, "{}:{}/{}", self.segment, self.offset, length),
            None => write!(f, "{}:{}/?", self.segment, self.offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{encode_frame, MemorySegmentStore};
    use crate::types::{Location, Network};
    use blockdex_codec::{encode_block, Block, BlockHash, BlockHeader};

    fn frame(nonce: u32) -> Vec<u8> {
        let block = Block {
            header: BlockHeader {
                version: 1,
                prev_block: BlockHash::from_bytes([3; 32]),
                merkle_root: [4; 32],
                timestamp: 0,
                bits: 0,
                nonce,
            },
            transactions: Vec::new(),
        };
        encode_frame(Network::Mainnet.magic(), &encode_block(&block).unwrap()).unwrap()
    }

    fn reader(store: &MemorySegmentStore) -> RecordReader<'_, MemorySegmentStore> {
        RecordReader::new(store, Network::Mainnet, 1 << 20)
    }

    fn expect_record(step: Step) -> (ScanPosition, DecodedRecord) {
        match step {
            Step::Record { next, record } => (next, record),
            Step::Done => panic!("expected a record"),
        }
    }

    #[test]
    fn no_segments_is_done() {
        let store = MemorySegmentStore::new();
        assert_eq!(ScanPosition::start().step(&reader(&store)).unwrap(), Step::Done);
    }

    #[test]
    fn advances_within_segment() {
        let a = frame(1);
        let a_len = a.len() as u64;
        let mut seg = a;
        seg.extend(frame(2));
        let total = seg.len() as u64;
        let store = MemorySegmentStore::from_segments(vec![seg]);

        let (next, record) = expect_record(ScanPosition::start().step(&reader(&store)).unwrap());
        assert_eq!(record.location, Location::new(0, 0, a_len as u32));
        assert_eq!(
            next,
            ScanPosition {
                segment: 0,
                offset: a_len,
                length: Some(total),
            }
        );
    }

    #[test]
    fn record_ending_at_segment_end_rolls_over() {
        let store = MemorySegmentStore::from_segments(vec![frame(1), frame(2)]);

        let (next, _) = expect_record(ScanPosition::start().step(&reader(&store)).unwrap());
        assert_eq!(
            next,
            ScanPosition {
                segment: 1,
                offset: 0,
                length: None,
            }
        );

        let (next, record) = expect_record(next.step(&reader(&store)).unwrap());
        assert_eq!(record.location.segment, 1);
        assert_eq!(record.location.offset, 0);
        assert_eq!(next.segment, 2);

        assert_eq!(next.step(&reader(&store)).unwrap(), Step::Done);
    }

    #[test]
    fn empty_segment_is_skipped() {
        let store = MemorySegmentStore::from_segments(vec![Vec::new(), frame(9)]);
        let (_, record) = expect_record(ScanPosition::start().step(&reader(&store)).unwrap());
        assert_eq!(record.location.segment, 1);
        assert_eq!(record.block.header.nonce, 9);
    }

    #[test]
    fn overrun_is_decode_error() {
        // The store reports a longer segment than the position believes it has.
        let seg = frame(1);
        let store = MemorySegmentStore::from_segments(vec![seg.clone()]);
        let position = ScanPosition {
            segment: 0,
            offset: 0,
            length: Some(seg.len() as u64 - 1),
        };
        let err = position.step(&reader(&store)).unwrap_err();
        assert!(matches!(err, CoreError::Decode { segment: 0, offset: 0, .. }));
        assert!(err.to_string().contains("overruns"));
    }

    #[test]
    fn offset_past_length_is_decode_error() {
        let store = MemorySegmentStore::from_segments(vec![frame(1)]);
        let position = ScanPosition {
            segment: 0,
            offset: 500,
            length: Some(10),
        };
        assert!(matches!(
            position.step(&reader(&store)),
            Err(CoreError::Decode { .. })
        ));
    }

    #[test]
    fn stepping_does_not_mutate_position() {
        let store = MemorySegmentStore::from_segments(vec![frame(1)]);
        let start = ScanPosition::start();
        let _ = start.step(&reader(&store)).unwrap();
        assert_eq!(start, ScanPosition::start());
        assert_eq!(start.to_string(), "0:0/?");
    }
}
