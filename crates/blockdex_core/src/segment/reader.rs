//! Reading and decoding one framed record.

use crate::error::{CoreError, CoreResult};
use crate::segment::frame::{frame_checksum, FrameHeader, CHECKSUM_SIZE, FRAME_HEADER_SIZE};
use crate::segment::store::SegmentStore;
use crate::types::{Location, Network};
use blockdex_codec::{decode_block, Block, BlockHash};
use blockdex_storage::StorageError;

/// A block read back from a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRecord {
    /// Identity of the block.
    pub hash: BlockHash,
    /// The decoded block.
    pub block: Block,
    /// Where the record was read from, span included.
    pub location: Location,
}

/// Reads framed block records out of a [`SegmentStore`].
///
/// A record is only ever read at an offset where the previous record ended,
/// so every failure here means the segment is corrupt. Running out of
/// segment mid-record is corruption too, not end-of-data.
#[derive(Debug)]
pub struct RecordReader<'a, S: ?Sized> {
    store: &'a S,
    network: Network,
    max_payload: u32,
}

impl<'a, S: SegmentStore + ?Sized> RecordReader<'a, S> {
    /// Creates a reader expecting frames for `network`.
    #[must_use]
    pub fn new(store: &'a S, network: Network, max_payload: u32) -> Self {
        Self {
            store,
            network,
            max_payload,
        }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &'a S {
        self.store
    }

    /// Reads the record starting at `offset` of `segment`.
    ///
    /// Returns the decoded record and the number of bytes it occupies.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Decode`] if the frame is truncated, carries the
    /// wrong network magic, declares an oversized payload, fails its
    /// checksum, or holds a payload that is not a valid block.
    pub fn read(&self, segment: u32, offset: u64) -> CoreResult<(DecodedRecord, u64)> {
        let header_bytes = self.read_bytes(segment, offset, FRAME_HEADER_SIZE)?;
        let header = FrameHeader::parse(&header_bytes)
            .ok_or_else(|| CoreError::decode(segment, offset, "short frame header"))?;

        if header.magic != self.network.magic() {
            return Err(CoreError::decode(
                segment,
                offset,
                format!(
                    "network magic {:08x} does not match {} ({:08x})",
                    header.magic,
                    self.network,
                    self.network.magic()
                ),
            ));
        }

        if header.payload_len > self.max_payload {
            return Err(CoreError::decode(
                segment,
                offset,
                format!(
                    "declared payload of {} bytes exceeds limit of {}",
                    header.payload_len, self.max_payload
                ),
            ));
        }

        let span = header.span();
        let location = self.location(segment, offset, span)?;

        let body_len = header.payload_len as usize + CHECKSUM_SIZE;
        let body = self.read_bytes(segment, offset + FRAME_HEADER_SIZE as u64, body_len)?;
        let (payload, crc_bytes) = body.split_at(header.payload_len as usize);

        let stored = u32::from_le_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
        let computed = frame_checksum(&header_bytes, payload);
        if stored != computed {
            return Err(CoreError::decode(
                segment,
                offset,
                format!("checksum mismatch: stored {stored:08x}, computed {computed:08x}"),
            ));
        }

        let block = decode_block(payload)
            .map_err(|e| CoreError::decode(segment, offset, format!("invalid block: {e}")))?;

        Ok((
            DecodedRecord {
                hash: block.hash(),
                block,
                location,
            },
            span,
        ))
    }

    fn read_bytes(&self, segment: u32, offset: u64, len: usize) -> CoreResult<Vec<u8>> {
        match self.store.read_at(segment, offset, len) {
            Err(CoreError::Storage(StorageError::ReadPastEnd { size, .. })) => {
                Err(CoreError::decode(
                    segment,
                    offset,
                    format!("record extends beyond end of segment ({size} bytes)"),
                ))
            }
            other => other,
        }
    }

    fn location(&self, segment: u32, offset: u64, span: u64) -> CoreResult<Location> {
        let fits = |value: u64| u32::try_from(value).ok();
        match (fits(offset), fits(span), fits(offset + span)) {
            (Some(offset), Some(span), Some(_)) => Ok(Location::new(segment, offset, span)),
            _ => Err(CoreError::decode(
                segment,
                offset,
                "record location does not fit in 32 bits",
            )),
        }
    }
}
