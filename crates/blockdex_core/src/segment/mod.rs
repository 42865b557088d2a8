//! Segment files holding framed block records.
//!
//! Segments are append-only files numbered from 0. Records are written back
//! to back with no index of their own; the only way to find record `n + 1`
//! is to decode record `n`.
//!
//! ## Record Format
//!
//! ```text
//! | network magic (4) | payload_len (4) | payload (N) | crc32 (4) |
//! ```
//!
//! All integers are little-endian. The checksum covers the header and the
//! payload. A record occupies `N + FRAMING_OVERHEAD` bytes.

mod frame;
mod reader;
mod store;

pub use frame::{
    encode_frame, frame_checksum, FrameHeader, CHECKSUM_SIZE, FRAMING_OVERHEAD, FRAME_HEADER_SIZE,
};
pub use reader::{DecodedRecord, RecordReader};
pub use store::{FileSegmentStore, MemorySegmentStore, SegmentStore};
