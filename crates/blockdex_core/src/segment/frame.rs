//! Record framing inside segment files.

use crate::error::{CoreError, CoreResult};
use crc32fast::Hasher;

/// Size of the frame header: network magic (4) + payload length (4).
pub const FRAME_HEADER_SIZE: usize = 8;

/// Size of the trailing checksum.
pub const CHECKSUM_SIZE: usize = 4;

/// Bytes a frame adds on top of its payload.
pub const FRAMING_OVERHEAD: u64 = (FRAME_HEADER_SIZE + CHECKSUM_SIZE) as u64;

/// Parsed frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Network magic.
    pub magic: u32,
    /// Declared payload length.
    pub payload_len: u32,
}

impl FrameHeader {
    /// Parses the first [`FRAME_HEADER_SIZE`] bytes of `data`.
    ///
    /// Returns `None` if `data` is too short.
    #[must_use]
    pub fn parse(data: &[u8]) -> Option<Self> {
        let header = data.get(..FRAME_HEADER_SIZE)?;
        Some(Self {
            magic: u32::from_le_bytes([header[0], header[1], header[2], header[3]]),
            payload_len: u32::from_le_bytes([header[4], header[5], header[6], header[7]]),
        })
    }

    /// Returns the on-disk span of the frame this header starts.
    #[must_use]
    pub const fn span(&self) -> u64 {
        self.payload_len as u64 + FRAMING_OVERHEAD
    }
}

/// Computes the frame checksum over header and payload.
#[must_use]
pub fn frame_checksum(header: &[u8], payload: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(header);
    hasher.update(payload);
    hasher.finalize()
}

/// Frames `payload` for `magic`.
///
/// ```text
/// | magic (4) | payload_len (4) | payload (N) | crc32 (4) |
/// ```
///
/// # Errors
///
/// Returns an error if `payload` is longer than `u32::MAX` bytes.
pub fn encode_frame(magic: u32, payload: &[u8]) -> CoreResult<Vec<u8>> {
    let payload_len = u32::try_from(payload.len()).map_err(|_| {
        CoreError::invalid_format(format!("payload of {} bytes cannot be framed", payload.len()))
    })?;
    let mut buf = Vec::with_capacity(payload.len() + FRAMING_OVERHEAD as usize);
    buf.extend_from_slice(&magic.to_le_bytes());
    buf.extend_from_slice(&payload_len.to_le_bytes());
    buf.extend_from_slice(payload);
    let crc = frame_checksum(&buf[..FRAME_HEADER_SIZE], payload);
    buf.extend_from_slice(&crc.to_le_bytes());
    Ok(buf)
}
