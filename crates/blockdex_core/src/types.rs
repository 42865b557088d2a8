//! Core type definitions for blockdex.

use crate::error::{CoreError, CoreResult};
use std::fmt;
use std::str::FromStr;

/// Where a record lives: segment, offset within it, and its on-disk span.
///
/// The span covers the payload plus the record framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    /// Segment index.
    pub segment: u32,
    /// Byte offset of the record within the segment.
    pub offset: u32,
    /// Total bytes occupied by the record, framing included.
    pub span: u32,
}

impl Location {
    /// Encoded size of a location value.
    pub const ENCODED_SIZE: usize = 12;

    /// Creates a new location.
    #[must_use]
    pub const fn new(segment: u32, offset: u32, span: u32) -> Self {
        Self {
            segment,
            offset,
            span,
        }
    }

    /// Returns the cursor pointing just past this record.
    #[must_use]
    pub const fn end(&self) -> TailCursor {
        TailCursor::new(self.segment, self.offset + self.span)
    }

    /// Encodes as `segment | offset | span`, each `u32` little-endian.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::ENCODED_SIZE] {
        let mut buf = [0u8; Self::ENCODED_SIZE];
        buf[0..4].copy_from_slice(&self.segment.to_le_bytes());
        buf[4..8].copy_from_slice(&self.offset.to_le_bytes());
        buf[8..12].copy_from_slice(&self.span.to_le_bytes());
        buf
    }

    /// Decodes a value produced by [`Self::to_bytes`].
    pub fn from_bytes(data: &[u8]) -> CoreResult<Self> {
        let data: &[u8; Self::ENCODED_SIZE] = data.try_into().map_err(|_| {
            CoreError::invalid_format(format!("location must be 12 bytes, got {}", data.len()))
        })?;
        Ok(Self {
            segment: u32::from_le_bytes([data[0], data[1], data[2], data[3]]),
            offset: u32::from_le_bytes([data[4], data[5], data[6], data[7]]),
            span: u32::from_le_bytes([data[8], data[9], data[10], data[11]]),
        })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.segment, self.offset, self.span)
    }
}

/// Position of the first unwritten byte in the segment sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TailCursor {
    /// Segment the next record would be appended to.
    pub segment: u32,
    /// Offset within that segment.
    pub offset: u32,
}

impl TailCursor {
    /// Encoded size of a cursor value.
    pub const ENCODED_SIZE: usize = 8;

    /// Creates a new cursor.
    #[must_use]
    pub const fn new(segment: u32, offset: u32) -> Self {
        Self { segment, offset }
    }

    /// Encodes as `segment | offset`, each `u32` little-endian.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::ENCODED_SIZE] {
        let mut buf = [0u8; Self::ENCODED_SIZE];
        buf[0..4].copy_from_slice(&self.segment.to_le_bytes());
        buf[4..8].copy_from_slice(&self.offset.to_le_bytes());
        buf
    }

    /// Decodes a value produced by [`Self::to_bytes`].
    pub fn from_bytes(data: &[u8]) -> CoreResult<Self> {
        let data: &[u8; Self::ENCODED_SIZE] = data.try_into().map_err(|_| {
            CoreError::invalid_format(format!("tail cursor must be 8 bytes, got {}", data.len()))
        })?;
        Ok(Self {
            segment: u32::from_le_bytes([data[0], data[1], data[2], data[3]]),
            offset: u32::from_le_bytes([data[4], data[5], data[6], data[7]]),
        })
    }
}

impl fmt::Display for TailCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.segment, self.offset)
    }
}

/// The chain a block store belongs to.
///
/// Every record frame starts with the network's magic, so a store can only
/// be recovered under the network it was written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Network {
    /// Main network.
    #[default]
    Mainnet,
    /// Test network.
    Testnet,
}

impl Network {
    /// Returns the magic value written at the start of every record frame.
    #[must_use]
    pub const fn magic(self) -> u32 {
        match self {
            Self::Mainnet => 0xD9B4_BEF9,
            Self::Testnet => 0x0709_110B,
        }
    }

    /// Returns the data directory name used for this network.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for Network {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "mainnet" => Ok(Self::Mainnet),
            "testnet" => Ok(Self::Testnet),
            other => Err(CoreError::UnknownNetwork {
                name: other.to_string(),
            }),
        }
    }
}
