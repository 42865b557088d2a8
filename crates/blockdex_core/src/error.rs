//! Error types for blockdex core.

use crate::types::Location;
use blockdex_codec::BlockHash;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in blockdex core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] blockdex_storage::StorageError),

    /// Block codec error outside of a segment scan.
    #[error("codec error: {0}")]
    Codec(#[from] blockdex_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A metadata store already exists where one was to be created.
    #[error("metadata store {path:?} already exists")]
    AlreadyExists {
        /// Path of the existing store.
        path: PathBuf,
    },

    /// A segment record could not be decoded, or its span overruns the segment.
    #[error("corrupt record in segment {segment} at offset {offset}: {message}")]
    Decode {
        /// Segment holding the record.
        segment: u32,
        /// Offset of the record within the segment.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// The same block identity was found at two locations.
    #[error("block {hash} stored twice: first at {first}, again at {second}")]
    DuplicateIdentity {
        /// The repeated identity.
        hash: BlockHash,
        /// Where it was first seen.
        first: Location,
        /// Where it was seen again.
        second: Location,
    },

    /// The metadata engine failed to persist a batch.
    #[error("failed to commit metadata batch: {message}")]
    Commit {
        /// Description of the failure.
        message: String,
    },

    /// The scan was cancelled by the caller.
    #[error("recovery cancelled")]
    Cancelled,

    /// Invalid on-disk format.
    #[error("invalid format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// Checksum mismatch in a metadata snapshot.
    #[error("checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Stored checksum.
        expected: u32,
        /// Computed checksum.
        actual: u32,
    },

    /// Another process holds the metadata store lock.
    #[error("metadata store locked: another process has exclusive access")]
    DatabaseLocked,

    /// Network name not recognised.
    #[error("unrecognized network {name:?}")]
    UnknownNetwork {
        /// The rejected name.
        name: String,
    },
}

impl CoreError {
    /// Creates a decode error for the record at `segment`/`offset`.
    pub fn decode(segment: u32, offset: u64, message: impl Into<String>) -> Self {
        Self::Decode {
            segment,
            offset,
            message: message.into(),
        }
    }

    /// Creates a commit error.
    pub fn commit(message: impl Into<String>) -> Self {
        Self::Commit {
            message: message.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Returns whether this error means the segment data itself is unusable.
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::DuplicateIdentity { .. })
    }
}
