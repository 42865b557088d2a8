//! Key layout of the block index inside the metadata store.
//!
//! | key | value |
//! |---|---|
//! | `blockidx/` + hash (32) | [`Location`], 12 bytes |
//! | `meta/write-cursor` | [`TailCursor`], 8 bytes |
//! | `meta/version` | format version, `u32` LE |

use crate::error::{CoreError, CoreResult};
use crate::metadata::{MetadataStore, WriteBatch};
use crate::types::{Location, TailCursor};
use blockdex_codec::{BlockHash, HASH_SIZE};

/// Prefix of every block index key.
pub const BLOCK_INDEX_PREFIX: &[u8] = b"blockidx/";

/// Key of the tail cursor.
pub const WRITE_CURSOR_KEY: &[u8] = b"meta/write-cursor";

/// Key of the format version.
pub const VERSION_KEY: &[u8] = b"meta/version";

/// Format version written when a store is created.
pub const METADATA_VERSION: u32 = 1;

/// Returns the index key for `hash`.
#[must_use]
pub fn block_index_key(hash: &BlockHash) -> Vec<u8> {
    let mut key = Vec::with_capacity(BLOCK_INDEX_PREFIX.len() + HASH_SIZE);
    key.extend_from_slice(BLOCK_INDEX_PREFIX);
    key.extend_from_slice(hash.as_bytes());
    key
}

/// Adds an index entry to `batch`.
pub fn put_block_location(batch: &mut WriteBatch, hash: &BlockHash, location: Location) {
    batch.put(block_index_key(hash), location.to_bytes());
}

/// Adds the tail cursor to `batch`.
pub fn put_tail_cursor(batch: &mut WriteBatch, tail: TailCursor) {
    batch.put(WRITE_CURSOR_KEY, tail.to_bytes());
}

/// Adds the format version to `batch`.
pub fn put_version(batch: &mut WriteBatch) {
    batch.put(VERSION_KEY, METADATA_VERSION.to_le_bytes());
}

/// Looks up where `hash` is stored.
///
/// # Errors
///
/// Returns [`CoreError::InvalidFormat`] if the stored value is malformed.
pub fn block_location(store: &MetadataStore, hash: &BlockHash) -> CoreResult<Option<Location>> {
    store
        .get(&block_index_key(hash))
        .map(Location::from_bytes)
        .transpose()
}

/// Reads the tail cursor, if one has been committed.
///
/// # Errors
///
/// Returns [`CoreError::InvalidFormat`] if the stored value is malformed.
pub fn tail_cursor(store: &MetadataStore) -> CoreResult<Option<TailCursor>> {
    store
        .get(WRITE_CURSOR_KEY)
        .map(TailCursor::from_bytes)
        .transpose()
}

/// Reads the format version, if one has been committed.
///
/// # Errors
///
/// Returns [`CoreError::InvalidFormat`] if the stored value is not 4 bytes.
pub fn version(store: &MetadataStore) -> CoreResult<Option<u32>> {
    store
        .get(VERSION_KEY)
        .map(|value| {
            let bytes: [u8; 4] = value
                .try_into()
                .map_err(|_| CoreError::invalid_format("version must be 4 bytes"))?;
            Ok(u32::from_le_bytes(bytes))
        })
        .transpose()
}

/// Returns every indexed block in key order.
///
/// # Errors
///
/// Returns [`CoreError::InvalidFormat`] if a key or value is malformed.
pub fn indexed_blocks(store: &MetadataStore) -> CoreResult<Vec<(BlockHash, Location)>> {
    store
        .scan_prefix(BLOCK_INDEX_PREFIX)
        .map(|(key, value)| {
            let hash: [u8; HASH_SIZE] = key[BLOCK_INDEX_PREFIX.len()..]
                .try_into()
                .map_err(|_| CoreError::invalid_format("block index key has a bad hash length"))?;
            Ok((BlockHash::from_bytes(hash), Location::from_bytes(value)?))
        })
        .collect()
}
