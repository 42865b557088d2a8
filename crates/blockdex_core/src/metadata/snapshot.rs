//! On-disk snapshot encoding for the metadata store.

use crate::error::{CoreError, CoreResult};
use std::collections::BTreeMap;

/// Magic bytes for snapshot files.
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"BDXM";

/// Current snapshot version.
pub const SNAPSHOT_VERSION: u16 = 1;

/// Fixed bytes before the first entry: magic (4) + version (2) + count (4).
const PREFIX_SIZE: usize = 10;

/// Encodes the full key space.
///
/// ```text
/// | magic (4) | version (2) | count (4) | (key_len (2) | key | value_len (4) | value)* | crc32 (4) |
/// ```
pub fn encode(entries: &BTreeMap<Vec<u8>, Vec<u8>>) -> CoreResult<Vec<u8>> {
    let count = u32::try_from(entries.len())
        .map_err(|_| CoreError::invalid_format("too many metadata entries"))?;

    let mut buf = Vec::new();
    buf.extend_from_slice(&SNAPSHOT_MAGIC);
    buf.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
    buf.extend_from_slice(&count.to_le_bytes());

    for (key, value) in entries {
        let key_len = u16::try_from(key.len())
            .map_err(|_| CoreError::invalid_format(format!("key of {} bytes", key.len())))?;
        let value_len = u32::try_from(value.len())
            .map_err(|_| CoreError::invalid_format(format!("value of {} bytes", value.len())))?;
        buf.extend_from_slice(&key_len.to_le_bytes());
        buf.extend_from_slice(key);
        buf.extend_from_slice(&value_len.to_le_bytes());
        buf.extend_from_slice(value);
    }

    let crc = crc32fast::hash(&buf);
    buf.extend_from_slice(&crc.to_le_bytes());
    Ok(buf)
}

/// Decodes a snapshot written by [`encode`].
pub fn decode(data: &[u8]) -> CoreResult<BTreeMap<Vec<u8>, Vec<u8>>> {
    if data.len() < PREFIX_SIZE + 4 {
        return Err(CoreError::invalid_format("metadata snapshot too short"));
    }

    let (body, crc_bytes) = data.split_at(data.len() - 4);
    let stored = u32::from_le_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
    let computed = crc32fast::hash(body);
    if stored != computed {
        return Err(CoreError::ChecksumMismatch {
            expected: stored,
            actual: computed,
        });
    }

    if body[0..4] != SNAPSHOT_MAGIC {
        return Err(CoreError::invalid_format("invalid metadata snapshot magic"));
    }
    let version = u16::from_le_bytes([body[4], body[5]]);
    if version > SNAPSHOT_VERSION {
        return Err(CoreError::invalid_format(format!(
            "unsupported metadata snapshot version: {version}"
        )));
    }
    let count = u32::from_le_bytes([body[6], body[7], body[8], body[9]]);

    let mut cursor = PREFIX_SIZE;
    let mut entries = BTreeMap::new();
    for _ in 0..count {
        let key_len = take(body, &mut cursor, 2)?;
        let key_len = u16::from_le_bytes([key_len[0], key_len[1]]) as usize;
        let key = take(body, &mut cursor, key_len)?.to_vec();
        let value_len = take(body, &mut cursor, 4)?;
        let value_len =
            u32::from_le_bytes([value_len[0], value_len[1], value_len[2], value_len[3]]) as usize;
        let value = take(body, &mut cursor, value_len)?.to_vec();
        entries.insert(key, value);
    }

    if cursor != body.len() {
        return Err(CoreError::invalid_format(
            "trailing bytes after metadata entries",
        ));
    }

    Ok(entries)
}

fn take<'a>(body: &'a [u8], cursor: &mut usize, len: usize) -> CoreResult<&'a [u8]> {
    let end = cursor
        .checked_add(len)
        .filter(|&end| end <= body.len())
        .ok_or_else(|| CoreError::invalid_format("metadata snapshot truncated"))?;
    let slice = &body[*cursor..end];
    *cursor = end;
    Ok(slice)
}
