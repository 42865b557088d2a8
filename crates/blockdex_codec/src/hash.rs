//! Block identity hashes.

use crate::error::{CodecError, CodecResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Size of a block hash in bytes.
pub const HASH_SIZE: usize = 32;

/// Content hash identifying a block.
///
/// Computed as SHA-256 applied twice over the canonical header encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockHash([u8; HASH_SIZE]);

impl BlockHash {
    /// Wraps raw hash bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the raw hash bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Hashes `data` with double SHA-256.
    #[must_use]
    pub fn digest(data: &[u8]) -> Self {
        let first = Sha256::digest(data);
        let second = Sha256::digest(first);
        Self(second.into())
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for BlockHash {
    type Err = CodecError;

    fn from_str(s: &str) -> CodecResult<Self> {
        if s.len() != HASH_SIZE * 2 {
            return Err(CodecError::invalid_hash(format!(
                "expected {} hex characters, got {}",
                HASH_SIZE * 2,
                s.len()
            )));
        }

        let mut bytes = [0u8; HASH_SIZE];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let pair = s
                .get(i * 2..i * 2 + 2)
                .ok_or_else(|| CodecError::invalid_hash("non-ASCII input"))?;
            *byte = u8::from_str_radix(pair, 16)
                .map_err(|_| CodecError::invalid_hash(format!("invalid hex digit pair {pair:?}")))?;
        }
        Ok(Self(bytes))
    }
}
