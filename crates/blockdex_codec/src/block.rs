//! Structured block payloads stored in segment files.

use crate::error::{CodecError, CodecResult};
use crate::hash::BlockHash;
use crate::{Decode, Encode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Fixed-size block header. The block identity is derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Block format version.
    pub version: u32,
    /// Hash of the preceding block.
    pub prev_block: BlockHash,
    /// Commitment to the transactions in the block.
    pub merkle_root: [u8; 32],
    /// Creation time, seconds since the Unix epoch.
    pub timestamp: u32,
    /// Compact difficulty target.
    pub bits: u32,
    /// Nonce.
    pub nonce: u32,
}

/// A transaction carried by a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction format version.
    pub version: u32,
    /// Opaque transaction body.
    pub payload: Vec<u8>,
    /// Lock time.
    pub lock_time: u32,
}

/// A block: header plus transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// The block header.
    pub header: BlockHeader,
    /// Transactions in block order.
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Returns the identity of this block.
    ///
    /// Only the header contributes, so two blocks with equal headers share an identity.
    #[must_use]
    pub fn hash(&self) -> BlockHash {
        self.header.hash()
    }
}

/// Size of the fixed-width header serialization that is hashed.
pub const HEADER_SIZE: usize = 80;

impl BlockHeader {
    /// Serializes the header as fixed-width little-endian fields.
    ///
    /// ```text
    /// | version (4) | prev_block (32) | merkle_root (32) | timestamp (4) | bits (4) | nonce (4) |
    /// ```
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.version.to_le_bytes());
        buf[4..36].copy_from_slice(self.prev_block.as_bytes());
        buf[36..68].copy_from_slice(&self.merkle_root);
        buf[68..72].copy_from_slice(&self.timestamp.to_le_bytes());
        buf[72..76].copy_from_slice(&self.bits.to_le_bytes());
        buf[76..80].copy_from_slice(&self.nonce.to_le_bytes());
        buf
    }

    /// Returns the double SHA-256 of [`to_bytes`](Self::to_bytes).
    #[must_use]
    pub fn hash(&self) -> BlockHash {
        BlockHash::digest(&self.to_bytes())
    }
}

impl Encode for Block {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        to_cbor(self)
    }
}

impl Decode for Block {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        from_cbor(bytes)
    }
}

impl Encode for BlockHeader {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        to_cbor(self)
    }
}

impl Decode for BlockHeader {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        from_cbor(bytes)
    }
}

/// Encodes a block to CBOR bytes.
///
/// # Errors
///
/// Returns [`CodecError::EncodingFailed`] if serialization fails.
pub fn encode_block(block: &Block) -> CodecResult<Vec<u8>> {
    block.encode()
}

/// Decodes a block from CBOR bytes.
///
/// The input must contain exactly one block; leftover bytes are an error
/// because a segment record's payload length must match its contents.
///
/// # Errors
///
/// Returns [`CodecError::DecodingFailed`] for malformed input and
/// [`CodecError::TrailingBytes`] if the block does not span all of `bytes`.
pub fn decode_block(bytes: &[u8]) -> CodecResult<Block> {
    Block::decode(bytes)
}

fn to_cbor<T: Serialize>(value: &T) -> CodecResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(value, &mut buf)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    Ok(buf)
}

fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    let mut reader = bytes;
    let value = ciborium::de::from_reader(&mut reader)
        .map_err(|e| CodecError::decoding_failed(e.to_string()))?;
    if !reader.is_empty() {
        return Err(CodecError::TrailingBytes {
            remaining: reader.len(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_block(nonce: u32) -> Block {
        Block {
            header: BlockHeader {
                version: 1,
                prev_block: BlockHash::from_bytes([7; 32]),
                merkle_root: [9; 32],
                timestamp: 1_231_006_505,
                bits: 0x1d00_ffff,
                nonce,
            },
            transactions: vec![Transaction {
                version: 1,
                payload: vec![0xde, 0xad, 0xbe, 0xef],
                lock_time: 0,
            }],
        }
    }

    #[test]
    fn block_roundtrip() {
        let block = sample_block(42);
        let bytes = encode_block(&block).unwrap();
        assert_eq!(decode_block(&bytes).unwrap(), block);
    }

    #[test]
    fn header_bytes_layout() {
        let header = BlockHeader {
            version: 2,
            prev_block: BlockHash::from_bytes([0xAA; 32]),
            merkle_root: [0xBB; 32],
            timestamp: 0x0102_0304,
            bits: 0x1d00_ffff,
            nonce: 7,
        };
        let bytes = header.to_bytes();

        assert_eq!(&bytes[0..4], &[2, 0, 0, 0]);
        assert_eq!(&bytes[4..36], &[0xAA; 32]);
        assert_eq!(&bytes[36..68], &[0xBB; 32]);
        assert_eq!(&bytes[68..72], &[4, 3, 2, 1]);
        assert_eq!(&bytes[72..76], &[0xff, 0xff, 0x00, 0x1d]);
        assert_eq!(&bytes[76..80], &[7, 0, 0, 0]);
        assert_eq!(header.hash(), BlockHash::digest(&bytes));
    }

    #[test]
    fn distinct_headers_have_distinct_hashes() {
        let a = sample_block(1).header;
        let mut b = a.clone();
        b.timestamp ^= 1;
        let mut c = a.clone();
        c.merkle_root[31] ^= 1;

        assert_ne!(a.hash(), b.hash());
        assert_ne!(a.hash(), c.hash());
        assert_ne!(b.hash(), c.hash());
    }

    #[test]
    fn hash_depends_on_header_only() {
        let a = sample_block(1);
        let mut b = a.clone();
        b.transactions.clear();
        assert_eq!(a.hash(), b.hash());

        let c = sample_block(2);
        assert_ne!(a.hash(), c.hash());
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = encode_block(&sample_block(3)).unwrap();
        bytes.push(0x00);
        assert_eq!(
            decode_block(&bytes),
            Err(CodecError::TrailingBytes { remaining: 1 })
        );
    }

    #[test]
    fn garbage_rejected() {
        assert!(matches!(
            decode_block(&[0xff, 0x00, 0x13]),
            Err(CodecError::DecodingFailed { .. })
        ));
        assert!(decode_block(&[]).is_err());
    }

    #[test]
    fn truncated_block_rejected() {
        let bytes = encode_block(&sample_block(4)).unwrap();
        assert!(decode_block(&bytes[..bytes.len() - 1]).is_err());
    }

    proptest! {
        #[test]
        fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
            let _ = decode_block(&bytes);
        }
    }
}
