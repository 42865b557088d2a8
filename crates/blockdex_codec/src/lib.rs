//! # blockdex codec
//!
//! Encoding of the block payloads stored in segment files, and the content
//! hash that identifies each block.
//!
//! Payloads are CBOR documents produced by `ciborium` from the serde
//! definitions in [`Block`]. A block's identity is the double SHA-256 of its
//! fixed-width 80-byte [`BlockHeader`] serialization.
//!
//! ## Usage
//!
//! ```
//! use blockdex_codec::{decode_block, encode_block, Block, BlockHash, BlockHeader};
//!
//! let block = Block {
//!     header: BlockHeader {
//!         version: 1,
//!         prev_block: BlockHash::from_bytes([0; 32]),
//!         merkle_root: [0; 32],
//!         timestamp: 0,
//!         bits: 0,
//!         nonce: 7,
//!     },
//!     transactions: Vec::new(),
//! };
//! let bytes = encode_block(&block).unwrap();
//! let decoded = decode_block(&bytes).unwrap();
//! assert_eq!(decoded.hash(), block.hash());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod block;
mod error;
mod hash;

pub use block::{decode_block, encode_block, Block, BlockHeader, Transaction, HEADER_SIZE};
pub use error::{CodecError, CodecResult};
pub use hash::{BlockHash, HASH_SIZE};

/// Types that can be encoded to CBOR bytes.
pub trait Encode {
    /// Encode this value.
    fn encode(&self) -> CodecResult<Vec<u8>>;
}

/// Types that can be decoded from CBOR bytes.
pub trait Decode: Sized {
    /// Decode a value that spans all of `bytes`.
    fn decode(bytes: &[u8]) -> CodecResult<Self>;
}
