//! Property-based test generators using proptest.
//!
//! Provides strategies for generating blocks whose identities are distinct,
//! so any generated sequence is a valid block store.

use blockdex_codec::{Block, BlockHash, BlockHeader, Transaction};
use proptest::prelude::*;

/// Strategy for generating block hashes.
pub fn block_hash_strategy() -> impl Strategy<Value = BlockHash> {
    prop::array::uniform32(any::<u8>()).prop_map(BlockHash::from_bytes)
}

/// Strategy for generating transactions with payloads up to `max_payload` bytes.
pub fn transaction_strategy(max_payload: usize) -> impl Strategy<Value = Transaction> {
    (
        any::<u32>(),
        prop::collection::vec(any::<u8>(), 0..=max_payload),
        any::<u32>(),
    )
        .prop_map(|(version, payload, lock_time)| Transaction {
            version,
            payload,
            lock_time,
        })
}

/// Strategy for generating a block with the given `nonce`.
///
/// Distinct nonces give distinct headers, hence distinct hashes.
pub fn block_strategy(nonce: u32) -> impl Strategy<Value = Block> {
    (
        block_hash_strategy(),
        prop::array::uniform32(any::<u8>()),
        any::<u32>(),
        prop::collection::vec(transaction_strategy(256), 0..4),
    )
        .prop_map(move |(prev_block, merkle_root, timestamp, transactions)| Block {
            header: BlockHeader {
                version: 1,
                prev_block,
                merkle_root,
                timestamp,
                bits: 0x1d00_ffff,
                nonce,
            },
            transactions,
        })
}

/// Strategy for generating up to `max_blocks` blocks with unique identities.
pub fn block_sequence_strategy(max_blocks: u32) -> impl Strategy<Value = Vec<Block>> {
    (0..=max_blocks).prop_flat_map(|count| {
        (0..count)
            .map(block_strategy)
            .collect::<Vec<_>>()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    proptest! {
        #[test]
        fn sequences_have_unique_hashes(blocks in block_sequence_strategy(16)) {
            let hashes: HashSet<_> = blocks.iter().map(Block::hash).collect();
            prop_assert_eq!(hashes.len(), blocks.len());
        }
    }
}
