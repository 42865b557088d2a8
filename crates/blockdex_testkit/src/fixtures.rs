//! Test fixtures and block store helpers.
//!
//! Provides sample blocks and temporary block directories laid out the way
//! a node lays them out.

use crate::writer::SegmentWriter;
use blockdex_codec::{Block, BlockHash, BlockHeader, Transaction};
use blockdex_core::{
    segment_file_path, BlockDir, CoreResult, MetadataStore, Network, RecoveryConfig,
    RecoveryDriver,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Builds a block with a unique header per `nonce` and one transaction
/// carrying `body` bytes.
pub fn sample_block(nonce: u32, body: usize) -> Block {
    Block {
        header: BlockHeader {
            version: 1,
            prev_block: BlockHash::from_bytes([0x11; 32]),
            merkle_root: [0x22; 32],
            timestamp: 1_600_000_000u32.wrapping_add(nonce),
            bits: 0x1d00_ffff,
            nonce,
        },
        transactions: vec![Transaction {
            version: 1,
            payload: vec![0x5A; body],
            lock_time: 0,
        }],
    }
}

/// Builds a chain of `count` blocks, each pointing at the previous one.
pub fn sample_chain(count: u32, body: usize) -> Vec<Block> {
    let mut prev = BlockHash::from_bytes([0; 32]);
    (0..count)
        .map(|nonce| {
            let mut block = sample_block(nonce, body);
            block.header.prev_block = prev;
            prev = block.hash();
            block
        })
        .collect()
}

/// Writes raw bytes as segment `index`, for corruption scenarios.
pub fn write_raw_segment(dir: &Path, index: u32, bytes: &[u8]) {
    fs::create_dir_all(dir).expect("Failed to create block directory");
    fs::write(segment_file_path(dir, index), bytes).expect("Failed to write segment");
}

/// A block directory inside a temporary data directory, with a writer.
pub struct TestBlockStore {
    /// The writer appending to the block directory.
    pub writer: SegmentWriter,
    /// Network the segments are written for.
    pub network: Network,
    /// Block directory layout.
    pub dir: BlockDir,
    /// The temporary data directory (kept alive to prevent cleanup).
    temp_dir: TempDir,
}

impl TestBlockStore {
    /// Creates an empty block store.
    pub fn new(network: Network, max_segment_size: u64) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = BlockDir::for_network(temp_dir.path(), network);
        let writer = SegmentWriter::create(dir.path(), network, max_segment_size)
            .expect("Failed to create segment writer");
        Self {
            writer,
            network,
            dir,
            temp_dir,
        }
    }

    /// Returns the data directory (the parent of the network directory).
    pub fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Appends every block in `blocks` and syncs.
    pub fn append_all(&mut self, blocks: &[Block]) {
        for block in blocks {
            self.writer.append(block).expect("Failed to append block");
        }
        self.writer.sync().expect("Failed to sync segment");
    }

    /// Runs recovery with the default configuration for this store's network.
    pub fn recover(&self) -> CoreResult<u64> {
        RecoveryDriver::new(RecoveryConfig::default().network(self.network))
            .recover(self.dir.path())
    }

    /// Opens the recovered metadata store for reading.
    pub fn open_metadata(&self) -> CoreResult<MetadataStore> {
        MetadataStore::open_read_only(self.dir.metadata_path())
    }
}
