//! Incremental segment writer.
//!
//! Appends framed blocks to `seg-NNNNNNNNN.dat` files the same way a node
//! stores them, rolling to a new segment when a record would push the
//! current one past its size limit. Every append is remembered, so the
//! writer doubles as the expected result of a recovery.

use blockdex_codec::{encode_block, Block};
use blockdex_core::segment::encode_frame;
use blockdex_core::{segment_file_path, CoreResult, IndexEntry, Location, Network, TailCursor};
use blockdex_storage::{FileBackend, StorageBackend};
use std::fs;
use std::path::{Path, PathBuf};

/// Writes blocks into a directory of segment files.
#[derive(Debug)]
pub struct SegmentWriter {
    dir: PathBuf,
    network: Network,
    max_segment_size: u64,
    current: Option<FileBackend>,
    segment: u32,
    offset: u64,
    index: Vec<IndexEntry>,
}

impl SegmentWriter {
    /// Creates a writer for an empty block directory, creating it if needed.
    ///
    /// No segment file exists until the first append.
    pub fn create(dir: &Path, network: Network, max_segment_size: u64) -> CoreResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            network,
            max_segment_size,
            current: None,
            segment: 0,
            offset: 0,
            index: Vec::new(),
        })
    }

    /// Appends `block` and returns where it was written.
    ///
    /// A record larger than `max_segment_size` still gets a segment of its own.
    pub fn append(&mut self, block: &Block) -> CoreResult<Location> {
        let frame = encode_frame(self.network.magic(), &encode_block(block)?)?;
        let span = frame.len() as u64;

        if self.offset > 0 && self.offset + span > self.max_segment_size {
            self.roll()?;
        }

        let segment = self.segment;
        let mut backend = match self.current.take() {
            Some(backend) => backend,
            None => FileBackend::open(&segment_file_path(&self.dir, segment))?,
        };
        let offset = backend.append(&frame)?;
        self.current = Some(backend);

        let location = Location::new(segment, offset as u32, span as u32);
        self.offset = offset + span;
        self.index.push(IndexEntry {
            hash: block.hash(),
            location,
        });
        Ok(location)
    }

    /// Syncs the open segment to disk.
    pub fn sync(&mut self) -> CoreResult<()> {
        if let Some(backend) = &mut self.current {
            backend.sync()?;
        }
        Ok(())
    }

    /// Every block appended so far, in append order.
    #[must_use]
    pub fn index(&self) -> &[IndexEntry] {
        &self.index
    }

    /// The end of the last record, or `0:0` before the first append.
    #[must_use]
    pub fn tail(&self) -> TailCursor {
        self.index
            .last()
            .map_or_else(TailCursor::default, |entry| entry.location.end())
    }

    /// Number of segment files created.
    #[must_use]
    pub fn segment_count(&self) -> u32 {
        if self.current.is_some() {
            self.segment + 1
        } else {
            0
        }
    }

    /// Returns the block directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn roll(&mut self) -> CoreResult<()> {
        self.sync()?;
        self.current = None;
        self.segment += 1;
        self.offset = 0;
        let path = segment_file_path(&self.dir, self.segment);
        self.current = Some(FileBackend::open(&path)?);
        Ok(())
    }
}
