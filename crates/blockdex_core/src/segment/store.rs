//! Segment lookup and raw reads.

use crate::dir::segment_file_path;
use crate::error::CoreResult;
use blockdex_storage::{FileBackend, InMemoryBackend, StorageBackend};
use parking_lot::Mutex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Read access to a numbered sequence of segments.
///
/// `locate` is the segment locator: it answers whether a segment exists and
/// how long it is, and is the scan's only end-of-data signal.
pub trait SegmentStore {
    /// Returns the byte length of segment `index`, or `None` if it was never created.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment's metadata cannot be read for a
    /// reason other than absence.
    fn locate(&self, index: u32) -> CoreResult<Option<u64>>;

    /// Reads `len` bytes of segment `index` starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`blockdex_storage::StorageError::ReadPastEnd`] (wrapped in
    /// [`crate::CoreError::Storage`]) if the range leaves the segment.
    fn read_at(&self, index: u32, offset: u64, len: usize) -> CoreResult<Vec<u8>>;
}

/// Segments stored as `seg-NNNNNNNNN.dat` files in one directory.
///
/// Segments are read strictly in order, so only the most recently used
/// file is kept open.
#[derive(Debug)]
pub struct FileSegmentStore {
    dir: PathBuf,
    open: Mutex<Option<(u32, FileBackend)>>,
}

impl FileSegmentStore {
    /// Creates a store over the segment files in `dir`.
    #[must_use]
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            open: Mutex::new(None),
        }
    }

    /// Returns the directory holding the segments.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SegmentStore for FileSegmentStore {
    fn locate(&self, index: u32) -> CoreResult<Option<u64>> {
        match fs::metadata(segment_file_path(&self.dir, index)) {
            Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn read_at(&self, index: u32, offset: u64, len: usize) -> CoreResult<Vec<u8>> {
        let mut open = self.open.lock();
        if let Some((current, backend)) = open.as_ref() {
            if *current == index {
                return Ok(backend.read_at(offset, len)?);
            }
        }

        let backend = FileBackend::open_read_only(&segment_file_path(&self.dir, index))?;
        let data = backend.read_at(offset, len)?;
        *open = Some((index, backend));
        Ok(data)
    }
}

/// Segments held in memory, for tests and tooling.
#[derive(Debug, Default)]
pub struct MemorySegmentStore {
    segments: Vec<InMemoryBackend>,
}

impl MemorySegmentStore {
    /// Creates a store with no segments.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose segment `i` holds `segments[i]`.
    #[must_use]
    pub fn from_segments(segments: Vec<Vec<u8>>) -> Self {
        Self {
            segments: segments.into_iter().map(InMemoryBackend::with_data).collect(),
        }
    }
}

impl SegmentStore for MemorySegmentStore {
    fn locate(&self, index: u32) -> CoreResult<Option<u64>> {
        match self.segments.get(index as usize) {
            Some(backend) => Ok(Some(backend.size()?)),
            None => Ok(None),
        }
    }

    fn read_at(&self, index: u32, offset: u64, len: usize) -> CoreResult<Vec<u8>> {
        let backend = self.segments.get(index as usize).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("segment {index} not found"))
        })?;
        Ok(backend.read_at(offset, len)?)
    }
}
