//! Block store directory layout.
//!
//! ```text
//! <data_dir>/
//! └─ <network>/            # "mainnet" or "testnet"
//!    └─ blocks/            # the block directory
//!       ├─ seg-000000000.dat
//!       ├─ seg-000000001.dat
//!       └─ metadata/       # metadata store (absent before recovery)
//!          ├─ LOCK
//!          └─ CURRENT
//! ```

use crate::types::Network;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

/// Name of the block directory under a network directory.
const BLOCKS_DIR: &str = "blocks";
/// Name of the metadata store directory inside the block directory.
const METADATA_DIR: &str = "metadata";

/// Paths of one block store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDir {
    path: PathBuf,
}

impl BlockDir {
    /// Wraps an existing or future block directory.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolves the block directory for `network` under a data directory.
    #[must_use]
    pub fn for_network(data_dir: &Path, network: Network) -> Self {
        Self::new(data_dir.join(network.dir_name()).join(BLOCKS_DIR))
    }

    /// Returns the block directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path of segment `index`, e.g. `seg-000000007.dat`.
    #[must_use]
    pub fn segment_path(&self, index: u32) -> PathBuf {
        segment_file_path(&self.path, index)
    }

    /// Returns the metadata store path.
    #[must_use]
    pub fn metadata_path(&self) -> PathBuf {
        self.path.join(METADATA_DIR)
    }

    /// Returns whether a metadata store is present.
    #[must_use]
    pub fn has_metadata(&self) -> bool {
        self.metadata_path().exists()
    }

    /// Deletes the metadata store, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be removed.
    pub fn remove_metadata(&self) -> io::Result<()> {
        match fs::remove_dir_all(self.metadata_path()) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// Returns the path of segment `index` inside `dir`.
#[must_use]
pub fn segment_file_path(dir: &Path, index: u32) -> PathBuf {
    dir.join(format!("seg-{index:09}.dat"))
}

/// Syncs a directory so that file creations and renames inside it are durable.
#[cfg(unix)]
pub(crate) fn sync_directory(path: &Path) -> io::Result<()> {
    File::open(path)?.sync_all()
}

#[cfg(not(unix))]
pub(crate) fn sync_directory(_path: &Path) -> io::Result<()> {
    // NTFS journals directory metadata; there is no directory fsync.
    Ok(())
}
