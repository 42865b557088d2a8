//! End-to-end index recovery.

use crate::config::RecoveryConfig;
use crate::dir::BlockDir;
use crate::error::{CoreError, CoreResult};
use crate::metadata::schema::put_version;
use crate::metadata::MetadataStore;
use crate::recovery::RecoveryTransaction;
use crate::scan::Replayer;
use crate::segment::{FileSegmentStore, SegmentStore};
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

/// Rebuilds a block directory's metadata store from its segments.
///
/// # Example
///
/// ```rust,ignore
/// use blockdex_core::{RecoveryConfig, RecoveryDriver};
///
/// let count = RecoveryDriver::new(RecoveryConfig::default()).recover(block_dir)?;
/// println!("There were {count} blocks read.");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecoveryDriver {
    config: RecoveryConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl RecoveryDriver {
    /// Creates a driver with the given configuration.
    #[must_use]
    pub fn new(config: RecoveryConfig) -> Self {
        Self {
            config,
            cancel: None,
        }
    }

    /// Aborts the scan with [`CoreError::Cancelled`] once `flag` is set.
    #[must_use]
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    /// Recovers the block directory at `block_dir` and returns the number of
    /// blocks indexed.
    ///
    /// The metadata store is created at `<block_dir>/metadata`. If this
    /// returns an error after the store was created, the store holds no
    /// index entries; removing it is left to the caller.
    ///
    /// # Errors
    ///
    /// - [`CoreError::AlreadyExists`] if a metadata store is already present
    /// - [`CoreError::Decode`] or [`CoreError::DuplicateIdentity`] for bad segment data
    /// - [`CoreError::Commit`] if the index could not be persisted
    /// - [`CoreError::Cancelled`] if cancellation was requested
    pub fn recover(&self, block_dir: &Path) -> CoreResult<u64> {
        let dir = BlockDir::new(block_dir);
        let segments = FileSegmentStore::new(dir.path());
        self.recover_with_store(&dir.metadata_path(), &segments)
    }

    /// Recovers from an arbitrary segment store into a new metadata store at
    /// `metadata_path`.
    ///
    /// # Errors
    ///
    /// Same as [`recover`](Self::recover).
    pub fn recover_with_store<S: SegmentStore + ?Sized>(
        &self,
        metadata_path: &Path,
        segments: &S,
    ) -> CoreResult<u64> {
        if metadata_path.exists() {
            return Err(CoreError::AlreadyExists {
                path: metadata_path.to_path_buf(),
            });
        }
        if let Some(parent) = metadata_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let metadata_config = self
            .config
            .metadata
            .clone()
            .create_if_missing(true)
            .error_if_exists(true);
        let mut store = MetadataStore::open(metadata_path, &metadata_config)?;

        let mut init = store.batch();
        put_version(&mut init);
        store.commit(init)?;

        info!(
            path = %metadata_path.display(),
            network = %self.config.network,
            "recovering block index"
        );

        let replayer = Replayer::new(segments, &self.config);
        let replay = match &self.cancel {
            Some(flag) => replayer.with_cancellation(flag).replay()?,
            None => replayer.replay()?,
        };

        let count = RecoveryTransaction::new(replay).commit(&mut store)?;
        info!(blocks = count, "block index recovered");
        Ok(count)
    }
}
