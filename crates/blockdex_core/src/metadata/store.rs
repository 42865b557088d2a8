//! The metadata store: a small ordered key-value map persisted as a snapshot.

use crate::config::MetadataConfig;
use crate::dir::sync_directory;
use crate::error::{CoreError, CoreResult};
use crate::metadata::batch::WriteBatch;
use crate::metadata::snapshot;
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Lock file name.
const LOCK_FILE: &str = "LOCK";
/// Committed snapshot.
const CURRENT_FILE: &str = "CURRENT";
/// Snapshot being written.
const CURRENT_TEMP: &str = "CURRENT.tmp";

/// Ordered key-value store with all-or-nothing batch commits.
///
/// The whole key space lives in memory. Each commit writes a checksummed
/// snapshot to `CURRENT.tmp`, syncs it, renames it over `CURRENT` and syncs
/// the directory, so a reopened store sees either all of a batch or none of
/// it. A writable handle holds `LOCK` exclusively for its lifetime;
/// read-only handles share it.
#[derive(Debug)]
pub struct MetadataStore {
    path: PathBuf,
    config: MetadataConfig,
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    read_only: bool,
    /// Held for its lock; released on drop.
    _lock_file: File,
}

impl MetadataStore {
    /// Opens or creates the store at `path`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::AlreadyExists`] if `error_if_exists` is set and the directory exists
    /// - [`CoreError::InvalidFormat`] if the directory is missing and may not be created,
    ///   or the snapshot is malformed
    /// - [`CoreError::ChecksumMismatch`] if the snapshot is corrupt
    /// - [`CoreError::DatabaseLocked`] if another handle holds the lock
    pub fn open(path: impl AsRef<Path>, config: &MetadataConfig) -> CoreResult<Self> {
        let path = path.as_ref();

        if path.exists() {
            if config.error_if_exists {
                return Err(CoreError::AlreadyExists {
                    path: path.to_path_buf(),
                });
            }
        } else if config.create_if_missing {
            fs::create_dir_all(path)?;
        } else {
            return Err(CoreError::invalid_format(format!(
                "metadata store does not exist: {}",
                path.display()
            )));
        }

        if !path.is_dir() {
            return Err(CoreError::invalid_format(format!(
                "path is not a directory: {}",
                path.display()
            )));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;
        if lock_file.try_lock_exclusive().is_err() {
            return Err(CoreError::DatabaseLocked);
        }

        // A leftover temp file is an interrupted commit that never became visible.
        match fs::remove_file(path.join(CURRENT_TEMP)) {
            Ok(()) => debug!(path = %path.display(), "discarded interrupted commit"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let mut store = Self {
            path: path.to_path_buf(),
            config: config.clone(),
            entries: BTreeMap::new(),
            read_only: false,
            _lock_file: lock_file,
        };

        let current = path.join(CURRENT_FILE);
        if current.exists() {
            store.entries = snapshot::decode(&fs::read(&current)?)?;
            debug!(path = %path.display(), entries = store.entries.len(), "metadata store loaded");
        } else {
            store.write_snapshot(&store.entries)?;
            debug!(path = %path.display(), "metadata store created");
        }

        Ok(store)
    }

    /// Opens an existing store for reading only.
    ///
    /// Nothing on disk is changed: a leftover `CURRENT.tmp` is left in place
    /// and a store with no committed snapshot is rejected rather than
    /// initialised. [`commit`](Self::commit) always fails on the handle.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidFormat`] if the directory, its `LOCK` or its
    ///   `CURRENT` snapshot is missing, or the snapshot is malformed
    /// - [`CoreError::ChecksumMismatch`] if the snapshot is corrupt
    /// - [`CoreError::DatabaseLocked`] if a writable handle holds the lock
    pub fn open_read_only(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let current = path.join(CURRENT_FILE);
        if !current.is_file() {
            return Err(CoreError::invalid_format(format!(
                "no committed metadata snapshot in {}",
                path.display()
            )));
        }

        let lock_file = match File::open(path.join(LOCK_FILE)) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CoreError::invalid_format(format!(
                    "metadata store has no lock file: {}",
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        if lock_file.try_lock_shared().is_err() {
            return Err(CoreError::DatabaseLocked);
        }

        let entries = snapshot::decode(&fs::read(&current)?)?;
        debug!(path = %path.display(), entries = entries.len(), "metadata store opened read-only");

        Ok(Self {
            path: path.to_path_buf(),
            config: MetadataConfig::default().create_if_missing(false),
            entries,
            read_only: true,
            _lock_file: lock_file,
        })
    }

    /// Returns whether the handle refuses commits.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Returns the store directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Iterates over every entry whose key starts with `prefix`, in key order.
    pub fn scan_prefix<'a>(
        &'a self,
        prefix: &'a [u8],
    ) -> impl Iterator<Item = (&'a [u8], &'a [u8])> + 'a {
        self.entries
            .range(prefix.to_vec()..)
            .take_while(move |(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.as_slice(), value.as_slice()))
    }

    /// Number of keys in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Starts a new batch.
    #[must_use]
    pub fn batch(&self) -> WriteBatch {
        WriteBatch::new()
    }

    /// Applies `batch` atomically.
    ///
    /// On failure the in-memory view and the on-disk snapshot are both left
    /// as they were before the call.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Commit`] if the handle is read-only or the
    /// snapshot cannot be encoded or persisted.
    pub fn commit(&mut self, batch: WriteBatch) -> CoreResult<()> {
        if self.read_only {
            return Err(CoreError::commit(format!(
                "{}: metadata store opened read-only",
                self.path.display()
            )));
        }
        let puts = batch.len();
        let mut next = self.entries.clone();
        next.extend(batch.into_puts());

        self.write_snapshot(&next)?;
        self.entries = next;
        debug!(puts, entries = self.entries.len(), "metadata batch committed");
        Ok(())
    }

    fn write_snapshot(&self, entries: &BTreeMap<Vec<u8>, Vec<u8>>) -> CoreResult<()> {
        let data = snapshot::encode(entries).map_err(|e| CoreError::commit(e.to_string()))?;
        let temp_path = self.path.join(CURRENT_TEMP);

        let result = self.replace_current(&temp_path, &data);
        if let Err(e) = &result {
            if let Err(cleanup) = fs::remove_file(&temp_path) {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    warn!(path = %temp_path.display(), error = %cleanup, "failed to remove temp snapshot");
                }
            }
            return Err(CoreError::commit(format!(
                "{}: {e}",
                self.path.display()
            )));
        }
        Ok(())
    }

    fn replace_current(&self, temp_path: &Path, data: &[u8]) -> io::Result<()> {
        let mut file = File::create(temp_path)?;
        file.write_all(data)?;
        if self.config.sync_on_commit {
            file.sync_all()?;
        }
        drop(file);

        fs::rename(temp_path, self.path.join(CURRENT_FILE))?;

        if self.config.sync_on_commit {
            sync_directory(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open(path: &Path) -> MetadataStore {
        MetadataStore::open(path, &MetadataConfig::default()).unwrap()
    }

    #[test]
    fn create_and_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("meta");

        {
            let mut store = open(&path);
            assert!(store.is_empty());
            let mut batch = store.batch();
            batch.put(b"k1".to_vec(), b"v1".to_vec());
            batch.put(b"k2".to_vec(), b"v2".to_vec());
            store.commit(batch).unwrap();
            assert_eq!(store.get(b"k1"), Some(&b"v1"[..]));
        }

        let store = open(&path);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(b"k2"), Some(&b"v2"[..]));
    }

    #[test]
    fn uncommitted_batch_is_invisible() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("meta");

        {
            let store = open(&path);
            let mut batch = store.batch();
            batch.put(b"lost".to_vec(), b"x".to_vec());
            assert_eq!(store.get(b"lost"), None);
        }

        assert!(open(&path).is_empty());
    }

    #[test]
    fn later_puts_win() {
        let dir = tempdir().unwrap();
        let mut store = open(dir.path());

        let mut batch = store.batch();
        batch.put(b"a".to_vec(), b"1".to_vec());
        batch.put(b"a".to_vec(), b"2".to_vec());
        batch.put(b"b".to_vec(), b"3".to_vec());
        store.commit(batch).unwrap();

        assert_eq!(store.get(b"a"), Some(&b"2"[..]));
        assert_eq!(store.get(b"b"), Some(&b"3"[..]));
    }

    #[test]
    fn scan_prefix_is_bounded() {
        let dir = tempdir().unwrap();
        let mut store = open(dir.path());

        let mut batch = store.batch();
        batch.put(b"idx/b".to_vec(), vec![2]);
        batch.put(b"idx/a".to_vec(), vec![1]);
        batch.put(b"idy".to_vec(), vec![3]);
        batch.put(b"id".to_vec(), vec![4]);
        store.commit(batch).unwrap();

        let keys: Vec<_> = store.scan_prefix(b"idx/").map(|(k, _)| k.to_vec()).collect();
        assert_eq!(keys, vec![b"idx/a".to_vec(), b"idx/b".to_vec()]);
    }

    #[test]
    fn error_if_exists() {
        let dir = tempdir().unwrap();
        let config = MetadataConfig::default().error_if_exists(true);
        let err = MetadataStore::open(dir.path(), &config).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyExists { .. }));
    }

    #[test]
    fn missing_without_create_is_rejected() {
        let dir = tempdir().unwrap();
        let config = MetadataConfig::default().create_if_missing(false);
        let err = MetadataStore::open(dir.path().join("absent"), &config).unwrap_err();
        assert!(matches!(err, CoreError::InvalidFormat { .. }));
    }

    #[test]
    fn second_open_is_locked() {
        let dir = tempdir().unwrap();
        let _first = open(dir.path());
        let err = MetadataStore::open(dir.path(), &MetadataConfig::default()).unwrap_err();
        assert!(matches!(err, CoreError::DatabaseLocked));
    }

    #[test]
    fn corrupt_snapshot_is_rejected() {
        let dir = tempdir().unwrap();
        {
            let mut store = open(dir.path());
            let mut batch = store.batch();
            batch.put(b"key".to_vec(), b"value".to_vec());
            store.commit(batch).unwrap();
        }

        let current = dir.path().join(CURRENT_FILE);
        let mut data = fs::read(&current).unwrap();
        data[11] ^= 0xFF;
        fs::write(&current, data).unwrap();

        let err = MetadataStore::open(dir.path(), &MetadataConfig::default()).unwrap_err();
        assert!(matches!(err, CoreError::ChecksumMismatch { .. }));
    }

    #[test]
    fn interrupted_commit_is_discarded() {
        let dir = tempdir().unwrap();
        drop(open(dir.path()));
        fs::write(dir.path().join(CURRENT_TEMP), b"garbage").unwrap();

        let store = open(dir.path());
        assert!(store.is_empty());
        assert!(!dir.path().join(CURRENT_TEMP).exists());
    }

    #[test]
    fn failed_commit_leaves_state_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("meta");
        let mut store = open(&path);

        let mut batch = store.batch();
        batch.put(b"kept".to_vec(), b"1".to_vec());
        store.commit(batch).unwrap();

        fs::remove_dir_all(&path).unwrap();

        let mut batch = store.batch();
        batch.put(b"lost".to_vec(), b"2".to_vec());
        let err = store.commit(batch).unwrap_err();
        assert!(matches!(err, CoreError::Commit { .. }));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(b"lost"), None);
    }

    #[test]
    fn read_only_open_leaves_disk_untouched() {
        let dir = tempdir().unwrap();
        {
            let mut store = open(dir.path());
            let mut batch = store.batch();
            batch.put(b"key".to_vec(), b"value".to_vec());
            store.commit(batch).unwrap();
        }
        let temp = dir.path().join(CURRENT_TEMP);
        fs::write(&temp, b"interrupted").unwrap();
        let before = fs::read(dir.path().join(CURRENT_FILE)).unwrap();

        let mut store = MetadataStore::open_read_only(dir.path()).unwrap();
        assert!(store.is_read_only());
        assert_eq!(store.get(b"key"), Some(&b"value"[..]));

        let mut batch = store.batch();
        batch.put(b"other".to_vec(), b"x".to_vec());
        assert!(matches!(store.commit(batch), Err(CoreError::Commit { .. })));
        assert_eq!(store.get(b"other"), None);

        assert_eq!(fs::read(&temp).unwrap(), b"interrupted");
        assert_eq!(fs::read(dir.path().join(CURRENT_FILE)).unwrap(), before);
    }

    #[test]
    fn read_only_open_requires_snapshot() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(LOCK_FILE), b"").unwrap();

        let err = MetadataStore::open_read_only(dir.path()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidFormat { .. }));
        assert!(!dir.path().join(CURRENT_FILE).exists());
    }

    #[test]
    fn read_only_handles_share_the_lock() {
        let dir = tempdir().unwrap();
        drop(open(dir.path()));

        let first = MetadataStore::open_read_only(dir.path()).unwrap();
        let second = MetadataStore::open_read_only(dir.path()).unwrap();
        assert_eq!(first.len(), second.len());
        assert!(matches!(
            MetadataStore::open(dir.path(), &MetadataConfig::default()),
            Err(CoreError::DatabaseLocked)
        ));
    }
}
