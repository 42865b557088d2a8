//! File-based storage backend for segment files.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::{Mutex, RwLock};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A backend over a single file.
///
/// The size is captured when the file is opened and advanced by `append`.
/// Bytes written to the file by another handle after `open` are not seen.
///
/// # Example
///
/// ```no_run
/// use blockdex_storage::{StorageBackend, FileBackend};
/// use std::path::Path;
///
/// let backend = FileBackend::open_read_only(Path::new("seg-000000000.dat")).unwrap();
/// let header = backend.read_at(0, 8).unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    file: Mutex<File>,
    size: RwLock<u64>,
    writable: bool,
}

impl FileBackend {
    /// Opens or creates a file for reading and appending.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        Self::from_file(path, file, true)
    }

    /// Opens an existing file without write access.
    ///
    /// Recovery only ever reads segment files, so it opens them this way.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be opened.
    pub fn open_read_only(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new().read(true).open(path)?;
        Self::from_file(path, file, false)
    }

    fn from_file(path: &Path, file: File, writable: bool) -> StorageResult<Self> {
        let size = file.metadata()?.len();
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            size: RwLock::new(size),
            writable,
        })
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns whether `append` is permitted.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.writable
    }
}

impl StorageBackend for FileBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let size = *self.size.read();
        let end = offset.saturating_add(len as u64);

        if offset > size || end > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        if len == 0 {
            return Ok(Vec::new());
        }

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;

        let mut buffer = vec![0u8; len];
        file.read_exact(&mut buffer)?;

        Ok(buffer)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        if !self.writable {
            return Err(StorageError::ReadOnly);
        }

        let mut size = self.size.write();
        if data.is_empty() {
            return Ok(*size);
        }

        let mut file = self.file.lock();
        let offset = *size;
        file.seek(SeekFrom::End(0))?;
        file.write_all(data)?;
        *size += data.len() as u64;

        Ok(offset)
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(*self.size.read())
    }

    fn sync(&mut self) -> StorageResult<()> {
        if !self.writable {
            return Ok(());
        }
        let file = self.file.lock();
        file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_creates_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seg-000000000.dat");

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.size().unwrap(), 0);
        assert!(backend.is_writable());
        assert!(path.exists());
    }

    #[test]
    fn append_then_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seg.dat");

        let mut backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.append(b"block").unwrap(), 0);
        assert_eq!(backend.append(b"-two").unwrap(), 5);
        assert_eq!(backend.size().unwrap(), 9);
        assert_eq!(backend.read_at(0, 9).unwrap(), b"block-two");
        assert_eq!(backend.read_at(6, 3).unwrap(), b"two");
    }

    #[test]
    fn read_past_end_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seg.dat");

        let mut backend = FileBackend::open(&path).unwrap();
        backend.append(b"short").unwrap();

        assert!(matches!(
            backend.read_at(3, 10),
            Err(StorageError::ReadPastEnd { size: 5, .. })
        ));
        assert!(matches!(
            backend.read_at(10, 1),
            Err(StorageError::ReadPastEnd { .. })
        ));
    }

    #[test]
    fn read_only_sees_existing_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seg.dat");

        {
            let mut backend = FileBackend::open(&path).unwrap();
            backend.append(b"persisted").unwrap();
            backend.sync().unwrap();
        }

        let mut backend = FileBackend::open_read_only(&path).unwrap();
        assert!(!backend.is_writable());
        assert_eq!(backend.size().unwrap(), 9);
        assert_eq!(backend.read_at(0, 9).unwrap(), b"persisted");
        assert!(matches!(backend.append(b"x"), Err(StorageError::ReadOnly)));
        assert!(backend.sync().is_ok());
    }

    #[test]
    fn read_only_requires_existing_file() {
        let dir = tempdir().unwrap();
        let result = FileBackend::open_read_only(&dir.path().join("missing.dat"));
        assert!(matches!(result, Err(StorageError::Io(_))));
    }

    #[test]
    fn empty_append_and_read() {
        let dir = tempdir().unwrap();
        let mut backend = FileBackend::open(&dir.path().join("seg.dat")).unwrap();
        backend.append(b"x").unwrap();

        assert_eq!(backend.append(b"").unwrap(), 1);
        assert!(backend.read_at(1, 0).unwrap().is_empty());
    }
}
