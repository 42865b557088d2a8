//! # blockdex storage
//!
//! Byte-store backends underneath blockdex segment files.
//!
//! A backend is an **opaque** sequence of bytes: it can be read at an
//! offset, appended to and synced. It knows nothing about record framing,
//! block payloads or segment numbering; `blockdex_core` owns all of that.
//!
//! ## Available Backends
//!
//! - [`FileBackend`] - one segment file on disk
//! - [`InMemoryBackend`] - a segment held in memory, for tests
//!
//! ## Example
//!
//! ```rust
//! use blockdex_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::with_data(Vec::new());
//! let offset = backend.append(b"block bytes").unwrap();
//! assert_eq!(backend.read_at(offset, 5).unwrap(), b"block");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
