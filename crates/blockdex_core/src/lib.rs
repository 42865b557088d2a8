//! # blockdex core
//!
//! Block index recovery for a flat-file block store.
//!
//! Blocks live in numbered, append-only segment files as self-delimiting
//! framed records. This crate rebuilds the index that maps each block's hash
//! to its location, together with the tail cursor where the next block will
//! be appended, by scanning every segment forward from the start.
//!
//! This crate provides:
//! - Segment record framing, the segment locator and the record reader
//! - The immutable scan position and its single-record step
//! - Replay of the whole segment sequence into an index
//! - A small key-value metadata store with atomic batch commits
//! - The recovery transaction and driver
//!
//! ## Example
//!
//! ```rust,no_run
//! use blockdex_core::{BlockDir, Network, RecoveryConfig, RecoveryDriver};
//! use std::path::Path;
//!
//! let dir = BlockDir::for_network(Path::new("/var/lib/node"), Network::Mainnet);
//! let driver = RecoveryDriver::new(RecoveryConfig::default());
//! let count = driver.recover(dir.path())?;
//! println!("There were {count} blocks read.");
//! # Ok::<(), blockdex_core::CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod dir;
mod error;
pub mod metadata;
mod recovery;
pub mod scan;
pub mod segment;
mod types;

pub use config::{MetadataConfig, RecoveryConfig};
pub use dir::{segment_file_path, BlockDir};
pub use error::{CoreError, CoreResult};
pub use metadata::{MetadataStore, WriteBatch};
pub use recovery::{RecoveryDriver, RecoveryTransaction};
pub use scan::{IndexEntry, Replay, Replayer, ScanPosition, Step};
pub use segment::{DecodedRecord, FileSegmentStore, MemorySegmentStore, RecordReader, SegmentStore};
pub use types::{Location, Network, TailCursor};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
