//! # blockdex Testkit
//!
//! Test utilities for blockdex.
//!
//! This crate provides:
//! - [`SegmentWriter`], an incremental segment writer that records the index
//!   and tail cursor recovery is expected to rebuild
//! - Test fixtures for block directories and sample blocks
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use blockdex_testkit::prelude::*;
//!
//! #[test]
//! fn recovers_what_was_written() {
//!     let store = TestBlockStore::new(Network::Mainnet, 4096);
//!     // ... append blocks, then recover and compare with store.writer
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod writer;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::writer::*;
}

pub use fixtures::*;
pub use generators::*;
pub use writer::*;
