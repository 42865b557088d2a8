//! Metadata store holding the rebuilt block index.
//!
//! A single-writer key-value map with all-or-nothing batch commits. The
//! [`schema`] module defines which keys the block index uses.

mod batch;
pub mod schema;
mod snapshot;
mod store;

pub use batch::WriteBatch;
pub use snapshot::{SNAPSHOT_MAGIC, SNAPSHOT_VERSION};
pub use store::MetadataStore;
