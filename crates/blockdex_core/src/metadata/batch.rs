//! Write batches for the metadata store.

/// An ordered set of puts applied all-or-nothing by
/// [`MetadataStore::commit`](super::MetadataStore::commit).
///
/// Nothing in a batch is visible until it commits. A later put to the same
/// key wins.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    puts: Vec<(Vec<u8>, Vec<u8>)>,
}

impl WriteBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a put.
    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.puts.push((key.into(), value.into()));
    }

    /// Number of recorded puts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.puts.len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.puts.is_empty()
    }

    pub(crate) fn into_puts(self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.puts
    }
}
