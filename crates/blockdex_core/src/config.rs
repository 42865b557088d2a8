//! Recovery and metadata store configuration.

use crate::types::Network;

/// Configuration for opening a [`crate::MetadataStore`].
#[derive(Debug, Clone)]
pub struct MetadataConfig {
    /// Whether to create the store if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to error if the store already exists.
    pub error_if_exists: bool,

    /// Whether to fsync the snapshot and its directory on every commit.
    pub sync_on_commit: bool,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            error_if_exists: false,
            sync_on_commit: true,
        }
    }
}

impl MetadataConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the store if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to error if the store exists.
    #[must_use]
    pub const fn error_if_exists(mut self, value: bool) -> Self {
        self.error_if_exists = value;
        self
    }

    /// Sets whether to sync on every commit.
    #[must_use]
    pub const fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }
}

/// Configuration for a recovery run.
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Network whose magic every record frame must carry.
    pub network: Network,

    /// Largest payload a record may declare, in bytes.
    pub max_block_payload: u32,

    /// Log progress every this many records (0 = never).
    pub progress_interval: u64,

    /// Settings for the metadata store that recovery creates.
    ///
    /// `create_if_missing` and `error_if_exists` are forced on by the driver.
    pub metadata: MetadataConfig,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            max_block_payload: 32 * 1024 * 1024, // 32 MB
            progress_interval: 10_000,
            metadata: MetadataConfig::default(),
        }
    }
}

impl RecoveryConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the network.
    #[must_use]
    pub const fn network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    /// Sets the maximum record payload size.
    #[must_use]
    pub const fn max_block_payload(mut self, size: u32) -> Self {
        self.max_block_payload = size;
        self
    }

    /// Sets the progress logging interval.
    #[must_use]
    pub const fn progress_interval(mut self, records: u64) -> Self {
        self.progress_interval = records;
        self
    }

    /// Sets whether the recovered store is synced on commit.
    #[must_use]
    pub const fn sync_on_commit(mut self, value: bool) -> Self {
        self.metadata.sync_on_commit = value;
        self
    }
}
