//! Recover command implementation.

use blockdex_core::{BlockDir, CoreError, Network, RecoveryConfig, RecoveryDriver};
use std::path::Path;
use tracing::warn;

/// Runs the recover command.
pub fn run(
    data_dir: &Path,
    network: Network,
    max_block_payload: Option<u32>,
    progress_interval: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let count = recover(data_dir, network, max_block_payload, progress_interval)?;
    println!("There were {count} blocks read.");
    Ok(())
}

/// Recovers the block index for `network` under `data_dir`.
///
/// A metadata store left behind by a failed run is removed so the next
/// attempt starts clean. An existing store is never touched.
pub fn recover(
    data_dir: &Path,
    network: Network,
    max_block_payload: Option<u32>,
    progress_interval: u64,
) -> Result<u64, CoreError> {
    let dir = BlockDir::for_network(data_dir, network);

    let mut config = RecoveryConfig::default()
        .network(network)
        .progress_interval(progress_interval);
    if let Some(max) = max_block_payload {
        config = config.max_block_payload(max);
    }

    match RecoveryDriver::new(config).recover(dir.path()) {
        Ok(count) => Ok(count),
        Err(e @ CoreError::AlreadyExists { .. }) => Err(e),
        Err(e) => {
            if let Err(cleanup) = dir.remove_metadata() {
                warn!(
                    path = %dir.metadata_path().display(),
                    error = %cleanup,
                    "failed to remove partial metadata store"
                );
            }
            Err(e)
        }
    }
}
