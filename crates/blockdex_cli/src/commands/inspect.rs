//! Inspect command implementation.

use blockdex_core::metadata::schema;
use blockdex_core::{BlockDir, FileSegmentStore, MetadataStore, Network, SegmentStore};
use serde::Serialize;
use std::path::Path;

/// Block index inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Block directory path.
    pub path: String,
    /// Network name.
    pub network: String,
    /// Metadata format version.
    pub version: Option<u32>,
    /// Number of segment files.
    pub segment_count: u32,
    /// Total segment size in bytes.
    pub segment_bytes: u64,
    /// Number of indexed blocks.
    pub block_count: usize,
    /// Tail cursor as `segment:offset`.
    pub tail: Option<String>,
    /// Indexed blocks (if requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<BlockEntry>>,
}

/// One indexed block.
#[derive(Debug, Serialize)]
pub struct BlockEntry {
    /// Block hash, hex.
    pub hash: String,
    /// Segment index.
    pub segment: u32,
    /// Offset within the segment.
    pub offset: u32,
    /// Record span in bytes.
    pub span: u32,
}

/// Runs the inspect command.
pub fn run(
    data_dir: &Path,
    network: Network,
    show_blocks: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(data_dir, network, show_blocks)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

/// Collects the inspection result for `network` under `data_dir`.
pub fn inspect(
    data_dir: &Path,
    network: Network,
    show_blocks: bool,
) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let dir = BlockDir::for_network(data_dir, network);
    if !dir.has_metadata() {
        return Err(format!("No block index found at {:?}; run `recover` first", dir.path()).into());
    }

    let store = MetadataStore::open_read_only(dir.metadata_path())?;
    let blocks = schema::indexed_blocks(&store)?;

    let segments = FileSegmentStore::new(dir.path());
    let mut segment_count = 0u32;
    let mut segment_bytes = 0u64;
    while let Some(len) = segments.locate(segment_count)? {
        segment_count += 1;
        segment_bytes += len;
    }

    Ok(InspectResult {
        path: dir.path().display().to_string(),
        network: network.to_string(),
        version: schema::version(&store)?,
        segment_count,
        segment_bytes,
        block_count: blocks.len(),
        tail: schema::tail_cursor(&store)?.map(|tail| tail.to_string()),
        blocks: show_blocks.then(|| {
            blocks
                .iter()
                .map(|(hash, location)| BlockEntry {
                    hash: hash.to_string(),
                    segment: location.segment,
                    offset: location.offset,
                    span: location.span,
                })
                .collect()
        }),
    })
}

fn print_text_output(result: &InspectResult) {
    println!("blockdex Index Inspection");
    println!("=========================");
    println!();
    println!("Path:    {}", result.path);
    println!("Network: {}", result.network);
    if let Some(version) = result.version {
        println!("Version: {version}");
    }
    println!();
    println!("Segments:");
    println!("  Files: {}", result.segment_count);
    println!("  Size:  {}", format_size(result.segment_bytes));
    println!();
    println!("Index:");
    println!("  Blocks: {}", result.block_count);
    println!("  Tail:   {}", result.tail.as_deref().unwrap_or("(none)"));

    if let Some(blocks) = &result.blocks {
        println!();
        println!("Blocks:");
        for block in blocks {
            println!(
                "  {} ({}, {}, {})",
                block.hash, block.segment, block.offset, block.span
            );
        }
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
