//! blockdex CLI
//!
//! Command-line tools for blockdex block stores.
//!
//! # Commands
//!
//! - `recover` - Rebuild the block index by scanning every segment
//! - `inspect` - Display a recovered block index
//!
//! Both commands take the node data directory and an optional network
//! (`mainnet` or `testnet`); the block directory is `<path>/<network>/blocks`.

mod commands;

use blockdex_core::Network;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// blockdex command-line block store tools.
#[derive(Parser)]
#[command(name = "blockdex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the block index from the segment files
    Recover {
        /// Node data directory
        path: PathBuf,

        /// Network whose block store to recover (mainnet, testnet)
        #[arg(default_value = "mainnet")]
        network: Network,

        /// Largest block payload accepted, in bytes
        #[arg(long)]
        max_block_payload: Option<u32>,

        /// Log progress every N blocks (0 disables)
        #[arg(long, default_value = "10000")]
        progress_interval: u64,
    },

    /// Display a recovered block index
    Inspect {
        /// Node data directory
        path: PathBuf,

        /// Network whose block store to inspect (mainnet, testnet)
        #[arg(default_value = "mainnet")]
        network: Network,

        /// List every indexed block
        #[arg(short, long)]
        blocks: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Recover {
            path,
            network,
            max_block_payload,
            progress_interval,
        } => commands::recover::run(&path, network, max_block_payload, progress_interval),
        Commands::Inspect {
            path,
            network,
            blocks,
            format,
        } => commands::inspect::run(&path, network, blocks, &format),
        Commands::Version => {
            println!("blockdex CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("blockdex core v{}", blockdex_core::VERSION);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
