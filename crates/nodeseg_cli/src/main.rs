//! nodeseg CLI
//!
//! Command-line tools for nodeseg segment directories.
//!
//! # Commands
//!
//! - `generate` - Write random nodes into a segment directory
//! - `dump` - Print the records of a segment directory
//! - `changesets` - Print merged per-height changesets of a multi-store root
//! - `inspect` - Per-file record counts, block ranges and sizes

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// nodeseg segment store tools.
#[derive(Parser)]
#[command(name = "nodeseg")]
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
    /// Write random nodes with block = 0..count
    Generate {
        /// Output directory
        #[arg(short, long)]
        out: PathBuf,

        /// Number of nodes to write
        #[arg(short, long, default_value = "1000")]
        count: usize,

        /// Store key stamped on every node
        #[arg(short, long, default_value = "test")]
        store_key: String,

        /// Uncompressed bytes per segment before rotating
        #[arg(long, default_value_t = nodeseg_core::DEFAULT_MAX_FILE_SIZE)]
        max_file_size: usize,

        /// Name files by worker and sequence instead of block range
        #[arg(long)]
        unordered: bool,

        /// Worker id for unordered file names
        #[arg(long, default_value = "0")]
        worker_id: u32,

        /// Size of each random value in bytes
        #[arg(long, default_value = "1000")]
        value_size: usize,
    },

    /// Print the records of a segment directory
    Dump {
        /// Segment directory
        path: PathBuf,

        /// Read decode-error records instead of nodes
        #[arg(short, long)]
        errors: bool,

        /// Maximum number of records to print
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print merged changesets of a multi-store root
    Changesets {
        /// Directory holding one segment directory per store
        path: PathBuf,

        /// Maximum number of changesets to print
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show per-file statistics of a segment directory
    Inspect {
        /// Segment directory
        path: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
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

    match cli.command {
        Commands::Generate {
            out,
            count,
            store_key,
            max_file_size,
            unordered,
            worker_id,
            value_size,
        } => {
            let mut config = nodeseg_core::WriterConfig::new(&out).max_file_size(max_file_size);
            if unordered {
                config = config.unordered(worker_id);
            }
            commands::generate::run(config, count, &store_key, value_size)?;
        }
        Commands::Dump {
            path,
            errors,
            limit,
            format,
        } => {
            commands::dump::run(&path, errors, limit, &format)?;
        }
        Commands::Changesets {
            path,
            limit,
            format,
        } => {
            commands::changesets::run(&path, limit, &format)?;
        }
        Commands::Inspect { path, format } => {
            commands::inspect::run(&path, &format)?;
        }
        Commands::Version => {
            println!("nodeseg CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("nodeseg core v{}", nodeseg_core::VERSION);
        }
    }

    Ok(())
}
