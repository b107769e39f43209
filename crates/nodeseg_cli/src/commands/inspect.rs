//! Inspect command implementation.

use nodeseg_codec::Node;
use nodeseg_core::{
    pretty_byte_size, with_commas, DirectoryEnumerator, NodeIterator, SequencedIterator,
};
use serde::Serialize;
use std::path::Path;
use tracing::Span;

/// Segment directory inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Directory path.
    pub path: String,
    /// Compressed size of all files in bytes.
    pub total_bytes: u64,
    /// Records across all files.
    pub total_nodes: u64,
    /// Per-file statistics, in read order.
    pub files: Vec<FileStats>,
}

/// Statistics for a single segment file.
#[derive(Debug, Serialize)]
pub struct FileStats {
    /// File name.
    pub name: String,
    /// Compressed size in bytes.
    pub bytes: u64,
    /// Records in the file.
    pub nodes: u64,
    /// Lowest block, if the file holds records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_block: Option<i64>,
    /// Highest block, if the file holds records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_block: Option<i64>,
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !path.is_dir() {
        return Err(format!("No segment directory at {:?}", path).into());
    }
    let result = inspect(path)?;

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

fn inspect(path: &Path) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    let mut enumerator = DirectoryEnumerator::spawn(path, Span::current())?;
    while let Some(file) = enumerator.next_file()? {
        files.push(inspect_file(&file)?);
    }

    Ok(InspectResult {
        path: path.display().to_string(),
        total_bytes: files.iter().map(|f| f.bytes).sum(),
        total_nodes: files.iter().map(|f| f.nodes).sum(),
        files,
    })
}

fn inspect_file(file: &Path) -> Result<FileStats, Box<dyn std::error::Error>> {
    let bytes = std::fs::metadata(file)?.len();
    let mut iter = SequencedIterator::<Node>::from_files(vec![file.to_path_buf()])?;

    let mut min_block: Option<i64> = None;
    let mut max_block: Option<i64> = None;
    while let Some(node) = iter.current() {
        min_block = Some(min_block.map_or(node.block, |b| b.min(node.block)));
        max_block = Some(max_block.map_or(node.block, |b| b.max(node.block)));
        iter.advance()?;
    }

    Ok(FileStats {
        name: file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        bytes,
        nodes: iter.records_read(),
        min_block,
        max_block,
    })
}

fn print_text_output(result: &InspectResult) {
    println!("Segment Directory Inspection");
    println!("============================");
    println!();
    println!("Path:  {}", result.path);
    println!("Files: {}", result.files.len());
    println!("Size:  {}", pretty_byte_size(result.total_bytes));
    println!("Nodes: {}", with_commas(result.total_nodes));
    println!();

    for file in &result.files {
        print!(
            "  {:32} {:>10} {:>10} nodes",
            file.name,
            pretty_byte_size(file.bytes),
            with_commas(file.nodes)
        );
        if let (Some(min), Some(max)) = (file.min_block, file.max_block) {
            print!("  blocks {}..={}", min, max);
        }
        println!();
    }
}
