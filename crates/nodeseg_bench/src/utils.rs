//! Benchmark utilities.

use nodeseg_codec::Node;
use nodeseg_core::{SegmentWriter, Stats, WriterConfig};
use rand::Rng;
use std::path::Path;

/// Generate random bytes of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate nodes with `block = i`, 20-byte keys and values of `value_size`.
pub fn generate_nodes(store: &str, count: usize, value_size: usize) -> Vec<Node> {
    (0..count)
        .map(|i| Node::set(store, random_data(20), random_data(value_size), i as i64))
        .collect()
}

/// Generate nodes with `per_block` nodes at each of `blocks` heights.
pub fn generate_changesets(store: &str, blocks: i64, per_block: usize) -> Vec<Node> {
    (0..blocks)
        .flat_map(|block| {
            (0..per_block).map(move |_| Node::set(store, random_data(20), random_data(64), block))
        })
        .collect()
}

/// Write `nodes` into `dir` with default settings.
pub fn write_nodes(dir: &Path, nodes: Vec<Node>) -> Stats {
    SegmentWriter::new(WriterConfig::new(dir))
        .compact(nodes)
        .expect("Failed to write segments")
}
