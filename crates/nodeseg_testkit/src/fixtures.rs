//! Test fixtures for segment directories.
//!
//! Provides temporary directories laid out the way the readers expect:
//! one segment directory per store under a common root.

use nodeseg_codec::Node;
use nodeseg_core::{SegmentWriter, Stats, WriterConfig};
use rand::{Rng, RngCore};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary multi-store segment root with automatic cleanup.
pub struct SegmentDir {
    temp_dir: TempDir,
}

impl SegmentDir {
    /// Creates an empty root.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Returns the root path.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Returns the segment directory of `store`.
    pub fn store_dir(&self, store: &str) -> PathBuf {
        self.path().join(store)
    }

    /// Writes `nodes` into the directory of `store` with default settings.
    pub fn write_store<I>(&self, store: &str, nodes: I) -> Stats
    where
        I: IntoIterator<Item = Node>,
    {
        self.write_store_with(store, nodes, |config| config)
    }

    /// Writes `nodes` into the directory of `store`, adjusting the
    /// configuration first.
    pub fn write_store_with<I, F>(&self, store: &str, nodes: I, configure: F) -> Stats
    where
        I: IntoIterator<Item = Node>,
        F: FnOnce(WriterConfig) -> WriterConfig,
    {
        let config = configure(WriterConfig::new(self.store_dir(store)));
        let mut writer = SegmentWriter::new(config);
        writer.compact(nodes).expect("Failed to write segments")
    }

    /// Writes one store per `(name, blocks)` pair, one node per block.
    pub fn write_stores(&self, stores: &[(&str, &[i64])]) {
        for (store, blocks) in stores {
            self.write_store(store, blocks_to_nodes(store, blocks));
        }
    }
}

impl Default for SegmentDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a node with a random `key_len`-byte key and `value_len`-byte value.
pub fn random_node<R: Rng + ?Sized>(
    rng: &mut R,
    store: &str,
    block: i64,
    key_len: usize,
    value_len: usize,
) -> Node {
    let mut key = vec![0u8; key_len];
    let mut value = vec![0u8; value_len];
    rng.fill_bytes(&mut key);
    rng.fill_bytes(&mut value);
    Node::set(store, key, value, block)
}

/// Random nodes with `block = i` for `i` in `0..count`.
///
/// Keys are 20 bytes and values `value_len` bytes.
pub fn random_nodes(store: &str, count: usize, value_len: usize) -> Vec<Node> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| random_node(&mut rng, store, i as i64, 20, value_len))
        .collect()
}

/// Small deterministic nodes, one per block in `blocks`.
pub fn sequential_nodes(store: &str, blocks: impl IntoIterator<Item = i64>) -> Vec<Node> {
    blocks
        .into_iter()
        .enumerate()
        .map(|(i, block)| {
            let key = format!("{store}/{i:04}").into_bytes();
            Node::set(store, key, vec![0xAB; 32], block)
        })
        .collect()
}

/// Like [`sequential_nodes`], for a slice of blocks.
pub fn blocks_to_nodes(store: &str, blocks: &[i64]) -> Vec<Node> {
    sequential_nodes(store, blocks.iter().copied())
}

/// Overwrites the second half of a file with zeros.
pub fn corrupt_tail(path: &Path) {
    let mut bytes = std::fs::read(path).expect("Failed to read file");
    let half = bytes.len() / 2;
    bytes[half..].iter_mut().for_each(|b| *b = 0);
    std::fs::write(path, bytes).expect("Failed to write file");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_nodes() {
        let nodes = random_nodes("test", 10, 100);
        assert_eq!(nodes.len(), 10);
        for (i, node) in nodes.iter().enumerate() {
            assert_eq!(node.block, i as i64);
            assert_eq!(node.key.len(), 20);
            assert_eq!(node.value.len(), 100);
            assert_eq!(node.store_key, "test");
        }
    }

    #[test]
    fn test_write_stores() {
        let segments = SegmentDir::new();
        segments.write_stores(&[("a", &[1, 2]), ("b", &[1])]);
        assert!(segments.store_dir("a").join("00000001-00000002.pb.gz").exists());
        assert!(segments.store_dir("b").join("00000001.pb.gz").exists());
    }

    #[test]
    fn test_write_store_with_config() {
        let segments = SegmentDir::new();
        let nodes = sequential_nodes("a", 0..4);
        let stats = segments.write_store_with("a", nodes, |c| c.max_file_size(1));
        assert_eq!(stats.files_written.len(), 4);
    }
}
