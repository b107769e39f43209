//! Segment writer configuration.

use std::path::{Path, PathBuf};

/// Default rotation threshold: 100 MiB of uncompressed frames.
pub const DEFAULT_MAX_FILE_SIZE: usize = 100 * 1024 * 1024;

/// Default gzip compression level.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Configuration for a [`crate::SegmentWriter`].
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Directory segment files are written into.
    pub out_dir: PathBuf,

    /// Uncompressed bytes buffered before a segment is flushed.
    ///
    /// A flush happens once the buffered frame bytes exceed this value, so
    /// a segment holds at least one record even if that record alone is
    /// larger than the threshold.
    pub max_file_size: usize,

    /// Whether input arrives in non-decreasing block order.
    ///
    /// Ordered writers name segments by block range; unordered writers
    /// name them by worker id and sequence.
    pub ordered: bool,

    /// Worker identifier used in unordered file names.
    pub worker_id: u32,

    /// Sequence number of the next segment file.
    pub file_seq: u64,

    /// gzip compression level (0-9).
    pub compression_level: u32,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            ordered: true,
            worker_id: 0,
            file_seq: 0,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl WriterConfig {
    /// Creates an ordered configuration writing into `out_dir`.
    #[must_use]
    pub fn new(out_dir: impl AsRef<Path>) -> Self {
        Self {
            out_dir: out_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Sets the rotation threshold in uncompressed bytes.
    #[must_use]
    pub fn max_file_size(mut self, bytes: usize) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Sets whether input is ordered by block height.
    #[must_use]
    pub fn ordered(mut self, value: bool) -> Self {
        self.ordered = value;
        self
    }

    /// Switches to unordered mode under the given worker id.
    #[must_use]
    pub fn unordered(mut self, worker_id: u32) -> Self {
        self.ordered = false;
        self.worker_id = worker_id;
        self
    }

    /// Sets the sequence number of the first segment file.
    #[must_use]
    pub fn file_seq(mut self, seq: u64) -> Self {
        self.file_seq = seq;
        self
    }

    /// Sets the gzip compression level, clamped to 0-9.
    #[must_use]
    pub fn compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.min(9);
        self
    }
}
